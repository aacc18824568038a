use std::process::ExitCode;

fn main() -> ExitCode {
    httpcat::app::server::run()
}
