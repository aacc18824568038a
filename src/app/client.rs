//! Fetch driver
//!
//! Opens one connection, sends one GET request, and streams the response
//! body to a file, a directory, or standard output.
//!
//! Exit codes: 0 on success, 1 on argument/connection/transport errors,
//! 2 on a protocol-level decode failure, 3 on a non-200 status.

use std::{
    io::{BufReader, BufWriter, Read, Write},
    net::TcpStream,
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;

use crate::{
    error::CodecError,
    h1::{
        codec,
        message::{Method, Request},
    },
};

use super::{arg::ClientArgs, io::ProgramOutput};

const COPY_BUFFER_LENGTH: usize = 4096;

pub fn run() -> ExitCode {
    let args = match ClientArgs::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = super::logging::set_up_logging(args.log_level, args.log_file.as_deref()) {
        eprintln!("failed to set up logging: {error}");
        return ExitCode::FAILURE;
    }

    match fetch(&args) {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            tracing::error!(?error);
            eprintln!("{:#}", error);
            ExitCode::FAILURE
        }
    }
}

/// Performs the whole exchange. Returns the process exit code for
/// conditions that are reported on stderr rather than as errors.
pub fn fetch(args: &ClientArgs) -> anyhow::Result<u8> {
    let url = parse_url(&args.url).context("invalid URL")?;

    let mut output = open_output(args, &url).context("failed to open file")?;

    let connection = TcpStream::connect((url.host.as_str(), args.port))
        .context("failed to initiate connection")?;

    tracing::info!(host = %url.host, port = args.port, path = %url.path, "connected");

    let mut writer = BufWriter::new(connection.try_clone().context("failed to clone connection")?);
    let mut request = Request::new(Method::Get, url.path.clone());
    request.fields.append("Host", url.host.clone());

    codec::encode_request(&mut writer, &mut request).context("failed to send request")?;

    let mut reader = BufReader::new(connection);

    let response = match codec::decode_response(&mut reader) {
        Ok(response) => response,
        Err(CodecError::Io(error)) => {
            return Err(error).context("error while receiving response");
        }
        Err(error) => {
            tracing::warn!(%error, "protocol error in response");
            eprintln!("Protocol error!");
            return Ok(2);
        }
    };

    if response.status.code != 200 {
        eprintln!("{}", response.status);
        return Ok(3);
    }

    // The body runs to the end of the stream; the server closes the
    // connection after one response.
    let mut buf = [0u8; COPY_BUFFER_LENGTH];
    loop {
        let read_len = reader.read(&mut buf).context("error while reading stream")?;

        if read_len == 0 {
            break;
        }

        output
            .write_all(&buf[..read_len])
            .context("error while writing stream")?;
    }

    output.flush().context("error while writing stream")?;

    Ok(0)
}

struct Url {
    host: String,
    path: String,
}

/// Splits an `http://` URL into host and path.
///
/// The host runs to the first of `; / ? : @ = &`; the path is everything
/// from that point onward, including any query string, and may be empty.
fn parse_url(url: &str) -> Option<Url> {
    let rest = url.strip_prefix("http://")?;
    let host_len = rest
        .find([';', '/', '?', ':', '@', '=', '&'])
        .unwrap_or(rest.len());

    Some(Url {
        host: rest[..host_len].to_owned(),
        path: rest[host_len..].to_owned(),
    })
}

fn open_output(args: &ClientArgs, url: &Url) -> std::io::Result<ProgramOutput> {
    if let Some(path) = &args.output {
        ProgramOutput::create(path)
    } else if let Some(dir) = &args.dir {
        ProgramOutput::create(dir.join(output_file_name(&url.path)))
    } else {
        Ok(ProgramOutput::stdout())
    }
}

/// Derives an output file name from the URL path: the last `/`-separated
/// segment trimmed at any `?`, or `index.html` when nothing usable
/// remains.
fn output_file_name(path: &str) -> &str {
    let segment = match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => return "index.html",
    };

    let segment = &segment[..segment.find('?').unwrap_or(segment.len())];

    if segment.is_empty() {
        "index.html"
    } else {
        segment
    }
}
