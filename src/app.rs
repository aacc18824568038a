pub mod arg;
pub mod client;
pub mod logging;
pub mod server;

mod io;
