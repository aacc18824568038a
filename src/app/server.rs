//! File server driver
//!
//! One connection is fully processed before the next is accepted; there is
//! no keep-alive, no concurrency, and no timeout on any blocking call, so
//! a slow peer stalls the single thread.

use std::{
    fs::File,
    io::{BufReader, BufWriter, ErrorKind, Write},
    net::{TcpListener, TcpStream},
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use anyhow::Context;
use clap::Parser;

use crate::{
    error::CodecError,
    h1::{
        codec,
        message::{Method, Response, StatusCode},
    },
};

use super::arg::ServerArgs;

pub fn run() -> ExitCode {
    let args = match ServerArgs::try_parse() {
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

    match run_impl(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(?error);
            eprintln!("{:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run_impl(args: &ServerArgs) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .with_context(|| format!("failed to open socket on port {}", args.port))?;

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_signal_watcher(Arc::clone(&shutdown), args.port)
        .context("failed to install signal handlers")?;

    let doc_root = args
        .doc_root
        .to_str()
        .context("document root is not valid UTF-8")?;

    tracing::info!(port = args.port, doc_root, "listening");

    serve(&listener, &shutdown, doc_root, &args.index);

    tracing::info!("shutting down");

    Ok(())
}

/// Installs handlers for SIGINT and SIGTERM that shut down the accept loop.
///
/// The handler alone cannot stop an idle server: it runs with `SA_RESTART`,
/// so a blocked accept call resumes as if nothing happened. The watcher
/// thread therefore sets the flag and then opens a throwaway loopback
/// connection to the listener port, forcing the accept call to return so
/// the loop observes the flag.
pub fn spawn_signal_watcher(shutdown: Arc<AtomicBool>, port: u16) -> std::io::Result<()> {
    let mut signals = signal_hook::iterator::Signals::new([
        signal_hook::consts::SIGINT,
        signal_hook::consts::SIGTERM,
    ])?;

    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            tracing::info!(signal, "received shutdown signal");
            shutdown.store(true, Ordering::Relaxed);
            let _ = TcpStream::connect(("127.0.0.1", port));
        }
    });

    Ok(())
}

/// Accept loop. Runs until the shutdown flag is observed, which happens
/// only between connections: an in-flight exchange always completes or
/// fails naturally.
pub fn serve(listener: &TcpListener, shutdown: &AtomicBool, doc_root: &str, index: &str) {
    while !shutdown.load(Ordering::Relaxed) {
        let connection = match listener.accept() {
            Ok((connection, _addr)) => connection,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => {
                tracing::error!(?error, "failed to accept client connection");
                continue;
            }
        };

        if let Err(error) = serve_connection(connection, doc_root, index) {
            tracing::error!(?error, "error while serving connection");
        }
    }
}

/// Handles exactly one exchange, then lets the connection drop.
fn serve_connection(connection: TcpStream, doc_root: &str, index: &str) -> anyhow::Result<()> {
    let mut reader = BufReader::new(connection.try_clone()?);
    let mut writer = BufWriter::new(connection);

    let request = match codec::decode_request(&mut reader) {
        Ok(request) => request,
        Err(error) if error.is_malformed() => {
            tracing::warn!(%error, "received malformed request");

            if let Err(error) = codec::drain_head(&mut reader) {
                tracing::debug!(?error, "failed to drain request head");
            }

            return send_status(&mut writer, StatusCode::new(400, "Bad Request"));
        }
        Err(CodecError::CleanClose) => {
            tracing::debug!("connection closed before request");
            return Ok(());
        }
        Err(error) => return Err(error).context("error while reading request"),
    };

    tracing::info!(method = %request.method, path = %request.path, "received request");

    if request.method != Method::Get {
        // One response per connection: unlike some servers, no attempt is
        // made to resolve a file after rejecting the method.
        return send_status(&mut writer, StatusCode::new(501, "Not implemented"));
    }

    let path = match resolve_path(doc_root, &request.path, index) {
        Some(path) => path,
        None => {
            tracing::warn!(path = %request.path, "rejected traversal path");
            return send_status(&mut writer, StatusCode::new(403, "Forbidden"));
        }
    };

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return send_status(&mut writer, StatusCode::new(404, "Not Found"));
        }
        Err(error) if error.kind() == ErrorKind::PermissionDenied => {
            return send_status(&mut writer, StatusCode::new(403, "Forbidden"));
        }
        Err(error) => {
            tracing::error!(?error, %path, "failed to access file");
            return send_status(&mut writer, StatusCode::new(500, "Internal Server Error"));
        }
    };

    let mut response = Response::new(StatusCode::new(200, "OK"));
    if let Some(media_type) = media_type_for_path(&path) {
        response.fields.append("Content-Type", media_type);
    }
    response.body = Some(file.into());

    codec::encode_response(&mut writer, &mut response).context("failed to send response")?;

    Ok(())
}

fn send_status<W: Write>(writer: &mut W, status: StatusCode) -> anyhow::Result<()> {
    let mut response = Response::new(status);

    codec::encode_response(writer, &mut response).context("failed to send response")?;

    Ok(())
}

/// Maps a request path to a filesystem path beneath the document root.
///
/// The concatenation is textual: the request path keeps its leading slash,
/// so `Path::join` would discard the root. Paths with a `..` segment would
/// escape the root and are rejected.
fn resolve_path(doc_root: &str, request_path: &str, index: &str) -> Option<String> {
    if request_path.split('/').any(|segment| segment == "..") {
        return None;
    }

    if request_path.is_empty() {
        Some(format!("{doc_root}/{index}"))
    } else if request_path.ends_with('/') {
        Some(format!("{doc_root}{request_path}{index}"))
    } else {
        Some(format!("{doc_root}{request_path}"))
    }
}

/// Content type by file extension only. Unknown extensions get no
/// `Content-Type` header at all.
fn media_type_for_path(path: &str) -> Option<&'static str> {
    let extension = &path[path.rfind('.')?..];

    match extension {
        ".html" | ".htm" => Some("text/html"),
        ".css" => Some("text/css"),
        ".js" => Some("application/javascript"),
        _ => None,
    }
}
