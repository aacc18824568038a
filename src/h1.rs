//! Minimal, low-level HTTP 1.1 protocol implementation
//!
//! Each exchange uses exactly one stream: the sender always emits
//! `Connection: close` and the body is delimited by `Content-Length` plus
//! the end of the stream. There is no keep-alive and no chunked transfer
//! encoding.
pub mod codec;
pub mod message;
mod parse;
