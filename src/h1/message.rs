//! HTTP message types

use std::{
    fmt::{self, Display},
    fs::File,
    io::{Cursor, Read, Seek, SeekFrom},
};

use crate::fields::FieldMap;

/// HTTP request method.
///
/// This is a fixed, closed set. Tokens are matched case-sensitively;
/// anything else is a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    pub const ALL: [Self; 9] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Connect,
        Self::Options,
        Self::Trace,
        Self::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Patch => "PATCH",
        }
    }

    /// Matches a wire token against the method set, case-sensitively.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"GET" => Some(Self::Get),
            b"HEAD" => Some(Self::Head),
            b"POST" => Some(Self::Post),
            b"PUT" => Some(Self::Put),
            b"DELETE" => Some(Self::Delete),
            b"CONNECT" => Some(Self::Connect),
            b"OPTIONS" => Some(Self::Options),
            b"TRACE" => Some(Self::Trace),
            b"PATCH" => Some(Self::Patch),
            _ => None,
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status code paired with its reason phrase.
///
/// Not validated against a fixed table; the caller supplies both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCode {
    pub code: u16,
    pub reason: String,
}

impl StatusCode {
    pub fn new<S: Into<String>>(code: u16, reason: S) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Byte source for a message body.
///
/// The source must be seekable because `Content-Length` is computed up
/// front: the encoder seeks to the end and restores the read position
/// before any bytes are transmitted. There is no streaming
/// length-unknown mode.
pub struct Body {
    inner: Box<dyn ReadSeek>,
}

impl Body {
    pub fn new<T: ReadSeek + 'static>(inner: T) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }

    /// Returns the number of bytes from the current read position to the
    /// end of the source. The read position is left unchanged.
    pub fn remaining_len(&mut self) -> std::io::Result<u64> {
        let position = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(position))?;

        Ok(end.saturating_sub(position))
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl From<File> for Body {
    fn from(value: File) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

/// An HTTP request.
///
/// The path must start with `/` when parsed from the wire; on encode the
/// codec emits exactly one leading slash regardless of the stored form.
/// The body is send-side only: decoding never populates it.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub fields: FieldMap,
    pub body: Option<Body>,
}

impl Request {
    pub fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self {
            method,
            path: path.into(),
            fields: FieldMap::new(),
            body: None,
        }
    }
}

/// An HTTP response.
///
/// The body is send-side only: decoding never populates it.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub fields: FieldMap,
    pub body: Option<Body>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            fields: FieldMap::new(),
            body: None,
        }
    }
}
