//! HTTP/1.1 message codec
//!
//! Encoding writes one complete message (start line, headers, blank line,
//! body) to a stream and flushes it. Decoding reads the start line and the
//! header block only; body bytes, if any, stay on the stream for the caller
//! to consume using `Content-Length` or the end of the stream.

use core::str;
use std::io::{BufRead, Read, Write};

use chrono::Utc;

use crate::{error::CodecError, fields::FieldMap};

use super::{
    message::{Body, Method, Request, Response, StatusCode},
    parse,
};

const COPY_BUFFER_LENGTH: usize = 4096;

const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

/// Encodes a request onto a stream.
///
/// Exactly one leading slash is emitted for the path regardless of whether
/// the caller supplied one. `Content-Length` is added when a body is
/// attached, computed from the body's current read position, and
/// `Connection: close` is always added last.
pub fn encode_request<W: Write>(stream: &mut W, request: &mut Request) -> Result<(), CodecError> {
    let path = request.path.strip_prefix('/').unwrap_or(&request.path);
    write!(stream, "{} /{} HTTP/1.1\r\n", request.method, path)?;

    write_fields(stream, &request.fields)?;

    if let Some(body) = &mut request.body {
        write!(stream, "Content-Length: {}\r\n", body.remaining_len()?)?;
    }

    stream.write_all(b"Connection: close\r\n\r\n")?;

    if let Some(body) = &mut request.body {
        copy_body(body, stream)?;
    }

    stream.flush()?;

    Ok(())
}

/// Encodes a response onto a stream.
///
/// `Date`, `Content-Length` (0 when there is no body), and
/// `Connection: close` are always appended after the caller's headers.
pub fn encode_response<W: Write>(stream: &mut W, response: &mut Response) -> Result<(), CodecError> {
    write!(
        stream,
        "HTTP/1.1 {} {}\r\n",
        response.status.code, response.status.reason
    )?;

    write_fields(stream, &response.fields)?;

    let length = match &mut response.body {
        Some(body) => body.remaining_len()?,
        None => 0,
    };
    let date = Utc::now().format(DATE_FORMAT);

    write!(
        stream,
        "Date: {date}\r\nContent-Length: {length}\r\nConnection: close\r\n\r\n"
    )?;

    if let Some(body) = &mut response.body {
        copy_body(body, stream)?;
    }

    stream.flush()?;

    Ok(())
}

/// Decodes a request head from a stream.
///
/// The body is never read or buffered; the returned request carries no body.
pub fn decode_request<R: BufRead>(stream: &mut R) -> Result<Request, CodecError> {
    let line = read_line(stream)?.ok_or(CodecError::CleanClose)?;

    let (_remain, request_line) =
        parse::request_line(&line).map_err(|_| CodecError::MalformedHead)?;

    let method = Method::from_token(request_line.method).ok_or(CodecError::MalformedHead)?;
    let path = str::from_utf8(request_line.target)
        .map_err(|_| CodecError::MalformedHead)?
        .to_owned();

    let fields = decode_fields(stream)?;

    tracing::debug!(%method, %path, field_len = fields.len(), "decoded request head");

    Ok(Request {
        method,
        path,
        fields,
        body: None,
    })
}

/// Decodes a response head from a stream.
///
/// The body is never read or buffered; the returned response carries no
/// body.
pub fn decode_response<R: BufRead>(stream: &mut R) -> Result<Response, CodecError> {
    let line = read_line(stream)?.ok_or(CodecError::CleanClose)?;

    let (_remain, status_line) = parse::status_line(&line).map_err(|_| CodecError::MalformedHead)?;

    let code = str::from_utf8(status_line.status_code)
        .map_err(|_| CodecError::MalformedHead)?
        .parse::<u16>()
        .map_err(|_| CodecError::MalformedHead)?;
    let reason = String::from_utf8_lossy(status_line.reason_phrase).into_owned();

    let fields = decode_fields(stream)?;

    tracing::debug!(code, field_len = fields.len(), "decoded response head");

    Ok(Response {
        status: StatusCode::new(code, reason),
        fields,
        body: None,
    })
}

/// Reads and discards lines until the end of a header block.
///
/// The block ends at a line equal to exactly `\r\n` or at the end of the
/// stream. Used to clear the remainder of a message that failed to decode
/// before answering it.
pub fn drain_head<R: BufRead>(stream: &mut R) -> Result<(), CodecError> {
    loop {
        match read_line(stream)? {
            None => return Ok(()),
            Some(line) if line == b"\r\n" => return Ok(()),
            Some(_line) => {}
        }
    }
}

fn write_fields<W: Write>(stream: &mut W, fields: &FieldMap) -> std::io::Result<()> {
    for (name, value) in fields {
        write!(stream, "{name}: {value}\r\n")?;
    }

    Ok(())
}

/// Reads header lines until the blank line that terminates the block.
///
/// The terminator must be exactly `\r\n`; reaching the end of the stream
/// first is a framing error because a well-formed head always ends with a
/// blank line.
fn decode_fields<R: BufRead>(stream: &mut R) -> Result<FieldMap, CodecError> {
    let mut fields = FieldMap::new();

    loop {
        let line = read_line(stream)?.ok_or(CodecError::MalformedHeaders)?;

        if line == b"\r\n" {
            return Ok(fields);
        }

        let (name, value) = split_field_line(&line).ok_or(CodecError::MalformedHeaders)?;
        fields.append(name, value);
    }
}

/// Splits one header line at the first colon.
///
/// The name is everything before the colon, untrimmed. The value is
/// everything after it with leading spaces skipped and the line terminator
/// excluded.
fn split_field_line(line: &[u8]) -> Option<(String, String)> {
    let colon = line.iter().position(|&b| b == b':')?;

    let name = String::from_utf8(line[..colon].to_vec()).ok()?;

    let rest = &line[colon + 1..];
    let rest = &rest[rest.iter().take_while(|&&b| b == b' ').count()..];
    let end = rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(rest.len());
    let value = String::from_utf8(rest[..end].to_vec()).ok()?;

    Some((name, value))
}

/// Reads one line including its terminator. Returns `None` at end of
/// stream.
fn read_line<R: BufRead>(stream: &mut R) -> Result<Option<Vec<u8>>, CodecError> {
    let mut line = Vec::new();
    let read_len = stream.read_until(b'\n', &mut line)?;

    if read_len == 0 { Ok(None) } else { Ok(Some(line)) }
}

fn copy_body<W: Write>(body: &mut Body, stream: &mut W) -> Result<(), CodecError> {
    let mut buf = [0u8; COPY_BUFFER_LENGTH];

    loop {
        let read_len = body.read(&mut buf)?;

        if read_len == 0 {
            return Ok(());
        }

        stream.write_all(&buf[..read_len])?;
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Seek, SeekFrom};

    use crate::h1::message::{Method, StatusCode};

    use super::*;

    fn decode_request_bytes(data: &str) -> Result<Request, CodecError> {
        decode_request(&mut Cursor::new(data.as_bytes()))
    }

    fn decode_response_bytes(data: &str) -> Result<Response, CodecError> {
        decode_response(&mut Cursor::new(data.as_bytes()))
    }

    #[test]
    fn test_encode_request_basic() {
        let mut request = Request::new(Method::Get, "/a/b");
        request.fields.append("Host", "example.com");

        let mut buf = Vec::new();
        encode_request(&mut buf, &mut request).unwrap();

        assert_eq!(
            buf,
            b"GET /a/b HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_encode_request_forces_one_leading_slash() {
        for path in ["/a/b", "a/b"] {
            let mut request = Request::new(Method::Get, path);

            let mut buf = Vec::new();
            encode_request(&mut buf, &mut request).unwrap();

            assert!(buf.starts_with(b"GET /a/b HTTP/1.1\r\n"));
        }
    }

    #[test]
    fn test_encode_request_empty_path() {
        let mut request = Request::new(Method::Get, "");

        let mut buf = Vec::new();
        encode_request(&mut buf, &mut request).unwrap();

        assert!(buf.starts_with(b"GET / HTTP/1.1\r\n"));
    }

    #[test]
    fn test_encode_request_body_length_from_current_position() {
        let mut cursor = Cursor::new(b"xxxhello".to_vec());
        cursor.seek(SeekFrom::Start(3)).unwrap();

        let mut request = Request::new(Method::Post, "/submit");
        request.body = Some(crate::h1::message::Body::new(cursor));

        let mut buf = Vec::new();
        encode_request(&mut buf, &mut request).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_encode_response_always_has_framing_headers() {
        let mut response = Response::new(StatusCode::new(404, "Not Found"));

        let mut buf = Vec::new();
        encode_response(&mut buf, &mut response).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("\r\nDate: "));
        assert!(text.contains("\r\nContent-Length: 0\r\n"));
        assert!(text.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn test_encode_response_body_bytes_follow_blank_line() {
        let mut response = Response::new(StatusCode::new(200, "OK"));
        response.fields.append("Content-Type", "text/html");
        response.body = Some(crate::h1::message::Body::from_bytes(
            b"<p>hi</p>".to_vec(),
        ));

        let mut buf = Vec::new();
        encode_response(&mut buf, &mut response).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\r\nContent-Type: text/html\r\n"));
        assert!(text.contains("\r\nContent-Length: 9\r\n"));
        assert!(text.ends_with("\r\n\r\n<p>hi</p>"));
    }

    #[test]
    fn test_round_trip_request_head() {
        let mut request = Request::new(Method::Get, "/index.html");
        request.fields.append("Host", "example.com");
        request.fields.append("X-Test", "one");
        request.fields.append("X-Test", "two");

        let mut buf = Vec::new();
        encode_request(&mut buf, &mut request).unwrap();

        let decoded = decode_request(&mut Cursor::new(buf)).unwrap();

        assert_eq!(decoded.method, Method::Get);
        assert_eq!(decoded.path, "/index.html");
        assert!(decoded.body.is_none());

        let entries: Vec<_> = decoded
            .fields
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("Host", "example.com"),
                ("X-Test", "one"),
                ("X-Test", "two"),
                ("Connection", "close"),
            ]
        );
    }

    #[test]
    fn test_decode_request_all_methods() {
        for method in Method::ALL {
            let data = format!("{} /x HTTP/1.1\r\n\r\n", method.as_str());
            let request = decode_request_bytes(&data).unwrap();
            assert_eq!(request.method, method);
        }
    }

    #[test]
    fn test_decode_request_method_is_case_sensitive() {
        let result = decode_request_bytes("get /x HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(CodecError::MalformedHead)));

        let result = decode_request_bytes("FETCH /x HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(CodecError::MalformedHead)));
    }

    #[test]
    fn test_decode_request_malformed_start_lines() {
        for data in [
            "GET x HTTP/1.1\r\n\r\n",
            "GET /x HTTP/1.0\r\n\r\n",
            "GET /x HTTP/1.1 extra\r\n\r\n",
            "GET /x HTTP/1.1\n\r\n",
            "GET /x\r\n\r\n",
            "\r\n\r\n",
        ] {
            let result = decode_request_bytes(data);
            assert!(matches!(result, Err(CodecError::MalformedHead)), "{data:?}");
        }
    }

    #[test]
    fn test_decode_request_clean_close() {
        let result = decode_request_bytes("");
        assert!(matches!(result, Err(CodecError::CleanClose)));
    }

    #[test]
    fn test_decode_request_eof_in_headers() {
        let result = decode_request_bytes("GET /x HTTP/1.1\r\nHost: a\r\n");
        assert!(matches!(result, Err(CodecError::MalformedHeaders)));
    }

    #[test]
    fn test_decode_header_value_space_stripping() {
        for data in [
            "GET /x HTTP/1.1\r\nX-Test: value\r\n\r\n",
            "GET /x HTTP/1.1\r\nX-Test:value\r\n\r\n",
            "GET /x HTTP/1.1\r\nX-Test:   value\r\n\r\n",
        ] {
            let request = decode_request_bytes(data).unwrap();
            assert_eq!(request.fields.get("X-Test"), Some("value"), "{data:?}");
        }
    }

    #[test]
    fn test_decode_header_without_colon() {
        let result = decode_request_bytes("GET /x HTTP/1.1\r\ngarbage\r\n\r\n");
        assert!(matches!(result, Err(CodecError::MalformedHeaders)));
    }

    #[test]
    fn test_decode_immediate_blank_line_yields_zero_headers() {
        let request = decode_request_bytes("GET /x HTTP/1.1\r\n\r\n").unwrap();
        assert!(request.fields.is_empty());
    }

    #[test]
    fn test_decode_response_basic() {
        let response =
            decode_response_bytes("HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabc").unwrap();

        assert_eq!(response.status.code, 200);
        assert_eq!(response.status.reason, "OK");
        assert_eq!(response.fields.get("Content-Length"), Some("3"));
        assert!(response.body.is_none());
    }

    #[test]
    fn test_decode_response_empty_reason_phrase() {
        let response = decode_response_bytes("HTTP/1.1 200 \r\n\r\n").unwrap();
        assert_eq!(response.status.code, 200);
        assert_eq!(response.status.reason, "");
    }

    #[test]
    fn test_decode_response_missing_mandatory_space() {
        let response = decode_response_bytes("HTTP/1.1 200\r\n\r\n").unwrap();
        assert_eq!(response.status.code, 200);
        assert_eq!(response.status.reason, "");
    }

    #[test]
    fn test_decode_response_malformed_start_lines() {
        for data in [
            "HTTP/1.0 200 OK\r\n\r\n",
            "HTTP/1.1 2x0 OK\r\n\r\n",
            "HTTP/1.1 OK 200\r\n\r\n",
            "ICY 200 OK\r\n\r\n",
        ] {
            let result = decode_response_bytes(data);
            assert!(matches!(result, Err(CodecError::MalformedHead)), "{data:?}");
        }
    }

    #[test]
    fn test_decode_response_clean_close() {
        let result = decode_response_bytes("");
        assert!(matches!(result, Err(CodecError::CleanClose)));
    }

    #[test]
    fn test_decode_leaves_body_on_stream() {
        let mut stream = Cursor::new(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello".to_vec());

        decode_response(&mut stream).unwrap();

        let mut body = Vec::new();
        stream.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"hello");
    }

    #[test]
    fn test_drain_head() {
        let mut stream = Cursor::new(b"One: 1\r\nTwo: 2\r\n\r\nleftover".to_vec());

        drain_head(&mut stream).unwrap();

        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"leftover");
    }

    #[test]
    fn test_drain_head_stops_at_end_of_stream() {
        let mut stream = Cursor::new(b"One: 1\r\n".to_vec());
        drain_head(&mut stream).unwrap();
    }
}
