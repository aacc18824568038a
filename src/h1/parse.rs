use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::digit1,
    combinator::{eof, map, opt, verify},
    sequence::preceded,
};

pub struct RequestLineRef<'a> {
    pub method: &'a [u8],
    pub target: &'a [u8],
}

pub struct StatusLineRef<'a> {
    pub status_code: &'a [u8],
    pub reason_phrase: &'a [u8],
}

/// Parses one complete request line including its CRLF terminator.
///
/// The terminator must be CRLF exactly and the protocol must be `HTTP/1.1`
/// with nothing following it on the line.
pub fn request_line(input: &[u8]) -> IResult<&[u8], RequestLineRef<'_>> {
    let parts = (
        token,
        tag(" "),
        request_target,
        tag(" "),
        tag("HTTP/1.1"),
        tag("\r\n"),
        eof,
    );

    #[allow(clippy::type_complexity)]
    map(
        parts,
        |output: (&[u8], &[u8], &[u8], &[u8], &[u8], &[u8], &[u8])| RequestLineRef {
            method: output.0,
            target: output.2,
        },
    )
    .parse(input)
}

/// Parses one complete status line.
///
/// The reason phrase may be empty or absent entirely; some servers omit the
/// mandatory space after the status code.
pub fn status_line(input: &[u8]) -> IResult<&[u8], StatusLineRef<'_>> {
    let reason = preceded(tag(" "), take_while(is_reason_char));
    let parts = (
        tag("HTTP/1.1"),
        tag(" "),
        digit1,
        opt(reason),
        alt((tag("\r\n"), eof)),
        eof,
    );

    #[allow(clippy::type_complexity)]
    map(
        parts,
        |output: (&[u8], &[u8], &[u8], Option<&[u8]>, &[u8], &[u8])| StatusLineRef {
            status_code: output.2,
            reason_phrase: output.3.unwrap_or(&[]),
        },
    )
    .parse(input)
}

fn token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_tchar).parse(input)
}

fn request_target(input: &[u8]) -> IResult<&[u8], &[u8]> {
    verify(take_while1(|b: u8| b.is_ascii_graphic()), |t: &[u8]| {
        t.first() == Some(&b'/')
    })
    .parse(input)
}

fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn is_reason_char(b: u8) -> bool {
    b.is_ascii_graphic() || b == b' ' || b == b'\t' || is_obs_text(b)
}

fn is_obs_text(b: u8) -> bool {
    b >= 0x80
}
