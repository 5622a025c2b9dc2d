use super::error::{ParseError, ParseErrorKind};
use super::token::is_token;
use super::types::{HttpVersion, Method, RequestLine};

pub fn parse_request_line(line: &[u8], offset: usize) -> Result<RequestLine, ParseError> {
    let invalid = |kind| ParseError::new(kind, offset);

    let mut parts = line.split(|byte| *byte == b' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid(ParseErrorKind::InvalidRequestLine));
    };

    if !is_token(method) {
        return Err(invalid(ParseErrorKind::InvalidRequestLine));
    }
    let method = Method::from_bytes(method).ok_or(invalid(ParseErrorKind::UnknownMethod))?;

    let version = match version {
        b"HTTP/1.1" => HttpVersion::Http11,
        b"HTTP/1.0" => HttpVersion::Http10,
        _ => return Err(invalid(ParseErrorKind::UnknownVersion)),
    };

    let target = parse_target(method, target).ok_or(invalid(ParseErrorKind::InvalidTarget))?;

    Ok(RequestLine {
        method,
        target,
        version,
    })
}

fn parse_target(method: Method, raw: &[u8]) -> Option<String> {
    if raw.is_empty() || !raw.iter().all(|byte| (0x21..=0x7e).contains(byte)) {
        return None;
    }
    let target = std::str::from_utf8(raw).ok()?;
    let origin_form = target.starts_with('/');
    let absolute_form = target.contains("://");
    let asterisk_form = target == "*" && method == Method::Options;
    (origin_form || absolute_form || asterisk_form).then(|| target.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::parse_request_line;
    use crate::http1::{HttpVersion, Method, ParseError, ParseErrorKind};

    #[test]
    fn parses_origin_form() {
        let line = parse_request_line(b"GET /index.html?x=1 HTTP/1.1", 0).unwrap();
        assert_eq!(line.method, Method::Get);
        assert_eq!(line.target, "/index.html?x=1");
        assert_eq!(line.version, HttpVersion::Http11);
    }

    #[test]
    fn accepts_absolute_and_asterisk_forms() {
        let line = parse_request_line(b"POST http://example.com/a HTTP/1.0", 0).unwrap();
        assert_eq!(line.version, HttpVersion::Http10);
        assert!(parse_request_line(b"OPTIONS * HTTP/1.1", 0).is_ok());
        assert_matches!(
            parse_request_line(b"GET * HTTP/1.1", 0),
            Err(ParseError {
                kind: ParseErrorKind::InvalidTarget,
                ..
            })
        );
    }

    #[test]
    fn rejects_wrong_field_count() {
        for line in [
            &b"GET /"[..],
            b"GET / HTTP/1.1 extra",
            b"GET  / HTTP/1.1",
            b" GET / HTTP/1.1",
            b"",
        ] {
            assert_matches!(
                parse_request_line(line, 7),
                Err(ParseError {
                    kind: ParseErrorKind::InvalidRequestLine,
                    offset: 7
                })
            );
        }
    }

    #[test]
    fn rejects_unknown_method_and_version() {
        assert_matches!(
            parse_request_line(b"BREW / HTTP/1.1", 0),
            Err(ParseError {
                kind: ParseErrorKind::UnknownMethod,
                ..
            })
        );
        assert_matches!(
            parse_request_line(b"G(T / HTTP/1.1", 0),
            Err(ParseError {
                kind: ParseErrorKind::InvalidRequestLine,
                ..
            })
        );
        assert_matches!(
            parse_request_line(b"GET / HTTP/2.0", 0),
            Err(ParseError {
                kind: ParseErrorKind::UnknownVersion,
                ..
            })
        );
    }

    #[test]
    fn rejects_control_bytes_in_target() {
        assert_matches!(
            parse_request_line(b"GET /a\rb HTTP/1.1", 0),
            Err(ParseError {
                kind: ParseErrorKind::InvalidTarget,
                ..
            })
        );
        assert_matches!(
            parse_request_line(b"GET relative HTTP/1.1", 0),
            Err(ParseError {
                kind: ParseErrorKind::InvalidTarget,
                ..
            })
        );
    }
}
