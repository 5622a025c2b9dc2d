use std::time::Duration;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

pub const MAX_BODY_LENGTH: u64 = i64::MAX as u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: Vec<u8>,
    pub raw_name: String,
}

impl Header {
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl Method {
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        match raw {
            b"GET" => Some(Self::Get),
            b"HEAD" => Some(Self::Head),
            b"POST" => Some(Self::Post),
            b"PUT" => Some(Self::Put),
            b"DELETE" => Some(Self::Delete),
            b"PATCH" => Some(Self::Patch),
            b"OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: HttpVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    None,
    ContentLength(u64),
    Chunked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    RequestLine,
    HeaderLine,
    Body { remaining: u64 },
    ChunkSize,
    ChunkData { remaining: u64 },
    ChunkTerminator,
    FinalTerminator,
    /// Framing used a bare line feed; only the idle timer or end-of-input
    /// can resolve the request now.
    Stalled,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub line: RequestLine,
    pub headers: Vec<Header>,
    pub framing: BodyFraming,
    pub body: Bytes,
}

impl ParsedRequest {
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|header| header.is(name))
    }

    pub fn host(&self) -> Option<&str> {
        self.header("host").and_then(Header::value_str)
    }

    pub fn path(&self) -> String {
        let target = self.line.target.as_str();
        let without_authority = match target.find("://") {
            Some(scheme_end) => {
                let rest = &target[scheme_end + 3..];
                rest.find('/').map_or("/", |slash| &rest[slash..])
            }
            None => target,
        };
        let raw_path = without_authority
            .split_once('?')
            .map_or(without_authority, |(path, _)| path);
        percent_decode_str(raw_path).decode_utf8_lossy().into_owned()
    }

    pub fn query(&self) -> Option<&str> {
        self.line.target.split_once('?').map(|(_, query)| query)
    }

    pub fn wants_close(&self) -> bool {
        let connection_has = |token: &str| {
            self.headers
                .iter()
                .filter(|header| header.is("connection"))
                .filter_map(Header::value_str)
                .flat_map(|value| value.split(','))
                .any(|value| value.trim().eq_ignore_ascii_case(token))
        };
        match self.line.version {
            HttpVersion::Http10 => !connection_has("keep-alive"),
            HttpVersion::Http11 => connection_has("close"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_request_line_bytes: usize,
    pub max_header_line_bytes: usize,
    pub max_header_count: usize,
    pub max_header_block_bytes: usize,
    pub max_body_bytes: u64,
    #[serde(rename = "idle_read_timeout_ms", with = "duration_millis")]
    pub idle_read_timeout: Duration,
    pub allow_pipelining: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_request_line_bytes: 100,
            max_header_line_bytes: 1024,
            max_header_count: 20,
            max_header_block_bytes: 64 * 1024,
            max_body_bytes: 10 * 1024 * 1024,
            idle_read_timeout: Duration::from_secs(5),
            allow_pipelining: false,
        }
    }
}

impl Limits {
    pub fn first_zero_limit(&self) -> Option<&'static str> {
        if self.max_request_line_bytes == 0 {
            Some("max_request_line_bytes")
        } else if self.max_header_line_bytes == 0 {
            Some("max_header_line_bytes")
        } else if self.max_header_count == 0 {
            Some("max_header_count")
        } else if self.max_header_block_bytes == 0 {
            Some("max_header_block_bytes")
        } else if self.max_body_bytes == 0 {
            Some("max_body_bytes")
        } else if self.idle_read_timeout.is_zero() {
            Some("idle_read_timeout_ms")
        } else {
            None
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::{BodyFraming, Header, HttpVersion, Limits, Method, ParsedRequest, RequestLine};

    fn request(target: &str, version: HttpVersion, headers: &[(&str, &str)]) -> ParsedRequest {
        ParsedRequest {
            line: RequestLine {
                method: Method::Get,
                target: target.to_string(),
                version,
            },
            headers: headers
                .iter()
                .map(|(name, value)| Header {
                    name: name.to_ascii_lowercase(),
                    raw_name: name.to_string(),
                    value: value.as_bytes().to_vec(),
                })
                .collect(),
            framing: BodyFraming::None,
            body: Bytes::new(),
        }
    }

    #[test]
    fn decodes_path_and_splits_query() {
        let request = request("/a%20b/c?x=1&y=2", HttpVersion::Http11, &[]);
        assert_eq!(request.path(), "/a b/c");
        assert_eq!(request.query(), Some("x=1&y=2"));
    }

    #[test]
    fn plus_in_path_stays_literal() {
        let request = request("/a+b?q=c+d", HttpVersion::Http11, &[]);
        assert_eq!(request.path(), "/a+b");
        assert_eq!(request.query(), Some("q=c+d"));
    }

    #[test]
    fn absolute_form_path_skips_authority() {
        let request = request("http://example.com/docs?q", HttpVersion::Http11, &[]);
        assert_eq!(request.path(), "/docs");

        let bare = request_with_target("http://example.com");
        assert_eq!(bare.path(), "/");
    }

    fn request_with_target(target: &str) -> ParsedRequest {
        request(target, HttpVersion::Http11, &[])
    }

    #[test]
    fn connection_close_follows_version_defaults() {
        let http11 = request("/", HttpVersion::Http11, &[("Connection", "keep-alive")]);
        assert!(!http11.wants_close());

        let http11_close = request("/", HttpVersion::Http11, &[("Connection", "Close")]);
        assert!(http11_close.wants_close());

        let http10 = request("/", HttpVersion::Http10, &[]);
        assert!(http10.wants_close());

        let http10_keep = request("/", HttpVersion::Http10, &[("Connection", "keep-alive")]);
        assert!(!http10_keep.wants_close());
    }

    #[test]
    fn default_limits_are_positive() {
        assert_eq!(Limits::default().first_zero_limit(), None);

        let limits = Limits {
            max_header_count: 0,
            ..Limits::default()
        };
        assert_eq!(limits.first_zero_limit(), Some("max_header_count"));
    }
}
