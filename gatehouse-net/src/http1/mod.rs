mod body;
mod chunked;
mod cursor;
mod error;
mod framing;
mod headers;
mod host;
mod line;
mod parser;
mod request_line;
mod status;
mod timer;
mod token;
mod types;

pub use body::{BodyProgress, ContentLengthBodyReader};
pub use chunked::ChunkedBodyDecoder;
pub use cursor::ByteCursor;
pub use error::{ParseError, ParseErrorKind};
pub use framing::{parse_content_length, resolve_framing};
pub use headers::{HeaderBlockParser, parse_header_line};
pub use host::validate_host;
pub use line::{LineScan, LineScanner};
pub use parser::{ParseStatus, RequestParser};
pub use request_line::parse_request_line;
pub use status::FailureCategory;
pub use timer::IdleReadTimer;
pub use token::{is_tchar, is_token};
pub use types::{
    Awaiting, BodyFraming, Header, HttpVersion, Limits, MAX_BODY_LENGTH, Method, ParsedRequest,
    RequestLine,
};
