mod http1;

pub use http1::{
    Awaiting, BodyFraming, BodyProgress, ByteCursor, ChunkedBodyDecoder, ContentLengthBodyReader,
    FailureCategory, Header, HeaderBlockParser, HttpVersion, IdleReadTimer, Limits, LineScan,
    LineScanner, MAX_BODY_LENGTH, Method, ParseError, ParseErrorKind, ParseStatus, ParsedRequest,
    RequestLine, RequestParser, is_tchar, is_token, parse_content_length, parse_header_line,
    parse_request_line, resolve_framing, validate_host,
};
