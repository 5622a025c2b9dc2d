use thiserror::Error;

use super::status::FailureCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub fn category(&self) -> FailureCategory {
        self.kind.category()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("request line exceeds the configured length")]
    RequestLineTooLong,
    #[error("malformed request line")]
    InvalidRequestLine,
    #[error("unrecognized method")]
    UnknownMethod,
    #[error("invalid request target")]
    InvalidTarget,
    #[error("unrecognized HTTP version")]
    UnknownVersion,
    #[error("line terminated by a bare line feed")]
    BareLineFeed,
    #[error("header line exceeds the configured length")]
    HeaderLineTooLong,
    #[error("header block exceeds the configured size")]
    HeaderBlockTooLarge,
    #[error("too many headers")]
    TooManyHeaders,
    #[error("header line has no colon")]
    MissingColon,
    #[error("invalid header name")]
    InvalidHeaderName,
    #[error("header value contains control characters")]
    InvalidHeaderValue,
    #[error("obsolete line folding")]
    ObsoleteLineFolding,
    #[error("missing Host header")]
    MissingHost,
    #[error("more than one Host header")]
    DuplicateHost,
    #[error("empty Host header")]
    EmptyHost,
    #[error("both Content-Length and Transfer-Encoding present")]
    ConflictingFraming,
    #[error("unsupported transfer coding")]
    UnsupportedTransferEncoding,
    #[error("more than one Transfer-Encoding header")]
    DuplicateTransferEncoding,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("Content-Length headers disagree")]
    ConflictingContentLength,
    #[error("body exceeds the configured size")]
    BodyTooLarge,
    #[error("invalid chunk size")]
    InvalidChunkSize,
    #[error("chunk size overflows")]
    ChunkSizeOverflow,
    #[error("invalid chunk extension")]
    InvalidChunkExtension,
    #[error("chunk size line exceeds the configured length")]
    ChunkLineTooLong,
    #[error("missing CRLF after chunk data")]
    InvalidChunkTerminator,
    #[error("unexpected bytes after the end of the request")]
    TrailingData,
    #[error("connection closed before the request was complete")]
    UnexpectedEof,
    #[error("no bytes arrived before the idle timeout")]
    IdleTimeout,
    #[error("internal parser error")]
    Internal,
}

impl ParseErrorKind {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::RequestLineTooLong => FailureCategory::UriTooLong,
            Self::UnsupportedTransferEncoding => FailureCategory::Unsupported,
            Self::IdleTimeout => FailureCategory::Timeout,
            Self::InvalidRequestLine
            | Self::UnknownMethod
            | Self::InvalidTarget
            | Self::UnknownVersion
            | Self::BareLineFeed
            | Self::HeaderLineTooLong
            | Self::HeaderBlockTooLarge
            | Self::TooManyHeaders
            | Self::MissingColon
            | Self::InvalidHeaderName
            | Self::InvalidHeaderValue
            | Self::ObsoleteLineFolding
            | Self::MissingHost
            | Self::DuplicateHost
            | Self::EmptyHost
            | Self::ConflictingFraming
            | Self::DuplicateTransferEncoding
            | Self::InvalidContentLength
            | Self::ConflictingContentLength
            | Self::BodyTooLarge
            | Self::InvalidChunkSize
            | Self::ChunkSizeOverflow
            | Self::InvalidChunkExtension
            | Self::ChunkLineTooLong
            | Self::InvalidChunkTerminator
            | Self::TrailingData
            | Self::UnexpectedEof
            | Self::Internal => FailureCategory::Malformed,
        }
    }
}
