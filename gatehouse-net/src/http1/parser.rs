use std::time::Instant;

use bytes::Bytes;

use super::body::{BodyProgress, ContentLengthBodyReader};
use super::chunked::ChunkedBodyDecoder;
use super::cursor::ByteCursor;
use super::error::{ParseError, ParseErrorKind};
use super::framing::resolve_framing;
use super::headers::HeaderBlockParser;
use super::host::validate_host;
use super::line::{LineScan, LineScanner};
use super::request_line::parse_request_line;
use super::timer::IdleReadTimer;
use super::types::{Awaiting, BodyFraming, Header, Limits, ParsedRequest, RequestLine};

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    NeedMore { awaiting: Awaiting },
    Complete { request: ParsedRequest },
    Error { error: ParseError },
    Closed,
}

#[derive(Debug)]
enum BodyReader {
    Length(ContentLengthBodyReader),
    Chunked(ChunkedBodyDecoder),
}

impl BodyReader {
    fn awaiting(&self) -> Awaiting {
        match self {
            Self::Length(reader) => Awaiting::Body {
                remaining: reader.remaining(),
            },
            Self::Chunked(decoder) => decoder.awaiting(),
        }
    }

    fn read(&mut self, cursor: &mut ByteCursor) -> Result<BodyProgress, ParseError> {
        match self {
            Self::Length(reader) => Ok(reader.read(cursor)),
            Self::Chunked(decoder) => decoder.decode(cursor),
        }
    }

    fn is_stalled(&self) -> bool {
        matches!(self, Self::Chunked(decoder) if decoder.is_stalled())
    }

    fn on_eof(&self, offset: usize) -> Result<(), ParseError> {
        match self {
            Self::Length(reader) => reader.on_eof(offset),
            Self::Chunked(decoder) => decoder.on_eof(offset),
        }
    }

    fn into_body(self) -> Bytes {
        match self {
            Self::Length(reader) => reader.into_body(),
            Self::Chunked(decoder) => decoder.into_body(),
        }
    }
}

#[derive(Debug)]
enum State {
    RequestLine,
    Headers {
        line: RequestLine,
        block: HeaderBlockParser,
    },
    Body {
        line: RequestLine,
        headers: Vec<Header>,
        framing: BodyFraming,
        reader: BodyReader,
    },
    Failed(ParseError),
}

#[derive(Debug)]
pub struct RequestParser {
    cursor: ByteCursor,
    limits: Limits,
    timer: IdleReadTimer,
    state: State,
    progressed: bool,
    partial_line: usize,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            cursor: ByteCursor::new(),
            limits,
            timer: IdleReadTimer::new(limits.idle_read_timeout),
            state: State::RequestLine,
            progressed: false,
            partial_line: 0,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn deadline(&self) -> Instant {
        self.timer.deadline()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::RequestLine) && self.cursor.is_empty()
    }

    pub fn push(&mut self, bytes: &[u8]) -> ParseStatus {
        self.push_at(bytes, Instant::now())
    }

    pub fn push_at(&mut self, bytes: &[u8], now: Instant) -> ParseStatus {
        if let State::Failed(error) = &self.state {
            return ParseStatus::Error {
                error: error.clone(),
            };
        }
        self.cursor.extend(bytes);
        self.progressed = false;
        let status = match self.advance() {
            Ok(status) => status,
            Err(error) => self.fail(error),
        };
        if self.progressed {
            self.timer.reset(now);
        }
        status
    }

    pub fn resume(&mut self) -> ParseStatus {
        self.push(&[])
    }

    pub fn push_eof(&mut self) -> ParseStatus {
        let offset = self.cursor.offset();
        match &self.state {
            State::Failed(error) => ParseStatus::Error {
                error: error.clone(),
            },
            State::RequestLine if self.cursor.is_empty() => ParseStatus::Closed,
            State::RequestLine | State::Headers { .. } => {
                self.fail(ParseError::new(ParseErrorKind::UnexpectedEof, offset))
            }
            State::Body { reader, .. } => {
                let error = reader
                    .on_eof(offset)
                    .err()
                    .unwrap_or(ParseError::new(ParseErrorKind::Internal, offset));
                self.fail(error)
            }
        }
    }

    pub fn poll_idle(&mut self) -> ParseStatus {
        self.poll_idle_at(Instant::now())
    }

    pub fn poll_idle_at(&mut self, now: Instant) -> ParseStatus {
        if let State::Failed(error) = &self.state {
            return ParseStatus::Error {
                error: error.clone(),
            };
        }
        if self.timer.is_expired(now) {
            let offset = self.cursor.offset();
            return self.fail(ParseError::new(ParseErrorKind::IdleTimeout, offset));
        }
        ParseStatus::NeedMore {
            awaiting: self.awaiting(),
        }
    }

    fn awaiting(&self) -> Awaiting {
        match &self.state {
            State::RequestLine => Awaiting::RequestLine,
            State::Headers { .. } => Awaiting::HeaderLine,
            State::Body { reader, .. } => reader.awaiting(),
            State::Failed(_) => Awaiting::Nothing,
        }
    }

    fn fail(&mut self, error: ParseError) -> ParseStatus {
        tracing::debug!(
            kind = ?error.kind,
            category = ?error.category(),
            offset = error.offset,
            "rejecting request: {}",
            error.kind
        );
        self.state = State::Failed(error.clone());
        ParseStatus::Error { error }
    }

    fn advance(&mut self) -> Result<ParseStatus, ParseError> {
        loop {
            let state = std::mem::replace(&mut self.state, State::RequestLine);
            match state {
                State::RequestLine => {
                    // Empty lines ahead of a request line are ignored.
                    while self.cursor.starts_with(CRLF) {
                        self.cursor.advance(CRLF.len());
                    }
                    let scanner = LineScanner::new(self.limits.max_request_line_bytes);
                    let Some((len, consumed)) =
                        self.next_line(scanner, ParseErrorKind::RequestLineTooLong)?
                    else {
                        if self.cursor.peek() != b"\r" {
                            self.note_partial_line();
                        }
                        return Ok(ParseStatus::NeedMore {
                            awaiting: Awaiting::RequestLine,
                        });
                    };
                    let line = parse_request_line(&self.cursor.peek()[..len], self.cursor.offset())?;
                    self.consume_line(consumed);
                    self.state = State::Headers {
                        line,
                        block: HeaderBlockParser::new(&self.limits),
                    };
                }
                State::Headers { line, mut block } => {
                    let Some((len, consumed)) =
                        self.next_line(block.scanner(), ParseErrorKind::HeaderLineTooLong)?
                    else {
                        self.note_partial_line();
                        self.state = State::Headers { line, block };
                        return Ok(ParseStatus::NeedMore {
                            awaiting: Awaiting::HeaderLine,
                        });
                    };
                    let offset = self.cursor.offset();
                    let finished = block.feed_line(&self.cursor.peek()[..len], consumed, offset)?;
                    self.consume_line(consumed);
                    if !finished {
                        self.state = State::Headers { line, block };
                        continue;
                    }

                    let headers = block.into_headers();
                    validate_host(&headers, offset)?;
                    let framing = resolve_framing(&headers, &self.limits, offset)?;
                    let reader = match framing {
                        BodyFraming::None => {
                            return self.complete(line, headers, framing, Bytes::new());
                        }
                        BodyFraming::ContentLength(length) => {
                            BodyReader::Length(ContentLengthBodyReader::new(length))
                        }
                        BodyFraming::Chunked => {
                            BodyReader::Chunked(ChunkedBodyDecoder::new(&self.limits))
                        }
                    };
                    self.state = State::Body {
                        line,
                        headers,
                        framing,
                        reader,
                    };
                }
                State::Body {
                    line,
                    headers,
                    framing,
                    mut reader,
                } => {
                    let before = self.cursor.offset();
                    let progress = reader.read(&mut self.cursor)?;
                    if self.cursor.offset() > before && !reader.is_stalled() {
                        self.progressed = true;
                    }
                    match progress {
                        BodyProgress::Done => {
                            return self.complete(line, headers, framing, reader.into_body());
                        }
                        BodyProgress::NeedMore => {
                            let awaiting = reader.awaiting();
                            self.state = State::Body {
                                line,
                                headers,
                                framing,
                                reader,
                            };
                            return Ok(ParseStatus::NeedMore { awaiting });
                        }
                    }
                }
                State::Failed(error) => {
                    self.state = State::Failed(error.clone());
                    return Ok(ParseStatus::Error { error });
                }
            }
        }
    }

    fn next_line(
        &self,
        scanner: LineScanner,
        too_long: ParseErrorKind,
    ) -> Result<Option<(usize, usize)>, ParseError> {
        let offset = self.cursor.offset();
        match scanner.scan(self.cursor.peek()) {
            LineScan::Complete { len, consumed } => Ok(Some((len, consumed))),
            LineScan::Incomplete => Ok(None),
            LineScan::TooLong => Err(ParseError::new(too_long, offset)),
            LineScan::BareLineFeed { at } => {
                Err(ParseError::new(ParseErrorKind::BareLineFeed, offset + at))
            }
        }
    }

    fn consume_line(&mut self, consumed: usize) {
        self.cursor.advance(consumed);
        self.partial_line = 0;
        self.progressed = true;
    }

    // A line still within its budget that grew since the last push counts
    // as progress.
    fn note_partial_line(&mut self) {
        let len = self.cursor.len();
        if len > self.partial_line {
            self.partial_line = len;
            self.progressed = true;
        }
    }

    fn complete(
        &mut self,
        line: RequestLine,
        headers: Vec<Header>,
        framing: BodyFraming,
        body: Bytes,
    ) -> Result<ParseStatus, ParseError> {
        while self.cursor.starts_with(CRLF) {
            self.cursor.advance(CRLF.len());
        }
        if !self.cursor.is_empty() && !self.limits.allow_pipelining {
            return Err(ParseError::new(
                ParseErrorKind::TrailingData,
                self.cursor.offset(),
            ));
        }
        self.state = State::RequestLine;
        self.partial_line = 0;
        self.progressed = true;
        Ok(ParseStatus::Complete {
            request: ParsedRequest {
                line,
                headers,
                framing,
                body,
            },
        })
    }
}
