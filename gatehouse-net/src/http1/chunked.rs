use bytes::{Bytes, BytesMut};

use super::body::BodyProgress;
use super::cursor::ByteCursor;
use super::error::{ParseError, ParseErrorKind};
use super::token::{is_forbidden_control, is_whitespace};
use super::types::{Awaiting, Limits, MAX_BODY_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeStage {
    Digits,
    Whitespace,
    Extension,
    CarriageReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkPhase {
    SizeLine {
        size: u64,
        digits: usize,
        stage: SizeStage,
        line_len: usize,
    },
    Data {
        remaining: u64,
    },
    DataCrlf {
        seen_cr: bool,
    },
    FinalCrlf {
        seen_cr: bool,
    },
    Stalled {
        absorbed: usize,
    },
    Done,
}

impl ChunkPhase {
    fn size_line() -> Self {
        Self::SizeLine {
            size: 0,
            digits: 0,
            stage: SizeStage::Digits,
            line_len: 0,
        }
    }
}

#[derive(Debug)]
pub struct ChunkedBodyDecoder {
    phase: ChunkPhase,
    body: BytesMut,
    decoded: u64,
    line_budget: usize,
    max_body_bytes: u64,
}

impl ChunkedBodyDecoder {
    pub fn new(limits: &Limits) -> Self {
        Self {
            phase: ChunkPhase::size_line(),
            body: BytesMut::new(),
            decoded: 0,
            line_budget: limits.max_header_line_bytes,
            max_body_bytes: limits.max_body_bytes,
        }
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self.phase, ChunkPhase::Stalled { .. })
    }

    pub fn awaiting(&self) -> Awaiting {
        match self.phase {
            ChunkPhase::SizeLine { .. } => Awaiting::ChunkSize,
            ChunkPhase::Data { remaining } => Awaiting::ChunkData { remaining },
            ChunkPhase::DataCrlf { .. } => Awaiting::ChunkTerminator,
            ChunkPhase::FinalCrlf { .. } => Awaiting::FinalTerminator,
            ChunkPhase::Stalled { .. } => Awaiting::Stalled,
            ChunkPhase::Done => Awaiting::Nothing,
        }
    }

    pub fn decode(&mut self, cursor: &mut ByteCursor) -> Result<BodyProgress, ParseError> {
        loop {
            match self.phase {
                ChunkPhase::Done => return Ok(BodyProgress::Done),
                ChunkPhase::Data { remaining } => {
                    if cursor.is_empty() {
                        return Ok(BodyProgress::NeedMore);
                    }
                    let available = u64::try_from(cursor.len()).unwrap_or(u64::MAX);
                    let take = remaining.min(available);
                    let chunk = cursor.take(usize::try_from(take).unwrap_or(usize::MAX));
                    self.body.extend_from_slice(&chunk);
                    self.phase = match remaining - take {
                        0 => ChunkPhase::DataCrlf { seen_cr: false },
                        remaining => ChunkPhase::Data { remaining },
                    };
                }
                ChunkPhase::Stalled { absorbed } => {
                    if cursor.is_empty() {
                        return Ok(BodyProgress::NeedMore);
                    }
                    let absorbed = absorbed + cursor.len();
                    if absorbed > self.line_budget {
                        return Err(ParseError::new(
                            ParseErrorKind::ChunkLineTooLong,
                            cursor.offset(),
                        ));
                    }
                    cursor.advance(cursor.len());
                    self.phase = ChunkPhase::Stalled { absorbed };
                    return Ok(BodyProgress::NeedMore);
                }
                _ => {
                    let Some(&byte) = cursor.peek().first() else {
                        return Ok(BodyProgress::NeedMore);
                    };
                    self.phase = self.step(byte, cursor.offset())?;
                    cursor.advance(1);
                }
            }
        }
    }

    pub fn on_eof(&self, offset: usize) -> Result<(), ParseError> {
        match self.phase {
            ChunkPhase::Done => Ok(()),
            _ => Err(ParseError::new(ParseErrorKind::UnexpectedEof, offset)),
        }
    }

    pub fn decoded_len(&self) -> u64 {
        self.decoded
    }

    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }

    fn step(&mut self, byte: u8, offset: usize) -> Result<ChunkPhase, ParseError> {
        let fail = |kind| Err(ParseError::new(kind, offset));

        match self.phase {
            ChunkPhase::SizeLine {
                size,
                digits,
                stage,
                line_len,
            } => {
                let line_len = line_len + 1;
                if line_len > self.line_budget.saturating_add(2) {
                    return fail(ParseErrorKind::ChunkLineTooLong);
                }
                let next = |size, digits, stage| {
                    Ok(ChunkPhase::SizeLine {
                        size,
                        digits,
                        stage,
                        line_len,
                    })
                };

                match (stage, byte) {
                    (SizeStage::Digits, _) if byte.is_ascii_hexdigit() => {
                        let Some(size) = size
                            .checked_mul(16)
                            .and_then(|size| size.checked_add(hex_value(byte)))
                            .filter(|size| *size <= MAX_BODY_LENGTH)
                        else {
                            return fail(ParseErrorKind::ChunkSizeOverflow);
                        };
                        next(size, digits + 1, SizeStage::Digits)
                    }
                    (SizeStage::Digits, _) if digits == 0 => fail(ParseErrorKind::InvalidChunkSize),
                    (SizeStage::CarriageReturn, b'\n') => self.complete_size_line(size, offset),
                    (SizeStage::CarriageReturn, _) => fail(ParseErrorKind::InvalidChunkSize),
                    (_, b'\r') => next(size, digits, SizeStage::CarriageReturn),
                    (_, b'\n') => Ok(ChunkPhase::Stalled { absorbed: line_len }),
                    (SizeStage::Extension, _) if is_forbidden_control(byte) => {
                        fail(ParseErrorKind::InvalidChunkExtension)
                    }
                    (SizeStage::Extension, _) | (_, b';') => {
                        next(size, digits, SizeStage::Extension)
                    }
                    (_, _) if is_whitespace(byte) => next(size, digits, SizeStage::Whitespace),
                    (_, _) => fail(ParseErrorKind::InvalidChunkSize),
                }
            }
            ChunkPhase::DataCrlf { seen_cr } | ChunkPhase::FinalCrlf { seen_cr } => {
                let is_final = matches!(self.phase, ChunkPhase::FinalCrlf { .. });
                match (seen_cr, byte) {
                    (false, b'\r') if is_final => Ok(ChunkPhase::FinalCrlf { seen_cr: true }),
                    (false, b'\r') => Ok(ChunkPhase::DataCrlf { seen_cr: true }),
                    (false, b'\n') => Ok(ChunkPhase::Stalled { absorbed: 1 }),
                    (true, b'\n') if is_final => Ok(ChunkPhase::Done),
                    (true, b'\n') => Ok(ChunkPhase::size_line()),
                    _ => fail(ParseErrorKind::InvalidChunkTerminator),
                }
            }
            ChunkPhase::Data { .. } | ChunkPhase::Stalled { .. } | ChunkPhase::Done => {
                fail(ParseErrorKind::Internal)
            }
        }
    }

    fn complete_size_line(&mut self, size: u64, offset: usize) -> Result<ChunkPhase, ParseError> {
        if size == 0 {
            return Ok(ChunkPhase::FinalCrlf { seen_cr: false });
        }
        let decoded = self.decoded.saturating_add(size);
        if decoded > self.max_body_bytes {
            tracing::debug!(
                decoded = self.decoded,
                chunk = size,
                limit = self.max_body_bytes,
                "chunked body exceeds the body limit"
            );
            return Err(ParseError::new(ParseErrorKind::BodyTooLarge, offset));
        }
        self.decoded = decoded;
        Ok(ChunkPhase::Data { remaining: size })
    }
}

fn hex_value(byte: u8) -> u64 {
    let value = match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    };
    u64::from(value)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::ChunkedBodyDecoder;
    use crate::http1::body::BodyProgress;
    use crate::http1::cursor::ByteCursor;
    use crate::http1::{Awaiting, Limits, ParseError, ParseErrorKind};

    fn decode(input: &[u8]) -> (ChunkedBodyDecoder, ByteCursor, Result<BodyProgress, ParseError>) {
        let mut decoder = ChunkedBodyDecoder::new(&Limits::default());
        let mut cursor = ByteCursor::new();
        cursor.extend(input);
        let result = decoder.decode(&mut cursor);
        (decoder, cursor, result)
    }

    fn error_kind(input: &[u8]) -> ParseErrorKind {
        decode(input).2.unwrap_err().kind
    }

    #[test]
    fn decodes_chunks() {
        let (decoder, cursor, result) = decode(b"5\r\nHello\r\n6\r\n World\r\n0\r\n\r\n");
        assert_eq!(result, Ok(BodyProgress::Done));
        assert!(cursor.is_empty());
        assert_eq!(decoder.decoded_len(), 11);
        assert_eq!(&decoder.into_body()[..], b"Hello World");
    }

    #[test]
    fn decodes_byte_by_byte() {
        let input = b"3;name=value\r\nabc\r\nA \r\n0123456789\r\n0\r\n\r\n";
        let mut decoder = ChunkedBodyDecoder::new(&Limits::default());
        let mut cursor = ByteCursor::new();
        for (index, byte) in input.iter().enumerate() {
            cursor.extend(&[*byte]);
            let result = decoder.decode(&mut cursor).unwrap();
            if index + 1 < input.len() {
                assert_eq!(result, BodyProgress::NeedMore, "byte {index}");
            } else {
                assert_eq!(result, BodyProgress::Done);
            }
        }
        assert_eq!(&decoder.into_body()[..], b"abc0123456789");
    }

    #[test]
    fn leaves_bytes_after_the_final_crlf() {
        let (_, cursor, result) = decode(b"0\r\n\r\n0\r\n\r\n");
        assert_eq!(result, Ok(BodyProgress::Done));
        assert_eq!(cursor.peek(), b"0\r\n\r\n");
    }

    #[test]
    fn rejects_non_hex_size_immediately() {
        assert_eq!(error_kind(b"INVALID"), ParseErrorKind::InvalidChunkSize);
        assert_eq!(error_kind(b"x\r\nWorld\r\n"), ParseErrorKind::InvalidChunkSize);
        assert_eq!(error_kind(b"\r\n"), ParseErrorKind::InvalidChunkSize);
    }

    #[test]
    fn rejects_trailing_garbage_at_the_offending_byte() {
        let (_, _, result) = decode(b"5xyz");
        assert_eq!(
            result,
            Err(ParseError::new(ParseErrorKind::InvalidChunkSize, 1))
        );
        assert_eq!(error_kind(b"5 z\r\n"), ParseErrorKind::InvalidChunkSize);
    }

    #[test]
    fn rejects_overflowing_size() {
        assert_eq!(
            error_kind(b"FFFFFFFFFFFFFFFF\r\n"),
            ParseErrorKind::ChunkSizeOverflow
        );
        assert_eq!(
            error_kind(b"7FFFFFFFFFFFFFFF\r\n"),
            ParseErrorKind::BodyTooLarge
        );
    }

    #[test]
    fn rejects_wrong_bytes_where_crlf_belongs() {
        assert_eq!(
            error_kind(b"5\r\nHello0\r\n\r\n"),
            ParseErrorKind::InvalidChunkTerminator
        );
        assert_eq!(
            error_kind(b"5\r\nHello\rX"),
            ParseErrorKind::InvalidChunkTerminator
        );
        assert_eq!(
            error_kind(b"0\r\nTrailer: x\r\n\r\n"),
            ParseErrorKind::InvalidChunkTerminator
        );
    }

    #[test]
    fn rejects_control_bytes_in_extension() {
        assert_eq!(
            error_kind(b"5;ext\x01\r\n"),
            ParseErrorKind::InvalidChunkExtension
        );
    }

    #[test]
    fn short_chunk_data_suspends() {
        let (decoder, _, result) = decode(b"A\r\nHello\r\n0\r\n\r\n");
        assert_eq!(result, Ok(BodyProgress::NeedMore));
        assert_eq!(decoder.awaiting(), Awaiting::ChunkSize);
        assert!(!decoder.is_stalled());
    }

    #[test]
    fn bare_line_feeds_stall_instead_of_failing() {
        let (decoder, cursor, result) = decode(b"5\nHello\n0\n\n");
        assert_eq!(result, Ok(BodyProgress::NeedMore));
        assert!(decoder.is_stalled());
        assert!(cursor.is_empty());

        let (decoder, _, result) = decode(b"5\r\nHello\n");
        assert_eq!(result, Ok(BodyProgress::NeedMore));
        assert_eq!(decoder.awaiting(), Awaiting::Stalled);
    }

    #[test]
    fn stalled_decoder_rejects_once_budget_is_spent() {
        let limits = Limits {
            max_header_line_bytes: 8,
            ..Limits::default()
        };
        let mut decoder = ChunkedBodyDecoder::new(&limits);
        let mut cursor = ByteCursor::new();
        cursor.extend(b"5\n");
        assert_eq!(decoder.decode(&mut cursor), Ok(BodyProgress::NeedMore));
        cursor.extend(b"0123456789");
        assert_matches!(
            decoder.decode(&mut cursor),
            Err(ParseError {
                kind: ParseErrorKind::ChunkLineTooLong,
                ..
            })
        );
    }

    #[test]
    fn long_size_line_is_rejected() {
        let limits = Limits {
            max_header_line_bytes: 8,
            ..Limits::default()
        };
        let mut decoder = ChunkedBodyDecoder::new(&limits);
        let mut cursor = ByteCursor::new();
        cursor.extend(b"5;aaaaaaaaaaaaaaaaaaaa\r\n");
        assert_matches!(
            decoder.decode(&mut cursor),
            Err(ParseError {
                kind: ParseErrorKind::ChunkLineTooLong,
                ..
            })
        );
    }

    #[test]
    fn eof_before_final_crlf_is_malformed() {
        let (decoder, cursor, _) = decode(b"5\r\nHel");
        assert_eq!(
            decoder.on_eof(cursor.offset()),
            Err(ParseError::new(ParseErrorKind::UnexpectedEof, 6))
        );
        let (decoder, _, _) = decode(b"0\r\n\r\n");
        assert_eq!(decoder.on_eof(0), Ok(()));
    }
}
