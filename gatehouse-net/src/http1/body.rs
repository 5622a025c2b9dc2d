use bytes::{Bytes, BytesMut};

use super::cursor::ByteCursor;
use super::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyProgress {
    Done,
    NeedMore,
}

#[derive(Debug)]
pub struct ContentLengthBodyReader {
    declared: u64,
    remaining: u64,
    body: BytesMut,
}

impl ContentLengthBodyReader {
    pub fn new(declared: u64) -> Self {
        Self {
            declared,
            remaining: declared,
            body: BytesMut::new(),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn read(&mut self, cursor: &mut ByteCursor) -> BodyProgress {
        let available = u64::try_from(cursor.len()).unwrap_or(u64::MAX);
        let take = self.remaining.min(available);
        if take > 0 {
            // `take` never exceeds `cursor.len()`, which is a usize.
            let chunk = cursor.take(usize::try_from(take).unwrap_or(usize::MAX));
            self.body.extend_from_slice(&chunk);
            self.remaining -= take;
        }
        if self.remaining == 0 {
            BodyProgress::Done
        } else {
            BodyProgress::NeedMore
        }
    }

    pub fn on_eof(&self, offset: usize) -> Result<(), ParseError> {
        if self.remaining == 0 {
            Ok(())
        } else {
            tracing::debug!(
                declared = self.declared,
                received = self.declared - self.remaining,
                "connection closed inside a content-length body"
            );
            Err(ParseError::new(ParseErrorKind::UnexpectedEof, offset))
        }
    }

    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}
