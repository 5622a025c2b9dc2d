use bytes::{Buf, Bytes, BytesMut};

#[derive(Debug, Default)]
pub struct ByteCursor {
    buffer: BytesMut,
    offset: usize,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has(&self, count: usize) -> bool {
        self.buffer.len() >= count
    }

    pub fn peek(&self) -> &[u8] {
        &self.buffer
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.buffer.starts_with(prefix)
    }

    pub fn advance(&mut self, count: usize) {
        let count = count.min(self.buffer.len());
        self.buffer.advance(count);
        self.offset += count;
    }

    pub fn take(&mut self, count: usize) -> Bytes {
        let count = count.min(self.buffer.len());
        self.offset += count;
        self.buffer.split_to(count).freeze()
    }
}
