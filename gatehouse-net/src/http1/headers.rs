use super::error::{ParseError, ParseErrorKind};
use super::line::LineScanner;
use super::token::{is_forbidden_control, is_token, is_whitespace, trim_whitespace};
use super::types::{Header, Limits};

// Headers seen before Host are charged all at once when Host arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanPhase {
    SeekingHost,
    Counting { counted: usize },
}

#[derive(Debug)]
pub struct HeaderBlockParser {
    headers: Vec<Header>,
    phase: ScanPhase,
    block_bytes: usize,
    max_header_count: usize,
    max_header_block_bytes: usize,
    scanner: LineScanner,
}

impl HeaderBlockParser {
    pub fn new(limits: &Limits) -> Self {
        Self {
            headers: Vec::new(),
            phase: ScanPhase::SeekingHost,
            block_bytes: 0,
            max_header_count: limits.max_header_count,
            max_header_block_bytes: limits.max_header_block_bytes,
            scanner: LineScanner::new(limits.max_header_line_bytes),
        }
    }

    pub fn scanner(&self) -> LineScanner {
        self.scanner
    }

    pub fn host_located(&self) -> bool {
        matches!(self.phase, ScanPhase::Counting { .. })
    }

    pub fn feed_line(
        &mut self,
        line: &[u8],
        consumed: usize,
        offset: usize,
    ) -> Result<bool, ParseError> {
        self.block_bytes += consumed;
        if self.block_bytes > self.max_header_block_bytes {
            return Err(ParseError::new(ParseErrorKind::HeaderBlockTooLarge, offset));
        }

        if line.is_empty() {
            return Ok(true);
        }

        if let ScanPhase::Counting { counted } = &mut self.phase {
            *counted += 1;
            if *counted > self.max_header_count {
                return Err(ParseError::new(ParseErrorKind::TooManyHeaders, offset));
            }
        }

        let header = parse_header_line(line, offset)?;
        let is_host = header.is("host");
        self.headers.push(header);

        if is_host && self.phase == ScanPhase::SeekingHost {
            let counted = self.headers.len();
            self.phase = ScanPhase::Counting { counted };
            if counted > self.max_header_count {
                return Err(ParseError::new(ParseErrorKind::TooManyHeaders, offset));
            }
        }

        Ok(false)
    }

    pub fn into_headers(self) -> Vec<Header> {
        self.headers
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }
}

pub fn parse_header_line(line: &[u8], offset: usize) -> Result<Header, ParseError> {
    if line.first().copied().is_some_and(is_whitespace) {
        return Err(ParseError::new(ParseErrorKind::ObsoleteLineFolding, offset));
    }

    let colon = line
        .iter()
        .position(|byte| *byte == b':')
        .ok_or(ParseError::new(ParseErrorKind::MissingColon, offset))?;

    let raw_name = &line[..colon];
    if !is_token(raw_name) {
        return Err(ParseError::new(ParseErrorKind::InvalidHeaderName, offset));
    }

    let raw_value = &line[colon + 1..];
    if raw_value.iter().copied().any(is_forbidden_control) {
        return Err(ParseError::new(ParseErrorKind::InvalidHeaderValue, offset));
    }

    // Token bytes are ASCII, so the name is always valid UTF-8.
    let raw_name = String::from_utf8_lossy(raw_name).into_owned();
    Ok(Header {
        name: raw_name.to_ascii_lowercase(),
        raw_name,
        value: trim_whitespace(raw_value).to_vec(),
    })
}
