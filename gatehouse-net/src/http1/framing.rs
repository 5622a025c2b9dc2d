use super::error::{ParseError, ParseErrorKind};
use super::token::trim_whitespace;
use super::types::{BodyFraming, Header, Limits, MAX_BODY_LENGTH};

const CHUNKED: &[u8] = b"chunked";

pub fn resolve_framing(
    headers: &[Header],
    limits: &Limits,
    offset: usize,
) -> Result<BodyFraming, ParseError> {
    let fail = |kind| ParseError::new(kind, offset);

    let transfer_encodings: Vec<&Header> = headers
        .iter()
        .filter(|header| header.is("transfer-encoding"))
        .collect();
    let content_lengths: Vec<&Header> = headers
        .iter()
        .filter(|header| header.is("content-length"))
        .collect();

    if !transfer_encodings.is_empty() && !content_lengths.is_empty() {
        return Err(fail(ParseErrorKind::ConflictingFraming));
    }

    if let Some(first) = transfer_encodings.first() {
        if transfer_encodings.len() > 1 {
            return Err(fail(ParseErrorKind::DuplicateTransferEncoding));
        }
        if !trim_whitespace(&first.value).eq_ignore_ascii_case(CHUNKED) {
            return Err(fail(ParseErrorKind::UnsupportedTransferEncoding));
        }
        return Ok(BodyFraming::Chunked);
    }

    let mut declared: Option<u64> = None;
    for header in content_lengths {
        let length =
            parse_content_length(&header.value).ok_or(fail(ParseErrorKind::InvalidContentLength))?;
        match declared {
            Some(previous) if previous != length => {
                return Err(fail(ParseErrorKind::ConflictingContentLength));
            }
            _ => declared = Some(length),
        }
    }

    match declared {
        Some(length) if length > limits.max_body_bytes => Err(fail(ParseErrorKind::BodyTooLarge)),
        Some(length) => Ok(BodyFraming::ContentLength(length)),
        None => Ok(BodyFraming::None),
    }
}

pub fn parse_content_length(value: &[u8]) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    value.iter().try_fold(0u64, |total, byte| {
        if !byte.is_ascii_digit() {
            return None;
        }
        total
            .checked_mul(10)
            .and_then(|total| total.checked_add(u64::from(byte - b'0')))
            .filter(|total| *total <= MAX_BODY_LENGTH)
    })
}
