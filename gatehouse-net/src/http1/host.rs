use super::error::{ParseError, ParseErrorKind};
use super::types::Header;

pub fn validate_host(headers: &[Header], offset: usize) -> Result<(), ParseError> {
    let mut hosts = headers.iter().filter(|header| header.is("host"));
    let host = hosts
        .next()
        .ok_or(ParseError::new(ParseErrorKind::MissingHost, offset))?;
    if hosts.next().is_some() {
        return Err(ParseError::new(ParseErrorKind::DuplicateHost, offset));
    }
    if host.value.is_empty() {
        return Err(ParseError::new(ParseErrorKind::EmptyHost, offset));
    }
    Ok(())
}
