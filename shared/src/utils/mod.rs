//! Utility functions and helpers

pub mod time;

use std::num::ParseIntError;
use thiserror::Error;

/// Failure to parse a byte size
#[derive(Debug, Error)]
pub enum ByteSizeError {
    #[error("invalid byte size: {0}")]
    Invalid(#[from] ParseIntError),

    #[error("byte size does not fit in 64 bits: {0}")]
    Overflow(String),
}

/// Parse a byte size string (e.g., "512", "64k", "16M", "1G")
pub fn parse_byte_size(s: &str) -> Result<u64, ByteSizeError> {
    let s = s.trim();

    let (num_str, multiplier) = if let Some(num_str) = s.strip_suffix(&['k', 'K'][..]) {
        (num_str, 1u64 << 10)
    } else if let Some(num_str) = s.strip_suffix(&['m', 'M'][..]) {
        (num_str, 1 << 20)
    } else if let Some(num_str) = s.strip_suffix(&['g', 'G'][..]) {
        (num_str, 1 << 30)
    } else {
        // Default to bytes if no suffix
        (s, 1)
    };

    num_str
        .trim()
        .parse::<u64>()?
        .checked_mul(multiplier)
        .ok_or_else(|| ByteSizeError::Overflow(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("512").unwrap(), 512);
        assert_eq!(parse_byte_size("64k").unwrap(), 64 * 1024);
        assert_eq!(parse_byte_size("16M").unwrap(), 16 * 1024 * 1024);
        assert_eq!(parse_byte_size(" 1G ").unwrap(), 1024 * 1024 * 1024);
        assert!(matches!(parse_byte_size("lots"), Err(ByteSizeError::Invalid(_))));
    }

    #[test]
    fn test_parse_byte_size_overflow() {
        assert!(matches!(
            parse_byte_size("99999999999G"),
            Err(ByteSizeError::Overflow(_))
        ));
        assert!(matches!(
            parse_byte_size("18446744073709551615k"),
            Err(ByteSizeError::Overflow(_))
        ));
        assert_eq!(parse_byte_size("18446744073709551615").unwrap(), u64::MAX);
        assert_eq!(parse_byte_size("16777215G").unwrap(), 16_777_215u64 << 30);
    }
}
