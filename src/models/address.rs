use crate::error::ParserError;

/// Prefix every rendered address carries
pub const ADDRESS_PREFIX: &str = "0x";

/// Total rendered length: prefix plus 40 hex digits (20 bytes)
pub const ADDRESS_LENGTH: usize = 42;

/// Canonical form used for every comparison and index key: trimmed, lowercase, `0x` prefix.
pub fn canonicalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Shape check used by the store on the raw input: literal `0x` prefix and total length only.
/// No trimming, case folding or hex validation.
pub fn has_address_shape(address: &str) -> bool {
    address.starts_with(ADDRESS_PREFIX) && address.len() == ADDRESS_LENGTH
}

/// Strict validation for input arriving from outside the process
pub fn validate_address(address: &str) -> Result<(), ParserError> {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return Err(ParserError::InvalidAddress("Address cannot be empty".to_string()));
    }

    if trimmed.len() != ADDRESS_LENGTH {
        return Err(ParserError::InvalidAddress(format!(
            "Address must be {} characters long, got {}",
            ADDRESS_LENGTH,
            trimmed.len()
        )));
    }

    if !trimmed.starts_with(ADDRESS_PREFIX) {
        return Err(ParserError::InvalidAddress("Address must start with '0x'".to_string()));
    }

    if !trimmed[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParserError::InvalidAddress(
            "Address contains non-hexadecimal characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_address() {
        assert_eq!(
            canonicalize_address("0xdD93e92dc32d0B2F51430b0e6dA29BDd01AF68D6"),
            "0xdd93e92dc32d0b2f51430b0e6da29bdd01af68d6"
        );
        assert_eq!(
            canonicalize_address("  0XC22C7F8BA7DE381A299EE4EB3A11E1316525CE45 "),
            "0xc22c7f8ba7de381a299ee4eb3a11e1316525ce45"
        );
    }

    #[test]
    fn test_has_address_shape() {
        assert!(has_address_shape("0x91A9CeF0099DF1D2eA4F4B825ac06B506dfDbe07"));
        // Shape only: hex digits are not checked here
        assert!(has_address_shape("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"));

        assert!(!has_address_shape("0x123"));
        assert!(!has_address_shape("91A9CeF0099DF1D2eA4F4B825ac06B506dfDbe0700"));
        assert!(!has_address_shape(""));

        // Checked before canonicalization
        assert!(!has_address_shape("0X91A9CeF0099DF1D2eA4F4B825ac06B506dfDbe07"));
        assert!(!has_address_shape("  0x91a9cef0099df1d2ea4f4b825ac06b506dfdbe07  "));
        assert!(!has_address_shape("0x91a9cef0099df1d2ea4f4b825ac06b506dfdbe07 "));
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0xdD93e92dc32d0B2F51430b0e6dA29BDd01AF68D6").is_ok());

        assert!(validate_address("").is_err());
        assert!(validate_address("0xdD93e92dc32d0B2F51430b0e6dA29BDd01AF68D").is_err()); // Too short
        assert!(validate_address("1xdD93e92dc32d0B2F51430b0e6dA29BDd01AF68D6").is_err()); // Bad prefix
        assert!(validate_address("0xgD93e92dc32d0B2F51430b0e6dA29BDd01AF68D6").is_err()); // Invalid hex
    }
}
