/// Strip an optional `0x`/`0X` prefix
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn hex_digits(value: &str) -> Result<&str, String> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Err("no hex digits".to_string());
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("invalid hex digit".to_string());
    }
    Ok(digits)
}

/// Parse a quantity such as `0x1b4` into a u64
pub fn parse_hex_u64(value: &str) -> Result<u64, String> {
    u64::from_str_radix(hex_digits(value)?, 16).map_err(|e| e.to_string())
}

/// Parse a quantity into a u128; wei amounts need the extra width
pub fn parse_hex_u128(value: &str) -> Result<u128, String> {
    u128::from_str_radix(hex_digits(value)?, 16).map_err(|e| e.to_string())
}
