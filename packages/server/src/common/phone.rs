use super::PortalError;

/// Normalize a user-entered phone number into the E.164-like key used by
/// every store (`+` followed by 8-15 digits).
///
/// Spaces, dashes, dots and parentheses are stripped; anything else is
/// rejected.
pub fn normalize_phone_number(raw: &str) -> Result<String, PortalError> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let digits = compact
        .strip_prefix('+')
        .ok_or_else(|| PortalError::Invalid("phone number must start with +".to_string()))?;

    if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PortalError::Invalid(format!(
            "phone number must have 8-15 digits: {}",
            raw.trim()
        )));
    }

    Ok(compact)
}
