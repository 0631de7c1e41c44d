use super::QuizId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("Falta el parámetro <id>.")]
    MissingParameter,
    #[error("El valor del parámetro <id> no es un número.")]
    NotANumber,
}

/// Turns the raw `<id>` argument into an id.
///
/// Only the leading integer is taken: surrounding whitespace and an optional sign are accepted,
/// anything after the digits (`"3.7"`, `"12abc"`) is discarded. A `0x` prefix reads the digits
/// as hexadecimal.
pub fn validate_id(raw: Option<&str>) -> Result<QuizId, IdError> {
    let raw = raw.ok_or(IdError::MissingParameter)?.trim_start();

    let (negative, unsigned) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let (digits, radix) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (unsigned, 10),
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return Err(IdError::NotANumber);
    }

    // Too many digits to be any id we could have handed out.
    let value = QuizId::from_str_radix(&digits[..end], radix).unwrap_or(QuizId::MAX);
    Ok(if negative { -value } else { value })
}
