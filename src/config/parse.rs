use std::time::Duration;

use crate::error::ConfigError;

/// Parses `<digits>[ms|s|m|h]`; a missing unit means seconds.
///
/// # Errors
///
/// Returns an error for empty, malformed, zero or overflowing values.
pub fn parse_duration_value(value: &str) -> Result<Duration, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::DurationEmpty);
    }

    let digits_len = value
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return Err(ConfigError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|source| ConfigError::InvalidDurationNumber {
            value: value.to_owned(),
            source,
        })?;

    let duration = match unit_part.trim() {
        "ms" => Duration::from_millis(number),
        "" | "s" => Duration::from_secs(number),
        "m" => Duration::from_secs(
            number
                .checked_mul(60)
                .ok_or(ConfigError::DurationOverflow)?,
        ),
        "h" => Duration::from_secs(
            number
                .checked_mul(3600)
                .ok_or(ConfigError::DurationOverflow)?,
        ),
        unit => {
            return Err(ConfigError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };

    if duration.is_zero() {
        return Err(ConfigError::DurationZero);
    }
    Ok(duration)
}

/// Splits `Key: Value` at the first colon and trims both sides.
///
/// # Errors
///
/// Returns an error when there is no colon or the key is empty.
pub fn parse_header(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(ConfigError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}
