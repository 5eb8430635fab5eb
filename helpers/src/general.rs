use std::str::FromStr;

/// parse_or parses the trimmed input and returns the default if that fails.
pub fn parse_or<T: FromStr>(input: &str, default: T) -> T {
    input.trim().parse().unwrap_or(default)
}

/// parse_positive_or parses a finite value > 0.0, otherwise the default is returned.
pub fn parse_positive_or(input: &str, default: f64) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(val) if val.is_finite() && val > 0.0 => val,
        _ => default,
    }
}

/// parse_non_negative_or parses a finite value >= 0.0, otherwise the default is returned.
pub fn parse_non_negative_or(input: &str, default: f64) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(val) if val.is_finite() && val >= 0.0 => val,
        _ => default,
    }
}

/// non_empty_or returns the trimmed input, or the lazily created fallback for blank input.
pub fn non_empty_or<F: FnOnce() -> String>(input: &str, fallback: F) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_owned()
    }
}
