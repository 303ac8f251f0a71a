//! Numeric argument parsing shared by handlers.

/// Parses a score argument. `NaN` is rejected because it has no place in a total
/// member order.
pub(super) fn parse_score(bytes: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(bytes).ok()?;
    let value: f64 = text.trim().parse().ok()?;
    (!value.is_nan()).then_some(value)
}

/// Parses a signed integer argument (offset, limit).
pub(super) fn parse_int(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}
