//! Money-value normalization shared by every builder.

/// Largest plausible absolute money value. Anything beyond this is treated
/// as decode noise, not data.
pub const MAX_ABS_AMOUNT: f64 = 10_000_000.0;

/// Rounds to exactly two decimal places (cents).
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Validates range and rounds to cents; `None` for non-finite or
/// out-of-range values.
#[must_use]
pub fn normalize_amount(value: f64) -> Option<f64> {
    if !value.is_finite() || value.abs() > MAX_ABS_AMOUNT {
        return None;
    }
    Some(round_cents(value))
}

/// Integer cent count, used for dedup keys where `f64` has no `Eq`.
#[must_use]
pub fn cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}
