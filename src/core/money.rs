//! Decimal rounding for fiat and crypto amounts

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::FromPrimitive;

/// Fiat amounts are stored to cents.
pub const FIAT_DP: u32 = 2;
/// Contributions keep sub-unit precision.
pub const CONTRIBUTION_DP: u32 = 8;
/// Per-employee crypto amounts.
pub const CRYPTO_DP: u32 = 12;

/// Rounds `value` to `dp` decimal places, half away from zero.
///
/// The input is taken at its shortest decimal form, so binary representation noise
/// (e.g. `1639.9999999999998`) does not leak into the result and `2.675` rounds to `2.68`.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    // Decimal::to_f64 is not correctly rounded for scaled values, the string round-trip is.
    Decimal::from_f64(value)
        .and_then(|d| {
            d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
                .to_string()
                .parse()
                .ok()
        })
        .unwrap_or(value)
}
