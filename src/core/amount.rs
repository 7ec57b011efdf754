//! Native and reference-currency amounts
//!
//! Both kinds of amount are `u128` fixed-point integers with 18 decimals:
//! native amounts are counted in wei, reference values in the same scale
//! so that `50 * 10^18` means 50 reference units.

use anyhow::{Context, Result, anyhow, bail};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

/// Number of decimals in both the native and the reference scale.
pub const DECIMALS: u32 = 18;

/// Smallest native units per whole native unit.
pub const WEI_PER_NATIVE: u128 = 1_000_000_000_000_000_000;

/// Default admission threshold: 50 reference units.
pub const MINIMUM_CONTRIBUTION: u128 = 50 * WEI_PER_NATIVE;

/// Scales whole reference units into the 18-decimal reference scale.
pub fn reference_units(whole: u64) -> u128 {
    u128::from(whole) * WEI_PER_NATIVE
}

/// Parses a human amount such as `"0.03"` into wei.
pub fn parse_native(input: &str) -> Result<u128> {
    let value = Decimal::from_str(input.trim())
        .with_context(|| format!("Invalid amount: {input}"))?
        .normalize();

    if value.is_sign_negative() && !value.is_zero() {
        bail!("Amount must not be negative: {}", input);
    }
    if value.scale() > DECIMALS {
        bail!(
            "Amount has more than {} decimal places: {}",
            DECIMALS,
            input
        );
    }

    value
        .checked_mul(Decimal::from(WEI_PER_NATIVE as u64))
        .and_then(|wei| wei.to_u128())
        .ok_or_else(|| anyhow!("Amount is too large: {}", input))
}

/// Formats an 18-decimal fixed-point integer without trailing zeros.
pub fn format_fixed(value: u128) -> String {
    i128::try_from(value)
        .ok()
        .and_then(|v| Decimal::try_from_i128_with_scale(v, DECIMALS).ok())
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|| format!("{value}e-{DECIMALS}"))
}
