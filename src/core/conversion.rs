//! Converts native amounts into reference-currency value using a feed rate.

use crate::core::error::{LedgerError, LedgerResult};
use crate::core::oracle::RoundData;
use chrono::{DateTime, Duration, Utc};

/// Feeds reporting more decimals than this are treated as malformed;
/// `10^36` is the largest power of ten that leaves headroom in a `u128`.
pub const MAX_FEED_DECIMALS: u8 = 36;

const LOW_MASK: u128 = u64::MAX as u128;

/// How far ahead of the local clock a round may be dated before it is
/// treated as bogus.
pub const MAX_CLOCK_SKEW_SECS: i64 = 30;

/// A usable rate extracted from a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub answer: u128,
    pub scale: u128,
}

/// Checks a round before it is used for admission control.
///
/// Zero or negative answers, unrepresentable decimals and, when `max_age` is
/// set, missing, old or future-dated timestamps all fail closed.
pub fn checked_rate(
    round: &RoundData,
    max_age: Option<Duration>,
    now: DateTime<Utc>,
) -> LedgerResult<Rate> {
    if round.answer <= 0 {
        return Err(LedgerError::OracleUnavailable(format!(
            "non-positive rate {}",
            round.answer
        )));
    }
    if round.decimals > MAX_FEED_DECIMALS {
        return Err(LedgerError::OracleUnavailable(format!(
            "unsupported rate precision of {} decimals",
            round.decimals
        )));
    }
    if let Some(max_age) = max_age {
        let updated_at = round.updated_at.ok_or_else(|| {
            LedgerError::OracleUnavailable("rate has no update timestamp".to_string())
        })?;
        let age = now.signed_duration_since(updated_at);
        if age < -Duration::seconds(MAX_CLOCK_SKEW_SECS) {
            return Err(LedgerError::OracleUnavailable(format!(
                "rate is dated {}s in the future",
                -age.num_seconds()
            )));
        }
        if age > max_age {
            return Err(LedgerError::OracleUnavailable(format!(
                "rate is stale: last updated {}s ago",
                age.num_seconds()
            )));
        }
    }

    Ok(Rate {
        answer: round.answer as u128,
        scale: 10u128.pow(u32::from(round.decimals)),
    })
}

/// `amount * rate / 10^decimals`, truncated. The product is taken at 256 bits
/// so large amounts never wrap; a quotient beyond `u128` saturates.
pub fn conversion_rate(amount: u128, rate: Rate) -> u128 {
    match mul_div(amount, rate.answer, rate.scale) {
        Some((quotient, _)) => quotient,
        None => u128::MAX,
    }
}

/// Smallest native amount whose converted value reaches `minimum`:
/// `ceil(minimum * 10^decimals / rate)`.
pub fn minimum_native_amount(minimum: u128, rate: Rate) -> Option<u128> {
    let (quotient, remainder) = mul_div(minimum, rate.scale, rate.answer)?;
    if remainder == 0 {
        Some(quotient)
    } else {
        quotient.checked_add(1)
    }
}

/// Full 256-bit product of two `u128`s as `(high, low)`.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LOW_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LOW_MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & LOW_MASK) + (hl & LOW_MASK);
    let low = (ll & LOW_MASK) | (mid << 64);
    let high = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (high, low)
}

/// `a * b / denom` with remainder, or `None` if the quotient needs more than
/// 128 bits. `denom` must be non-zero.
fn mul_div(a: u128, b: u128, denom: u128) -> Option<(u128, u128)> {
    debug_assert!(denom != 0);
    if let Some(product) = a.checked_mul(b) {
        return Some((product / denom, product % denom));
    }

    let (high, low) = widening_mul(a, b);
    if high >= denom {
        return None;
    }

    // Restoring long division of (high, low) by denom, one bit at a time.
    let mut remainder = high;
    let mut quotient = 0u128;
    for bit in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((low >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || remainder >= denom {
            remainder = remainder.wrapping_sub(denom);
            quotient |= 1;
        }
    }
    Some((quotient, remainder))
}
