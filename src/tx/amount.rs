//! Exact conversions between display amounts and minimal units

use crate::error::WalletError;

/// Fraction digits shown in readable amounts
pub const DISPLAY_PLACES: u32 = 6;

/// Parse a user-entered decimal amount ("1.5") into minimal units.
///
/// No floating point: more fraction digits than `decimals` is rejected rather
/// than rounded.
pub fn parse_amount(input: &str, decimals: u32) -> Result<u128, WalletError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(WalletError::invalid_input("Amount is required"));
    }

    let (whole, fraction) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(WalletError::invalid_input(format!("Invalid amount '{}'", input)));
    }
    if fraction.len() > decimals as usize {
        return Err(WalletError::invalid_input(format!(
            "Amount supports at most {} decimal places",
            decimals
        )));
    }

    let overflow = || WalletError::invalid_input("Amount is too large");
    let scale = 10u128.checked_pow(decimals).ok_or_else(overflow)?;

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// Format minimal units as a decimal with [`DISPLAY_PLACES`] fraction digits,
/// rounding half up when the currency has more decimals than that.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let unit = 10u128.pow(DISPLAY_PLACES);

    let scaled = if decimals >= DISPLAY_PLACES {
        match 10u128.checked_pow(decimals - DISPLAY_PLACES) {
            Some(1) => amount,
            Some(divisor) => {
                let rem = amount % divisor;
                amount / divisor + u128::from(rem >= divisor - rem)
            }
            None => 0,
        }
    } else {
        amount.saturating_mul(10u128.pow(DISPLAY_PLACES - decimals))
    };

    format!("{}.{:06}", scaled / unit, scaled % unit)
}

/// Split a composite coin string such as `1000000stake` into amount and denom.
///
/// Only the first coin of a comma-separated list is read. The denom must start
/// with a letter and may contain `/` (IBC denoms).
pub fn split_amount_denom(composite: &str) -> Option<(String, String)> {
    let first = composite.split(',').next()?.trim();
    let digits_end = first
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(first.len());

    let (amount, denom) = first.split_at(digits_end);
    if amount.is_empty() || !denom.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let valid_denom = denom
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if !valid_denom {
        return None;
    }

    Some((amount.to_string(), denom.to_string()))
}
