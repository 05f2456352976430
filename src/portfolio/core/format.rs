use std::fmt;

use alloy::primitives::U256;

pub const BPS_DENOMINATOR: u32 = 10_000;
const FALLBACK_DECIMALS: usize = 20;

/// Renders `amount` with exactly `decimals` fraction digits. When that rounds
/// to zero for a positive amount, falls back to a 20 digit rendering with
/// trailing zeros stripped so dust amounts stay visible.
pub fn format_decimal(amount: f64, decimals: u8) -> String {
    let fixed = format!("{:.*}", usize::from(decimals), amount);
    let rounds_to_zero = fixed.parse::<f64>().is_ok_and(|v| v == 0.0);
    if rounds_to_zero && amount > 0.0 {
        let long = format!("{:.*}", FALLBACK_DECIMALS, amount);
        return long.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    fixed
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    Empty,
    Invalid(String),
    Overflow(String),
}

impl fmt::Display for UnitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty amount"),
            Self::Invalid(raw) => write!(f, "invalid decimal amount: {raw}"),
            Self::Overflow(raw) => write!(f, "amount does not fit in uint256: {raw}"),
        }
    }
}

impl std::error::Error for UnitsError {}

/// Parses a non-negative decimal string into smallest units. Fraction digits
/// past `decimals` are truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let raw = amount.trim();
    if raw.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (raw, ""),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::Invalid(raw.to_string()));
    }

    let decimals = usize::from(decimals);
    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    if fraction.len() >= decimals {
        digits.push_str(&fraction[..decimals]);
    } else {
        digits.push_str(fraction);
        digits.extend(std::iter::repeat_n('0', decimals - fraction.len()));
    }

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(significant, 10).map_err(|_| UnitsError::Overflow(raw.to_string()))
}

/// Renders smallest units as a human decimal string with trailing fraction
/// zeros removed, e.g. `1500000` at 6 decimals is `"1.5"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let decimals = usize::from(decimals);
    let digits = amount.to_string();
    if decimals == 0 {
        return digits;
    }
    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

/// `amount * (10000 - slippage_bps) / 10000`, floored.
pub fn min_amount_out(amount: U256, slippage_bps: u32) -> U256 {
    let denominator = U256::from(BPS_DENOMINATOR);
    let keep = U256::from(BPS_DENOMINATOR.saturating_sub(slippage_bps));
    // Split to avoid overflowing on amount * keep.
    (amount / denominator) * keep + (amount % denominator) * keep / denominator
}

/// Scales `value` by `pct / 100`.
pub fn scale_pct(value: U256, pct: u64) -> U256 {
    let hundred = U256::from(100u64);
    let pct = U256::from(pct);
    (value / hundred) * pct + (value % hundred) * pct / hundred
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rendering_at_token_precision() {
        assert_eq!(format_decimal(1.5, 6), "1.500000");
        assert_eq!(format_decimal(0.1234567, 6), "0.123457");
        assert_eq!(format_decimal(0.0, 6), "0.000000");
        assert_eq!(format_decimal(2.0, 0), "2");
    }

    #[test]
    fn dust_falls_back_to_long_rendering() {
        let out = format_decimal(0.0000000001, 6);
        assert_eq!(out, "0.0000000001");
        assert!(out.parse::<f64>().expect("numeric") > 0.0);
    }

    #[test]
    fn dust_round_trips_to_zero_smallest_units() {
        let out = format_decimal(0.0000000001, 6);
        assert_eq!(parse_units(&out, 6), Ok(U256::ZERO));
    }

    #[test]
    fn parse_units_scales_and_truncates() {
        assert_eq!(parse_units("1.5", 6), Ok(U256::from(1_500_000u64)));
        assert_eq!(parse_units("1", 18), Ok(U256::from(10u64).pow(U256::from(18u64))));
        assert_eq!(parse_units(".25", 2), Ok(U256::from(25u64)));
        assert_eq!(parse_units("7.", 1), Ok(U256::from(70u64)));
        assert_eq!(parse_units("0.1234567", 6), Ok(U256::from(123_456u64)));
    }

    #[test]
    fn parse_units_rejects_malformed_input() {
        assert_eq!(parse_units("", 6), Err(UnitsError::Empty));
        for raw in [".", "-1", "1e5", "NaN", "inf", "1.2.3", "0x10", "1 2"] {
            assert!(parse_units(raw, 6).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn parse_units_reports_overflow() {
        let huge = "9".repeat(90);
        assert!(matches!(parse_units(&huge, 0), Err(UnitsError::Overflow(_))));
    }

    #[test]
    fn format_units_trims_fraction() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(42u64), 6), "0.000042");
        assert_eq!(format_units(U256::from(3_000_000u64), 6), "3");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(17u64), 0), "17");
        let amount = parse_units("12.3456", 8).expect("valid");
        assert_eq!(format_units(amount, 8), "12.3456");
    }

    #[test]
    fn min_amount_out_applies_basis_points() {
        assert_eq!(min_amount_out(U256::from(1_000_000u64), 500), U256::from(950_000u64));
        assert_eq!(min_amount_out(U256::from(10_001u64), 500), U256::from(9_500u64));
        assert_eq!(min_amount_out(U256::from(123u64), 0), U256::from(123u64));
        assert_eq!(min_amount_out(U256::from(123u64), 10_000), U256::ZERO);
        assert_eq!(min_amount_out(U256::MAX, 0), U256::MAX);
    }

    #[test]
    fn scale_pct_matches_integer_division() {
        assert_eq!(scale_pct(U256::from(1_000u64), 110), U256::from(1_100u64));
        assert_eq!(scale_pct(U256::from(7u64), 1_000), U256::from(70u64));
        assert_eq!(scale_pct(U256::from(199u64), 50), U256::from(99u64));
    }
}
