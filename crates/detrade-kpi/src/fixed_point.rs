//! Integer arithmetic on on-chain `uint256` amounts.
//!
//! Share prices are carried as [`BigUint`] at 18 decimals (WAD) and only turned
//! into floats once fully scaled.

use num_bigint::BigUint;

use detrade_types::TokenDecimals;

use crate::error::KpiError;

pub const WAD_DECIMALS: u32 = 18;

/// `10^18`, a share price of exactly 1.0.
pub fn wad() -> BigUint {
    pow10(WAD_DECIMALS)
}

pub fn pow10(exponent: u32) -> BigUint {
    BigUint::from(10u32).pow(exponent)
}

/// Parse a base-10 unsigned integer as written by the indexer.
pub fn parse_amount(value: &str) -> Result<BigUint, KpiError> {
    value
        .trim()
        .parse::<BigUint>()
        .map_err(|_| KpiError::InvalidAmount(value.to_string()))
}

/// `totalAssets * 10^(18 - decimals) * 10^18 / totalSupply`, floored.
pub fn share_price(
    total_assets: &str,
    total_supply: &str,
    decimals: TokenDecimals,
) -> Result<BigUint, KpiError> {
    let assets = parse_amount(total_assets)?;
    let supply = parse_amount(total_supply)?;
    if supply == BigUint::ZERO {
        return Err(KpiError::DivisionByZero("totalSupply"));
    }

    Ok(assets * pow10(decimals.scale_to_wad()) * wad() / supply)
}

/// `floor(newHighWaterMark / 10^decimals * 10^18)`, which is exact as a rescale.
pub fn high_water_mark_price(
    new_high_water_mark: &str,
    decimals: TokenDecimals,
) -> Result<BigUint, KpiError> {
    Ok(parse_amount(new_high_water_mark)? * pow10(decimals.scale_to_wad()))
}

/// Render `value / 10^decimals` as a plain decimal string without trailing zeros.
pub fn format_units(value: &BigUint, decimals: u32) -> String {
    let divisor = pow10(decimals);
    let integer = value / &divisor;
    let fraction = value % &divisor;

    if fraction == BigUint::ZERO {
        return integer.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{integer}.{}", fraction.trim_end_matches('0'))
}

/// Nearest `f64` to `value / 10^18`.
pub fn wad_to_f64(value: &BigUint) -> f64 {
    format_units(value, WAD_DECIMALS)
        .parse::<f64>()
        .unwrap_or_default()
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_price_is_one_for_equal_totals() {
        let pps = share_price(
            "1000000000000000000000",
            "1000000000000000000000",
            TokenDecimals::Eighteen,
        )
        .unwrap();
        assert_eq!(pps, wad());
    }

    #[test]
    fn test_share_price_rescales_six_decimals() {
        // 1_050 USDC backing 1_000 shares
        let pps = share_price("1050000000", "1000000000000000000000", TokenDecimals::Six).unwrap();
        assert_eq!(pps.to_string(), "1050000000000000000");
        assert!((wad_to_f64(&pps) - 1.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_share_price_floors() {
        let pps = share_price("2", "3", TokenDecimals::Eighteen).unwrap();
        assert_eq!(pps.to_string(), "666666666666666666");
    }

    #[test]
    fn test_share_price_errors() {
        assert!(matches!(
            share_price("10", "0", TokenDecimals::Six),
            Err(KpiError::DivisionByZero(_))
        ));
        assert!(matches!(
            share_price("1e18", "10", TokenDecimals::Six),
            Err(KpiError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_high_water_mark_price() {
        let pps = high_water_mark_price("1012345", TokenDecimals::Six).unwrap();
        assert_eq!(pps.to_string(), "1012345000000000000");

        let pps = high_water_mark_price("1000000000000000001", TokenDecimals::Eighteen).unwrap();
        assert_eq!(pps.to_string(), "1000000000000000001");
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(&BigUint::from(1_000_000_000u64), 6), "1000");
        assert_eq!(format_units(&BigUint::from(1_234_500_000u64), 6), "1234.5");
        assert_eq!(format_units(&BigUint::from(5u32), 6), "0.000005");
        assert_eq!(format_units(&BigUint::ZERO, 18), "0");
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(1.234_567_8, 6) - 1.234_568).abs() < 1e-12);
        assert!((round_to(7.295_6, 2) - 7.3).abs() < 1e-12);
    }
}
