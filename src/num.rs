use alloy::primitives::U256;
use fastnum::{
    UD64, UD128, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

use crate::error::DexError;

/// Decimals of every monetary field the order book accepts and emits.
pub const USD_DECIMALS: u8 = 6;

/// Fraction digits of prices/sizes in the order book view.
pub const DISPLAY_DECIMALS: u8 = 3;

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    /// Converter of the 6-decimal fixed point used by the order book.
    pub fn usd() -> Self {
        Self::new(USD_DECIMALS)
    }

    /// Converts a fixed-point value, failing if it does not fit the
    /// requested decimal width.
    pub fn from_unsigned<const N: usize>(&self, value: U256) -> Result<UnsignedDecimal<N>, DexError> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .ok_or_else(|| DexError::ValueOutOfRange(format!("{value} exceeds {} bits", N * 64)))?;
        Ok(UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        ))
    }

    /// Converts to fixed point, rounding half up past the converter
    /// decimals. Scaled on `U256`, the result may exceed the coefficient
    /// range of the decimal.
    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let digits = U256::from_le_slice(value.digits().to_radix_le(256).as_slice());
        let shift = self.decimals - value.fractional_digits_count() as i32;
        if shift >= 0 {
            digits.saturating_mul(pow10(shift as u32))
        } else {
            let divisor = pow10(shift.unsigned_abs());
            digits.saturating_add(divisor / U256::from(2)) / divisor
        }
    }
}

fn pow10(exp: u32) -> U256 {
    U256::from(10).saturating_pow(U256::from(exp))
}

/// Parses user-entered decimal text into an amount representable with
/// [`USD_DECIMALS`] fraction digits.
///
/// Trailing fraction zeros are ignored, so `"1.5000000"` is accepted while
/// `"0.0000001"` is not.
pub fn parse_decimal(value: &str) -> Result<UD128, DexError> {
    parse(value)
}

/// Same as [`parse_decimal`], for prices.
pub fn parse_price(value: &str) -> Result<UD64, DexError> {
    parse(value)
}

fn parse<const N: usize>(value: &str) -> Result<UnsignedDecimal<N>, DexError> {
    let value = value.trim();
    let invalid = || DexError::InvalidDecimal(value.to_string());

    let (int_part, frac_part) = value.split_once('.').unwrap_or((value, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac_part.trim_end_matches('0').len() > USD_DECIMALS as usize {
        return Err(DexError::InvalidDecimal(format!(
            "{value} has more than {USD_DECIMALS} fraction digits"
        )));
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = frac_part.trim_end_matches('0');

    // Significant digits must fit the coefficient to be represented exactly
    let coefficient_max =
        U256::from_le_slice(bint::UInt::<N>::MAX.to_radix_le(256).as_slice());
    match U256::from_str_radix(&format!("{int_part}{frac_part}"), 10) {
        Ok(coefficient) if coefficient <= coefficient_max => {}
        _ => {
            return Err(DexError::ValueOutOfRange(format!(
                "{value} exceeds {} bits",
                N * 64
            )));
        }
    }

    let normalized = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    };
    UnsignedDecimal::<N>::from_str(&normalized, Context::default()).map_err(|_| invalid())
}

/// Formats a value the way the order book view shows prices and sizes:
/// thousands separated, [`DISPLAY_DECIMALS`] fraction digits, the fraction
/// omitted for whole numbers.
pub fn format_grouped<const N: usize>(value: UnsignedDecimal<N>) -> String {
    let scale = U256::from(10u64.pow(DISPLAY_DECIMALS as u32));
    let fixed = Converter::new(DISPLAY_DECIMALS).to_unsigned(value);
    let (int_part, frac_part) = (fixed / scale, fixed % scale);

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if !frac_part.is_zero() {
        grouped.push_str(&format!(
            ".{:0width$}",
            frac_part.to::<u64>(),
            width = DISPLAY_DECIMALS as usize
        ));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use fastnum::{udec64, udec128, udec256};

    use super::*;

    #[test]
    fn test_numeric_converter_from_unsigned() {
        assert_eq!(
            Converter::new(0).from_unsigned(U256::from(1234567890)).unwrap(),
            udec256!(1234567890)
        );
        assert_eq!(
            Converter::usd().from_unsigned(U256::from(1234567890)).unwrap(),
            udec256!(1234.56789)
        );
        assert_eq!(
            Converter::new(12).from_unsigned(U256::from(1234567890)).unwrap(),
            udec256!(0.00123456789)
        );
    }

    #[test]
    fn test_numeric_converter_from_unsigned_overflow() {
        let res: Result<fastnum::UD64, _> = Converter::usd().from_unsigned(U256::MAX);
        assert!(matches!(res, Err(DexError::ValueOutOfRange(_))));
    }

    #[test]
    fn test_numeric_converter_to_unsigned() {
        assert_eq!(
            Converter::new(0).to_unsigned(udec256!(1234567890)),
            U256::from(1234567890)
        );
        assert_eq!(
            Converter::usd().to_unsigned(udec64!(1234.56789)),
            U256::from(1234567890)
        );
        assert_eq!(
            Converter::new(12).to_unsigned(udec128!(0.00123456789)),
            U256::from(1234567890)
        );
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("3800").unwrap(), udec128!(3800));
        assert_eq!(
            Converter::usd().to_unsigned(parse_decimal("3800").unwrap()),
            U256::from(3_800_000_000u64)
        );
        assert_eq!(parse_decimal(" 0.5 ").unwrap(), udec128!(0.5));
        assert_eq!(parse_decimal(".25").unwrap(), udec128!(0.25));
        assert_eq!(parse_decimal("7.").unwrap(), udec128!(7));
        assert_eq!(parse_decimal("1.5000000").unwrap(), udec128!(1.5));
        assert_eq!(parse_decimal("0.000001").unwrap(), udec128!(0.000001));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("3800.25").unwrap(), udec64!(3800.25));
        assert_eq!(
            Converter::usd().to_unsigned(parse_price("0.000001").unwrap()),
            U256::from(1)
        );
        assert!(matches!(parse_price("-5"), Err(DexError::InvalidDecimal(_))));
    }

    #[test]
    fn test_large_price_to_unsigned() {
        let usd = Converter::usd();
        assert_eq!(
            usd.to_unsigned(parse_price("20000000000000").unwrap()),
            U256::from(20_000_000_000_000_000_000u128)
        );
        assert_eq!(
            usd.to_unsigned(parse_price("99999999999999.5").unwrap()),
            U256::from(99_999_999_999_999_500_000u128)
        );
        assert_eq!(
            usd.to_unsigned(parse_price("18446744073710").unwrap()),
            U256::from(18_446_744_073_710_000_000u128)
        );
        assert_eq!(
            usd.to_unsigned(parse_price("18446744073709551615").unwrap()),
            U256::from(18_446_744_073_709_551_615u128) * U256::from(1_000_000)
        );
    }

    #[test]
    fn test_parse_price_out_of_range() {
        for too_big in ["18446744073709551616", "1844674407370955161.6"] {
            assert!(
                matches!(parse_price(too_big), Err(DexError::ValueOutOfRange(_))),
                "{too_big:?} must be rejected"
            );
        }
        assert!(parse_decimal("18446744073709551616").is_ok());
    }

    #[test]
    fn test_to_unsigned_rounds_half_up() {
        let display = Converter::new(DISPLAY_DECIMALS);
        assert_eq!(display.to_unsigned(udec128!(1.2345)), U256::from(1235));
        assert_eq!(display.to_unsigned(udec128!(1.2344)), U256::from(1234));
        assert_eq!(display.to_unsigned(udec64!(0.0004)), U256::ZERO);
    }

    #[test]
    fn test_parse_decimal_rejects() {
        for bad in ["", ".", "-1", "1,000", "1e6", "abc", "1.2.3", "0.0000001"] {
            assert!(
                matches!(parse_decimal(bad), Err(DexError::InvalidDecimal(_))),
                "{bad:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(udec128!(3800)), "3,800");
        assert_eq!(format_grouped(udec128!(5)), "5");
        assert_eq!(format_grouped(udec128!(0)), "0");
        assert_eq!(format_grouped(udec128!(1234.5)), "1,234.500");
        assert_eq!(format_grouped(udec128!(0.25)), "0.250");
        assert_eq!(format_grouped(udec128!(1234567.891)), "1,234,567.891");
        assert_eq!(format_grouped(udec64!(999.001)), "999.001");
        assert_eq!(format_grouped(udec128!(100000)), "100,000");
    }
}
