//! Arbitrary-precision signed decimal arithmetic.
//!
//! tmbasic's original `Decimal` is a 34-significant-digit base-10 type
//! (`boost::multiprecision::cpp_dec_float<34>`). Rather than pull in a binary
//! `BigFloat` (`astro_float`, built for a different numeric tower — see
//! DESIGN.md), this is a base-10 fixed-point representation: an
//! arbitrary-precision mantissa (`num_bigint::BigInt`) paired with a decimal
//! scale, exact under `+ - * mod` and rounded to [`MAX_SCALE`] digits after
//! the point for `/` and the transcendental functions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

/// Number of fractional digits kept by operations that cannot produce an
/// exact result (division, `sqrt`, `ln`, `log10`, `exp`, `pow`).
pub const MAX_SCALE: u32 = 34;

/// A signed, base-10, arbitrary-precision decimal number.
///
/// Represents `mantissa * 10^-scale`. Always kept normalized: zero has
/// `scale == 0`, and no non-zero mantissa carries a trailing-zero digit that
/// a smaller scale could absorb. Normalization is what makes `Eq`/`Hash`
/// (used when a `Decimal` is the key of a persistent map) agree with decimal
/// value equality rather than representation equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn zero() -> Self {
        Decimal { mantissa: BigInt::zero(), scale: 0 }
    }

    fn raw(mantissa: BigInt, scale: u32) -> Self {
        let mut d = Decimal { mantissa, scale };
        d.normalize();
        d
    }

    fn normalize(&mut self) {
        if self.mantissa.is_zero() {
            self.scale = 0;
            return;
        }
        let ten = BigInt::from(10);
        while self.scale > 0 && (&self.mantissa % &ten).is_zero() {
            self.mantissa /= &ten;
            self.scale -= 1;
        }
    }

    pub fn from_i64(v: i64) -> Self {
        Decimal::raw(BigInt::from(v), 0)
    }

    pub fn from_i32(v: i32) -> Self {
        Decimal::raw(BigInt::from(v), 0)
    }

    /// Lossy: converts through the shortest round-tripping decimal string
    /// representation of `v`, matching how BASIC literals like `1.5` arrive
    /// as decimals in the first place.
    pub fn from_f64(v: f64) -> Self {
        if !v.is_finite() {
            return Decimal::zero();
        }
        Decimal::from_str(&format!("{v}")).unwrap_or_else(|_| Decimal::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    fn rescale_pair(a: &Decimal, b: &Decimal) -> (BigInt, BigInt, u32) {
        let scale = a.scale.max(b.scale);
        let ten = BigInt::from(10);
        let am = &a.mantissa * ten.pow(scale - a.scale);
        let bm = &b.mantissa * ten.pow(scale - b.scale);
        (am, bm, scale)
    }

    pub fn add(&self, other: &Decimal) -> Decimal {
        let (am, bm, scale) = Self::rescale_pair(self, other);
        Decimal::raw(am + bm, scale)
    }

    pub fn sub(&self, other: &Decimal) -> Decimal {
        let (am, bm, scale) = Self::rescale_pair(self, other);
        Decimal::raw(am - bm, scale)
    }

    pub fn mul(&self, other: &Decimal) -> Decimal {
        Decimal::raw(&self.mantissa * &other.mantissa, self.scale + other.scale)
    }

    /// Truncated-toward-zero division, matching `%` semantics expected by
    /// BASIC's `mod` operator (tested against tmbasic's `fmod`-style
    /// behavior in `original_source`).
    pub fn modulus(&self, other: &Decimal) -> Decimal {
        let (am, bm, scale) = Self::rescale_pair(self, other);
        let q = &am / &bm; // BigInt division truncates toward zero
        Decimal::raw(am - q * bm, scale)
    }

    /// Division rounded to [`MAX_SCALE`] fractional digits, half-to-even.
    ///
    /// `am / bm` is scale-invariant (both operands were rescaled to the same
    /// power of ten, which cancels), so this just needs enough extra digits
    /// of precision to round correctly at [`MAX_SCALE`].
    pub fn div(&self, other: &Decimal) -> Decimal {
        let (am, bm, _) = Self::rescale_pair(self, other);
        let ten = BigInt::from(10);
        let scaled_num = am * ten.pow(MAX_SCALE);
        Decimal::raw(round_half_to_even_div(&scaled_num, &bm), MAX_SCALE)
    }

    /// Reinterprets this decimal at exactly `scale` fractional digits,
    /// rounding half-to-even when narrowing. Used by [`FromStr`] to realize
    /// a negative exponent in scientific notation.
    fn rescaled_to(&self, scale: u32) -> Decimal {
        if self.scale == scale {
            return self.clone();
        }
        if self.scale > scale {
            let ten = BigInt::from(10);
            let divisor = ten.pow(self.scale - scale);
            Decimal::raw(round_half_to_even_div(&self.mantissa, &divisor), scale)
        } else {
            let ten = BigInt::from(10);
            Decimal::raw(&self.mantissa * ten.pow(scale - self.scale), scale)
        }
    }

    pub fn abs(&self) -> Decimal {
        Decimal::raw(self.mantissa.abs(), self.scale)
    }

    pub fn trunc(&self) -> Decimal {
        let ten = BigInt::from(10);
        let divisor = ten.pow(self.scale);
        Decimal::raw(&self.mantissa / divisor, 0)
    }

    pub fn floor(&self) -> Decimal {
        if self.scale == 0 {
            return self.clone();
        }
        let ten = BigInt::from(10);
        let divisor = ten.pow(self.scale);
        let (q, r) = self.mantissa.div_mod_floor(&divisor);
        let _ = r;
        Decimal::raw(q, 0)
    }

    pub fn ceil(&self) -> Decimal {
        if self.scale == 0 {
            return self.clone();
        }
        let negated = Decimal::raw(-&self.mantissa, self.scale);
        let floored = negated.floor();
        Decimal::raw(-floored.mantissa, 0)
    }

    /// Banker's rounding (half-to-even) to the nearest integer.
    pub fn round(&self) -> Decimal {
        if self.scale == 0 {
            return self.clone();
        }
        let ten = BigInt::from(10);
        let divisor = ten.pow(self.scale);
        Decimal::raw(round_half_to_even_div(&self.mantissa, &divisor), 0)
    }

    pub fn sqrt(&self) -> Decimal {
        Decimal::from_f64(self.to_f64().sqrt())
    }

    pub fn ln(&self) -> Decimal {
        Decimal::from_f64(self.to_f64().ln())
    }

    pub fn log10(&self) -> Decimal {
        Decimal::from_f64(self.to_f64().log10())
    }

    pub fn exp(&self) -> Decimal {
        Decimal::from_f64(self.to_f64().exp())
    }

    pub fn pow(&self, exponent: &Decimal) -> Decimal {
        Decimal::from_f64(self.to_f64().powf(exponent.to_f64()))
    }

    /// Truncates toward zero and narrows to `i64`, wrapping on overflow —
    /// matching the original's `static_cast<int64_t>` behavior rather than
    /// saturating or panicking.
    pub fn to_i64(&self) -> i64 {
        let truncated = self.trunc();
        truncated.mantissa.to_i64().unwrap_or_else(|| {
            let bytes = truncated.mantissa.to_signed_bytes_le();
            let mut buf = [0u8; 8];
            let n = bytes.len().min(8);
            buf[..n].copy_from_slice(&bytes[..n]);
            i64::from_le_bytes(buf)
        })
    }

    pub fn to_i32(&self) -> i32 {
        self.to_i64() as i32
    }

    pub fn to_f64(&self) -> f64 {
        self.to_string().parse::<f64>().unwrap_or(0.0)
    }
}

/// Computes `dividend / divisor` rounded to the nearest integer, ties to
/// even, for `BigInt`s of either sign. Works entirely in absolute value to
/// avoid truncated-division sign pitfalls, then reapplies the quotient's
/// true sign at the end.
fn round_half_to_even_div(dividend: &BigInt, divisor: &BigInt) -> BigInt {
    let sign = dividend.signum() * divisor.signum();
    let dividend_abs = dividend.abs();
    let divisor_abs = divisor.abs();
    let (quotient, remainder) = dividend_abs.div_rem(&divisor_abs);
    let twice_remainder = &remainder * BigInt::from(2);
    let rounded_abs = match twice_remainder.cmp(&divisor_abs) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => {
            if quotient.is_even() {
                quotient
            } else {
                quotient + 1
            }
        }
    };
    rounded_abs * sign
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (am, bm, _) = Self::rescale_pair(self, other);
        am.cmp(&bm)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let negative = self.mantissa.is_negative();
        let digits = self.mantissa.abs().to_string();
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale { format!("{:0>width$}", digits, width = scale + 1) } else { digits };
        let split_at = padded.len() - scale;
        let (int_part, frac_part) = padded.split_at(split_at);
        if negative {
            write!(f, "-")?;
        }
        write!(f, "{int_part}.{frac_part}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError;

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal literal")
    }
}

impl std::error::Error for ParseDecimalError {}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(exp_pos) = s.find(['e', 'E']) {
            let (mantissa_part, exp_part) = s.split_at(exp_pos);
            let exp: i32 = exp_part[1..].parse().map_err(|_| ParseDecimalError)?;
            let base = Decimal::from_str(mantissa_part)?;
            return Ok(if exp >= 0 {
                Decimal::raw(base.mantissa * BigInt::from(10).pow(exp as u32), base.scale)
            } else {
                base.rescaled_to(base.scale + (-exp) as u32)
            });
        }

        let negative = s.starts_with('-');
        let unsigned = s.trim_start_matches(['-', '+']);
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseDecimalError);
        }
        if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseDecimalError);
        }
        let digits = format!("{int_part}{frac_part}");
        let digits = if digits.is_empty() { "0" } else { &digits };
        let mut mantissa: BigInt = digits.parse().map_err(|_| ParseDecimalError)?;
        if negative {
            mantissa = -mantissa;
        }
        Ok(Decimal::raw(mantissa, frac_part.len() as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_add_aligns_scales() {
        let a = Decimal::from_str("1.5").unwrap();
        let b = Decimal::from_str("2.25").unwrap();
        assert_eq!((a.add(&b)).to_string(), "3.75");
    }

    #[test]
    fn test_decimal_modulus_matches_scenario() {
        let a = Decimal::from_i64(7);
        let b = Decimal::from_i64(3);
        assert_eq!(a.modulus(&b), Decimal::from_i64(1));
    }

    #[test]
    fn test_decimal_round_half_to_even() {
        assert_eq!(Decimal::from_str("2.5").unwrap().round().to_string(), "2");
        assert_eq!(Decimal::from_str("3.5").unwrap().round().to_string(), "4");
        assert_eq!(Decimal::from_str("-2.5").unwrap().round().to_string(), "-2");
    }

    #[test]
    fn test_decimal_floor_and_ceil_negative() {
        let v = Decimal::from_str("-1.5").unwrap();
        assert_eq!(v.floor().to_string(), "-2");
        assert_eq!(v.ceil().to_string(), "-1");
    }

    #[test]
    fn test_decimal_trunc_truncates_toward_zero() {
        assert_eq!(Decimal::from_str("-1.9").unwrap().trunc().to_string(), "-1");
        assert_eq!(Decimal::from_str("1.9").unwrap().trunc().to_string(), "1");
    }

    #[test]
    fn test_decimal_display_roundtrip_exact() {
        let parsed: Decimal = "123.456".parse().unwrap();
        assert_eq!(parsed.to_string(), "123.456");
    }

    #[test]
    fn test_decimal_normalizes_trailing_zeros() {
        let a = Decimal::from_str("1.50").unwrap();
        let b = Decimal::from_str("1.5").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1.5");
    }

    #[test]
    fn test_decimal_ordering() {
        assert!(Decimal::from_i64(1) < Decimal::from_i64(2));
        assert!(Decimal::from_str("1.1").unwrap() > Decimal::from_i64(1));
    }

    #[test]
    fn test_decimal_division_is_exact_for_terminating_quotient() {
        let a = Decimal::from_i64(1);
        let b = Decimal::from_i64(4);
        assert_eq!(a.div(&b).to_string(), "0.25");
    }

    #[test]
    fn test_decimal_to_i64_truncates() {
        assert_eq!(Decimal::from_str("5.9").unwrap().to_i64(), 5);
        assert_eq!(Decimal::from_str("-5.9").unwrap().to_i64(), -5);
    }

    #[test]
    fn test_decimal_from_f64_roundtrips_simple_values() {
        assert_eq!(Decimal::from_f64(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_decimal_parse_rejects_garbage() {
        assert!(Decimal::from_str("abc").is_err());
        assert!(Decimal::from_str("").is_err());
    }

    #[test]
    fn test_decimal_parse_scientific_notation() {
        assert_eq!(Decimal::from_str("1.5e2").unwrap().to_string(), "150");
        assert_eq!(Decimal::from_str("1.5e-2").unwrap().to_string(), "0.015");
    }
}
