/// Exact rational coefficients for symbolic terms.
///
/// Every value is kept as a gcd-reduced `numerator / denominator` pair with
/// a positive denominator; the sign lives in the numerator. Denominators are
/// only ever built from values that are non-zero in the field, so they never
/// vanish modulo p.
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use field::{from_bigint, modulus, to_biguint, Field, FieldElement};
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Beyond this many bits a value is folded to its canonical field
/// representative so repeated folding cannot grow without bound.
const MAX_BITS: u64 = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rational {
    num: BigInt,
    den: BigInt,
}

impl Rational {
    pub fn zero() -> Self {
        Self::from_integer(BigInt::zero())
    }

    pub fn one() -> Self {
        Self::from_integer(BigInt::one())
    }

    pub fn from_integer(value: BigInt) -> Self {
        Self {
            num: value,
            den: BigInt::one(),
        }
        .bounded()
    }

    pub fn from_i64(value: i64) -> Self {
        Self::from_integer(BigInt::from(value))
    }

    pub fn from_biguint(value: BigUint) -> Self {
        Self::from_integer(BigInt::from_biguint(Sign::Plus, value))
    }

    /// Canonical integer representative of a field element.
    pub fn from_field(value: &FieldElement) -> Self {
        Self::from_biguint(to_biguint(value))
    }

    /// `num / den`, or `None` when `den` is zero.
    pub fn new(num: BigInt, den: BigInt) -> Option<Self> {
        if den.is_zero() {
            return None;
        }
        let g = num.gcd(&den);
        let (mut num, mut den) = if g.is_zero() || g.is_one() {
            (num, den)
        } else {
            (num / &g, den / &g)
        };
        if den.is_negative() {
            num = -num;
            den = -den;
        }
        Some(Self { num, den }.bounded())
    }

    /// Parse a decimal literal.
    pub fn parse_decimal(digits: &str) -> Option<Self> {
        BigInt::parse_bytes(digits.as_bytes(), 10).map(Self::from_integer)
    }

    pub fn numer(&self) -> &BigInt {
        &self.num
    }

    pub fn denom(&self) -> &BigInt {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// Zero modulo p. Differs from `is_zero` only for multiples of p.
    pub fn vanishes(&self) -> bool {
        self.is_zero() || self.to_field().is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.num.is_one() && self.den.is_one()
    }

    pub fn is_negative(&self) -> bool {
        self.num.is_negative()
    }

    /// Multiplicative inverse. `None` when the value is zero in the field.
    pub fn recip(&self) -> Option<Self> {
        if self.to_field().is_zero() {
            return None;
        }
        Self::new(self.den.clone(), self.num.clone())
    }

    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        Some(self * &other.recip()?)
    }

    /// Value in the field: `num · den⁻¹ mod p`.
    pub fn to_field(&self) -> FieldElement {
        let num = from_bigint(&self.num);
        if self.den.is_one() {
            return num;
        }
        let den = from_bigint(&self.den);
        num * den.inverse().unwrap_or_default()
    }

    /// Greatest common scalar of a set of rationals: gcd of the numerators
    /// over lcm of the denominators. Always non-negative.
    pub fn gcd_of<'a>(values: impl IntoIterator<Item = &'a Rational>) -> Self {
        let mut num = BigInt::zero();
        let mut den = BigInt::one();
        for v in values {
            num = num.gcd(&v.num);
            den = den.lcm(&v.den);
        }
        if num.is_zero() {
            return Self::one();
        }
        Self::new(num, den).unwrap_or_else(Self::one)
    }

    fn bounded(self) -> Self {
        if self.num.bits() <= MAX_BITS && self.den.bits() <= MAX_BITS {
            return self;
        }
        let canonical = to_biguint(&self.to_field());
        debug_assert!(canonical < modulus());
        Self {
            num: BigInt::from_biguint(Sign::Plus, canonical),
            den: BigInt::one(),
        }
    }
}

impl Add for &Rational {
    type Output = Rational;

    fn add(self, rhs: &Rational) -> Rational {
        let num = &self.num * &rhs.den + &rhs.num * &self.den;
        let den = &self.den * &rhs.den;
        Rational::new(num, den).unwrap_or_else(Rational::zero)
    }
}

impl Sub for &Rational {
    type Output = Rational;

    fn sub(self, rhs: &Rational) -> Rational {
        self + &(-rhs)
    }
}

impl Mul for &Rational {
    type Output = Rational;

    fn mul(self, rhs: &Rational) -> Rational {
        Rational::new(&self.num * &rhs.num, &self.den * &rhs.den).unwrap_or_else(Rational::zero)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational {
            num: -&self.num,
            den: self.den.clone(),
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.is_one() {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field::from_u64;

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(BigInt::from(n), BigInt::from(d)).unwrap()
    }

    #[test]
    fn reduced_with_positive_denominator() {
        let v = r(6, -4);
        assert_eq!(v.numer(), &BigInt::from(-3));
        assert_eq!(v.denom(), &BigInt::from(2));
        assert_eq!(v.to_string(), "-3/2");
    }

    #[test]
    fn zero_denominator_is_rejected() {
        assert!(Rational::new(BigInt::from(1), BigInt::zero()).is_none());
        assert!(Rational::zero().recip().is_none());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(&r(1, 2) + &r(1, 3), r(5, 6));
        assert_eq!(&r(1, 2) - &r(1, 2), Rational::zero());
        assert_eq!(&r(2, 3) * &r(3, 4), r(1, 2));
        assert_eq!(r(2, 3).checked_div(&r(4, 9)), Some(r(3, 2)));
        assert_eq!(-&r(1, 2), r(-1, 2));
    }

    #[test]
    fn field_value_of_fraction() {
        let half = r(1, 2);
        assert_eq!(half.to_field() * from_u64(2), from_u64(1));
        assert_eq!(r(10, 5).to_field(), from_u64(2));
        assert_eq!(r(-1, 1).to_field(), -from_u64(1));
    }

    #[test]
    fn multiples_of_the_modulus_have_no_inverse() {
        let p = Rational::from_biguint(modulus());
        assert!(p.recip().is_none());
    }

    #[test]
    fn gcd_of_terms() {
        assert_eq!(Rational::gcd_of(&[r(4, 1), r(6, 1)]), r(2, 1));
        assert_eq!(Rational::gcd_of(&[r(1, 2), r(1, 3)]), r(1, 6));
        assert_eq!(Rational::gcd_of(&[r(-3, 1)]), r(3, 1));
        assert_eq!(Rational::gcd_of(Vec::<Rational>::new().iter()), Rational::one());
    }

    #[test]
    fn huge_values_fold_into_the_field() {
        let big = Rational::from_integer(BigInt::one() << 2000usize);
        assert!(big.denom().is_one());
        assert!(big.numer().bits() <= 254);
        let direct = from_bigint(&(BigInt::one() << 2000usize));
        assert_eq!(big.to_field(), direct);
    }
}
