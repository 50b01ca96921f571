/// BN254 Scalar Field (Fr) conversions
///
/// p = 21888242871839275222246405745257275088548364400416034343698204186575808495617
///
/// The element type itself is arkworks' `Fr`. Everything here converts
/// between `Fr` and the integer representations the compiler works with.
use ark_ff::{BigInteger, PrimeField};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Num, Zero};

pub type FieldElement = ark_bn254::Fr;

// ============================================================================
// Modulus
// ============================================================================

/// The prime modulus p as an arbitrary precision integer.
pub fn modulus() -> BigUint {
    BigUint::from_bytes_le(&FieldElement::MODULUS.to_bytes_le())
}

/// Number of bits needed to represent p (254 for BN254).
///
/// This is the width of every `split` decomposition.
pub fn modulus_bit_size() -> usize {
    FieldElement::MODULUS_BIT_SIZE as usize
}

// ============================================================================
// Conversions
// ============================================================================

pub fn from_u64(value: u64) -> FieldElement {
    FieldElement::from(value)
}

/// Reduce a non-negative integer into the field.
pub fn from_biguint(value: &BigUint) -> FieldElement {
    FieldElement::from_le_bytes_mod_order(&value.to_bytes_le())
}

/// Reduce a signed integer into the field. Negative values map to `p - |v|`.
pub fn from_bigint(value: &BigInt) -> FieldElement {
    let (sign, magnitude) = value.to_bytes_le();
    let reduced = FieldElement::from_le_bytes_mod_order(&magnitude);
    match sign {
        Sign::Minus => -reduced,
        _ => reduced,
    }
}

/// Canonical representative in `[0, p)`.
pub fn to_biguint(value: &FieldElement) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

pub fn to_decimal_string(value: &FieldElement) -> String {
    to_biguint(value).to_str_radix(10)
}

/// Number of significant bits of the canonical representative.
pub fn bit_length(value: &FieldElement) -> usize {
    to_biguint(value).bits() as usize
}

/// Parse a field element from text: decimal, `0x` hex, with an optional
/// leading `-`. Values are reduced modulo p.
pub fn parse_field(text: &str) -> Option<FieldElement> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        BigUint::from_str_radix(hex, 16).ok()?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        BigUint::from_str_radix(digits, 10).ok()?
    };
    let value = from_biguint(&magnitude);
    if negative && !magnitude.is_zero() {
        Some(-value)
    } else {
        Some(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::{One, UniformRand, Zero as _};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn modulus_matches_known_constant() {
        let expected = BigUint::from_str_radix(
            "21888242871839275222246405745257275088548364400416034343698204186575808495617",
            10,
        )
        .unwrap();
        assert_eq!(modulus(), expected);
        assert_eq!(modulus_bit_size(), 254);
    }

    #[test]
    fn negative_integers_wrap_around() {
        let minus_one = from_bigint(&BigInt::from(-1));
        assert_eq!(minus_one + FieldElement::one(), FieldElement::zero());
        assert_eq!(to_biguint(&minus_one), modulus() - 1u32);
    }

    #[test]
    fn parse_decimal_hex_and_negative() {
        assert_eq!(parse_field("42"), Some(from_u64(42)));
        assert_eq!(parse_field("0x2a"), Some(from_u64(42)));
        assert_eq!(parse_field("-3"), Some(-from_u64(3)));
        assert_eq!(parse_field("-0"), Some(FieldElement::zero()));
        assert_eq!(parse_field(""), None);
        assert_eq!(parse_field("4x"), None);
        assert_eq!(parse_field("+4"), None);
    }

    #[test]
    fn values_above_modulus_are_reduced() {
        let p_plus_five = modulus() + 5u32;
        assert_eq!(from_biguint(&p_plus_five), from_u64(5));
    }

    #[test]
    fn bit_length_of_small_values() {
        assert_eq!(bit_length(&FieldElement::zero()), 0);
        assert_eq!(bit_length(&from_u64(1)), 1);
        assert_eq!(bit_length(&from_u64(255)), 8);
        assert_eq!(bit_length(&from_u64(256)), 9);
        assert_eq!(bit_length(&-FieldElement::one()), 254);
    }

    #[test]
    fn decimal_string_is_canonical() {
        assert_eq!(to_decimal_string(&from_u64(12)), "12");
        assert_eq!(to_decimal_string(&FieldElement::zero()), "0");
    }

    proptest! {
        #[test]
        fn canonical_form_round_trips(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let x = FieldElement::rand(&mut rng);
            prop_assert_eq!(from_biguint(&to_biguint(&x)), x);
            prop_assert_eq!(parse_field(&to_decimal_string(&x)), Some(x));
            prop_assert!(bit_length(&x) <= modulus_bit_size());
        }

        #[test]
        fn negative_integers_wrap(v in 1i64..i64::MAX) {
            prop_assert_eq!(from_bigint(&BigInt::from(-v)), -from_bigint(&BigInt::from(v)));
        }
    }
}
