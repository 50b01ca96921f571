//! Fixed-base scalar multiplication oracle.
//!
//! Exponentiation rows of an ER1CS system are satisfied when
//! `(L·w)(R·w) + f(E·w) = O·w`, where `f(e)` is the X coordinate of `G·e`
//! for a fixed generator `G`. The compiler never touches curve points; it
//! only asks an oracle for `f`.

use ark_ec::{CurveGroup, PrimeGroup};
use ark_ff::{BigInteger, PrimeField};
use ark_std::Zero;

use crate::element::FieldElement;

/// External curve operation consumed by the witness evaluator.
pub trait CurveOracle {
    /// X coordinate of `generator · exponent`, mapped into the scalar field.
    /// The point at infinity maps to zero.
    fn base_mult_x(&self, exponent: &FieldElement) -> FieldElement;
}

/// BN254 G1 with its standard generator `(1, 2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bn254G1Oracle;

impl CurveOracle for Bn254G1Oracle {
    fn base_mult_x(&self, exponent: &FieldElement) -> FieldElement {
        let point = (ark_bn254::G1Projective::generator() * exponent).into_affine();
        if point.infinity {
            return FieldElement::zero();
        }
        FieldElement::from_le_bytes_mod_order(&point.x.into_bigint().to_bytes_le())
    }
}

impl<T: CurveOracle + ?Sized> CurveOracle for &T {
    fn base_mult_x(&self, exponent: &FieldElement) -> FieldElement {
        (**self).base_mult_x(exponent)
    }
}
