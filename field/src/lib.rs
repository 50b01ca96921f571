//! Field and curve boundary for ercs.
//!
//! Circuits are built over the BN254 scalar field. Arithmetic comes from
//! arkworks; this crate only adds the conversions the compiler and the
//! witness evaluator need (big integers, decimal text, bit length) and the
//! fixed-base scalar multiplication oracle used by exponentiation rows.

pub mod curve;
pub mod element;

pub use curve::{Bn254G1Oracle, CurveOracle};
pub use element::{
    bit_length, from_bigint, from_biguint, from_u64, modulus, modulus_bit_size, parse_field,
    to_biguint, to_decimal_string, FieldElement,
};

pub use ark_ff::{Field, PrimeField};
pub use ark_std::{One, UniformRand, Zero};
