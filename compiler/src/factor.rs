/// Symbolic terms: the values the reducer passes around before anything is
/// committed to a gate.
///
/// A `FactorList` is a sum Σ coefficient_i · reference_i where each
/// reference is either the constant one or a named wire. Additions and
/// scalings stay symbolic; only products of two non-constant lists (and a
/// few builtins) ever become gates.
use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::rational::Rational;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    One,
    Wire(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Factor {
    pub reference: Reference,
    pub coefficient: Rational,
}

/// Terms sorted by reference, used for hashing and gate keys.
pub type CanonicalTerms = Vec<(Reference, Rational)>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactorList {
    terms: Vec<Factor>,
}

impl FactorList {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(Rational::one())
    }

    pub fn constant(value: Rational) -> Self {
        Self::from_terms(vec![Factor {
            reference: Reference::One,
            coefficient: value,
        }])
    }

    /// `1 · wire`
    pub fn wire(name: impl Into<String>) -> Self {
        Self::from_terms(vec![Factor {
            reference: Reference::Wire(name.into()),
            coefficient: Rational::one(),
        }])
    }

    pub fn from_terms(terms: Vec<Factor>) -> Self {
        Self { terms }.normalize()
    }

    pub fn terms(&self) -> &[Factor] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True when no term references a wire.
    pub fn is_constant(&self) -> bool {
        self.terms
            .iter()
            .all(|f| f.reference == Reference::One)
    }

    /// True when the value depends on at least one wire.
    pub fn is_variable(&self) -> bool {
        !self.is_constant()
    }

    /// The folded value of a constant list.
    pub fn constant_value(&self) -> Option<Rational> {
        if !self.is_constant() {
            return None;
        }
        Some(
            self.terms
                .iter()
                .fold(Rational::zero(), |acc, f| &acc + &f.coefficient),
        )
    }

    /// If this list is exactly `1 · wire`, that wire's name.
    pub fn as_unit_wire(&self) -> Option<&str> {
        match self.terms.as_slice() {
            [Factor {
                reference: Reference::Wire(name),
                coefficient,
            }] if coefficient.is_one() => Some(name.as_str()),
            _ => None,
        }
    }

    /// Wires referenced, in term order.
    pub fn wires(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|f| match &f.reference {
            Reference::Wire(name) => Some(name.as_str()),
            Reference::One => None,
        })
    }

    // --- Algebra ---

    /// Merge terms with the same reference and drop terms that are zero in
    /// the field. The first occurrence of each reference keeps its position.
    pub fn normalize(self) -> Self {
        let mut merged: Vec<Factor> = Vec::with_capacity(self.terms.len());
        for factor in self.terms {
            match merged.iter_mut().find(|f| f.reference == factor.reference) {
                Some(existing) => {
                    existing.coefficient = &existing.coefficient + &factor.coefficient
                }
                None => merged.push(factor),
            }
        }
        merged.retain(|f| !f.coefficient.vanishes());
        Self { terms: merged }
    }

    pub fn add(&self, other: &FactorList) -> FactorList {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Self::from_terms(terms)
    }

    pub fn sub(&self, other: &FactorList) -> FactorList {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> FactorList {
        self.scale(&Rational::from_i64(-1))
    }

    /// Multiply every term by `scalar`.
    pub fn scale(&self, scalar: &Rational) -> FactorList {
        Self::from_terms(
            self.terms
                .iter()
                .map(|f| Factor {
                    reference: f.reference.clone(),
                    coefficient: &f.coefficient * scalar,
                })
                .collect(),
        )
    }

    /// Factor out the greatest common rational scalar.
    ///
    /// Returns `(stripped, scalar)` with `stripped.scale(scalar) == self`.
    /// The stripped coefficients are coprime integers and the canonically
    /// first term is positive, so lists that differ only by a scalar share
    /// the same stripped form.
    pub fn extract_constant(&self) -> (FactorList, Rational) {
        if self.terms.is_empty() {
            return (self.clone(), Rational::one());
        }
        let mut scalar = Rational::gcd_of(self.terms.iter().map(|f| &f.coefficient));
        let leading = self
            .terms
            .iter()
            .min_by(|a, b| a.reference.cmp(&b.reference))
            .map(|f| f.coefficient.is_negative())
            .unwrap_or(false);
        if leading {
            scalar = -&scalar;
        }
        let inverse = scalar.recip().unwrap_or_else(Rational::one);
        (self.scale(&inverse), scalar)
    }

    pub fn canonical_terms(&self) -> CanonicalTerms {
        let mut terms: CanonicalTerms = self
            .terms
            .iter()
            .map(|f| (f.reference.clone(), f.coefficient.clone()))
            .collect();
        terms.sort();
        terms
    }
}

/// The two operands of a product in canonical form: each scalar-stripped
/// and sorted, and the pair itself ordered.
pub fn canonical_pair(a: &FactorList, b: &FactorList) -> [CanonicalTerms; 2] {
    let mut pair = [
        a.extract_constant().0.canonical_terms(),
        b.extract_constant().0.canonical_terms(),
    ];
    pair.sort();
    pair
}

/// Order- and scale-independent hash of a product's operands:
/// `signature(a, b) == signature(b, a)` and `signature(k·a, b) == signature(a, b)`.
pub fn signature(a: &FactorList, b: &FactorList) -> u64 {
    let mut hasher = FxHasher::default();
    canonical_pair(a, b).hash(&mut hasher);
    hasher.finish()
}

impl fmt::Display for FactorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, factor) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            match &factor.reference {
                Reference::One => write!(f, "{}", factor.coefficient)?,
                Reference::Wire(name) => write!(f, "{}·{}", factor.coefficient, name)?,
            }
        }
        Ok(())
    }
}
