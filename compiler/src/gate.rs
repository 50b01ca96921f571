/// Gates and the deduplicating gate container.
///
/// A gate keeps its four operand lists in the same positions they occupy
/// in the lowered row (`left → L`, `right → R`, `exponent → E`,
/// `output → O`), so lowering is a straight scatter.
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::factor::{canonical_pair, CanonicalTerms, FactorList, Reference};
use crate::rational::Rational;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// `left · right = out`
    Multiply,
    /// `out · divisor = dividend`, stored as `left = [out]`.
    Divide,
    /// `value · 1 = out`, completes a linear combination into a wire.
    Add,
    /// `a · 1 = b`
    EqualityAssert,
    /// `(bit - 1) · bit = 0`
    BitRangeAssert,
    /// `Σ bit_i · 2^i · 1 = z`
    BitRecombineAssert,
    /// `f(exponent) = out`
    ScalarMult,
}

/// Bit `position` of the wire `source`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitRef {
    pub source: String,
    pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gate {
    pub kind: GateKind,
    /// Digest of the gate's canonical key. Assigned on insertion.
    pub id: u64,
    pub left: FactorList,
    pub right: FactorList,
    pub exponent: FactorList,
    pub output: FactorList,
    /// Wire this gate defines.
    pub output_wire: Option<String>,
    /// Wire the gate constrains without defining a fresh output: the bit of
    /// a bit-range gate, the recombined wire of a recombine gate.
    pub aux_wire: Option<String>,
    pub bit: Option<BitRef>,
}

impl Gate {
    fn empty(kind: GateKind) -> Self {
        Self {
            kind,
            id: 0,
            left: FactorList::zero(),
            right: FactorList::zero(),
            exponent: FactorList::zero(),
            output: FactorList::zero(),
            output_wire: None,
            aux_wire: None,
            bit: None,
        }
    }

    pub fn multiply(left: FactorList, right: FactorList, out: &str) -> Self {
        Self {
            left,
            right,
            output: FactorList::wire(out),
            output_wire: Some(out.to_string()),
            ..Self::empty(GateKind::Multiply)
        }
    }

    pub fn divide(dividend: FactorList, divisor: FactorList, out: &str) -> Self {
        Self {
            left: FactorList::wire(out),
            right: divisor,
            output: dividend,
            output_wire: Some(out.to_string()),
            ..Self::empty(GateKind::Divide)
        }
    }

    pub fn add(value: FactorList, out: &str) -> Self {
        Self {
            left: value,
            right: FactorList::one(),
            output: FactorList::wire(out),
            output_wire: Some(out.to_string()),
            ..Self::empty(GateKind::Add)
        }
    }

    pub fn equality(a: FactorList, b: FactorList) -> Self {
        Self {
            left: a,
            right: FactorList::one(),
            output: b,
            ..Self::empty(GateKind::EqualityAssert)
        }
    }

    pub fn bit_range(bit: &str, source: &str, position: usize) -> Self {
        Self {
            left: FactorList::wire(bit).sub(&FactorList::one()),
            right: FactorList::wire(bit),
            aux_wire: Some(bit.to_string()),
            bit: Some(BitRef {
                source: source.to_string(),
                position,
            }),
            ..Self::empty(GateKind::BitRangeAssert)
        }
    }

    /// `bits` are ordered least significant first.
    pub fn bit_recombine(bits: &[String], z: &str) -> Self {
        let mut weight = Rational::one();
        let two = Rational::from_i64(2);
        let mut sum = FactorList::zero();
        for bit in bits {
            sum = sum.add(&FactorList::wire(bit.as_str()).scale(&weight));
            weight = &weight * &two;
        }
        Self {
            left: sum,
            right: FactorList::one(),
            output: FactorList::wire(z),
            aux_wire: Some(z.to_string()),
            ..Self::empty(GateKind::BitRecombineAssert)
        }
    }

    pub fn scalar_mult(exponent: FactorList, out: &str) -> Self {
        Self {
            exponent,
            output: FactorList::wire(out),
            output_wire: Some(out.to_string()),
            ..Self::empty(GateKind::ScalarMult)
        }
    }

    pub fn produces_output(&self) -> bool {
        self.output_wire.is_some()
    }
}

// ============================================================================
// GateKey
// ============================================================================

/// Full canonical form of a gate's inputs. Two gates with equal keys
/// compute the same thing, so only the first is kept.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GateKey {
    kind: GateKind,
    operands: Vec<CanonicalTerms>,
}

impl GateKey {
    /// Operands are expected scalar-stripped; order does not matter.
    pub fn multiply(a: &FactorList, b: &FactorList) -> Self {
        Self {
            kind: GateKind::Multiply,
            operands: canonical_pair(a, b).to_vec(),
        }
    }

    pub fn divide(dividend: &FactorList, divisor: &FactorList) -> Self {
        Self {
            kind: GateKind::Divide,
            operands: vec![dividend.canonical_terms(), divisor.canonical_terms()],
        }
    }

    pub fn add(value: &FactorList) -> Self {
        Self {
            kind: GateKind::Add,
            operands: vec![value.canonical_terms()],
        }
    }

    pub fn equality(a: &FactorList, b: &FactorList) -> Self {
        let mut operands = vec![a.canonical_terms(), b.canonical_terms()];
        operands.sort();
        Self {
            kind: GateKind::EqualityAssert,
            operands,
        }
    }

    pub fn bit_range(bit: &str) -> Self {
        Self::single_wire(GateKind::BitRangeAssert, bit)
    }

    pub fn bit_recombine(z: &str) -> Self {
        Self::single_wire(GateKind::BitRecombineAssert, z)
    }

    pub fn scalar_mult(exponent: &FactorList) -> Self {
        Self {
            kind: GateKind::ScalarMult,
            operands: vec![exponent.canonical_terms()],
        }
    }

    fn single_wire(kind: GateKind, wire: &str) -> Self {
        Self {
            kind,
            operands: vec![vec![(
                Reference::Wire(wire.to_string()),
                Rational::one(),
            )]],
        }
    }

    pub fn kind(&self) -> GateKind {
        self.kind
    }

    pub fn digest(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

// ============================================================================
// GateContainer
// ============================================================================

/// Gates in emission order, at most one per canonical key.
#[derive(Clone, Debug, Default)]
pub struct GateContainer {
    gates: Vec<Gate>,
    index: FxHashMap<GateKey, usize>,
}

impl GateContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, key: &GateKey) -> Option<&Gate> {
        self.index.get(key).map(|&i| &self.gates[i])
    }

    /// Append `gate` under `key` and return its position. If a gate with the
    /// same key exists, nothing is added and the existing position is
    /// returned.
    pub fn insert(&mut self, key: GateKey, mut gate: Gate) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        gate.id = key.digest();
        let i = self.gates.len();
        self.gates.push(gate);
        self.index.insert(key, i);
        i
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn into_gates(self) -> Vec<Gate> {
        self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn count(&self, kind: GateKind) -> usize {
        self.gates.iter().filter(|g| g.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(name: &str, coeff: i64) -> FactorList {
        FactorList::wire(name).scale(&Rational::from_i64(coeff))
    }

    #[test]
    fn multiply_key_is_order_independent() {
        let x = w("x", 1);
        let y = w("y", 1).add(&FactorList::one());
        assert_eq!(GateKey::multiply(&x, &y), GateKey::multiply(&y, &x));
        assert_eq!(
            GateKey::multiply(&x, &y).digest(),
            GateKey::multiply(&y, &x).digest()
        );
    }

    #[test]
    fn divide_key_is_ordered() {
        let x = w("x", 1);
        let y = w("y", 1);
        assert_ne!(GateKey::divide(&x, &y), GateKey::divide(&y, &x));
    }

    #[test]
    fn container_deduplicates() {
        let mut gates = GateContainer::new();
        let x = w("x", 1);
        let first = gates.insert(GateKey::multiply(&x, &x), Gate::multiply(x.clone(), x.clone(), "$w0"));
        let second = gates.insert(GateKey::multiply(&x, &x), Gate::multiply(x.clone(), x.clone(), "$w1"));
        assert_eq!(first, second);
        assert_eq!(gates.len(), 1);
        assert_eq!(gates.gates()[0].output_wire.as_deref(), Some("$w0"));
        assert_eq!(gates.gates()[0].id, GateKey::multiply(&x, &x).digest());
    }

    #[test]
    fn assertion_gates_have_no_output() {
        let eq = Gate::equality(w("x", 1), w("y", 1));
        assert!(!eq.produces_output());
        let bit = Gate::bit_range("$w1", "z", 0);
        assert!(!bit.produces_output());
        assert_eq!(bit.aux_wire.as_deref(), Some("$w1"));
        assert!(Gate::add(w("x", 2), "$w2").produces_output());
    }

    #[test]
    fn recombine_weights_are_powers_of_two() {
        let bits: Vec<String> = (0..3).map(|i| format!("b{i}")).collect();
        let gate = Gate::bit_recombine(&bits, "z");
        let weights: Vec<String> = gate
            .left
            .terms()
            .iter()
            .map(|f| f.coefficient.to_string())
            .collect();
        assert_eq!(weights, ["1", "2", "4"]);
        assert_eq!(gate.output, FactorList::wire("z"));
    }
}
