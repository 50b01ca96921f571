/// ER1CS Constraint System
///
/// Every row `i` has four linear combinations and is satisfied when
///
///   (L_i · w) * (R_i · w) + f(E_i · w) = O_i · w
///
/// where `f(e)` is the X coordinate of `G·e` for rows whose `E` is
/// non-empty and zero for plain R1CS rows.
///
/// Wire layout:
///   Slot 0      = ONE (constant wire, always 1)
///   1..=k       = circuit inputs, in declaration order
///   k+1..       = gate outputs and split bits, in emission order
use std::collections::BTreeMap;

use field::{CurveOracle, FieldElement, One};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::row::{DenseRow, SparseRow};

/// Name of the constant-one wire at slot 0.
pub const ONE_WIRE: &str = "$one";

// ============================================================================
// RowShape
// ============================================================================

/// How the witness evaluator resolves a row. Every row carries its shape
/// explicitly; the evaluator never guesses from which slot is missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowShape {
    /// `target` is the only unknown and sits on `O`.
    Forward { target: usize },
    /// `target` is the only unknown and sits on `L` (division rows).
    Inverse { target: usize },
    /// `target` is bit `position` of the already known `source` wire.
    BitDecompose {
        target: usize,
        source: usize,
        position: usize,
    },
    /// All slots are known; the row is only checked.
    Check,
    /// `random` is sampled, then `target` is solved on `O`.
    Blinding { random: usize, target: usize },
}

// ============================================================================
// WireIndex
// ============================================================================

/// Bidirectional wire name ↔ slot map.
#[derive(Clone, Debug, Default)]
pub struct WireIndex {
    names: Vec<String>,
    slots: FxHashMap<String, usize>,
}

impl WireIndex {
    pub fn new() -> Self {
        let mut index = Self::default();
        index.names.push(ONE_WIRE.to_string());
        index.slots.insert(ONE_WIRE.to_string(), 0);
        index
    }

    /// Assign the next slot to `name`. Returns `None` if the name already
    /// has a slot.
    pub fn insert(&mut self, name: &str) -> Option<usize> {
        if self.slots.contains_key(name) {
            return None;
        }
        let slot = self.names.len();
        self.names.push(name.to_string());
        self.slots.insert(name.to_string(), slot);
        Some(slot)
    }

    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn name(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in slot order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

// ============================================================================
// ConstraintSystem
// ============================================================================

/// Borrowed view of one row across the four parallel lists.
#[derive(Clone, Copy, Debug)]
pub struct RowRef<'a> {
    pub l: &'a SparseRow,
    pub r: &'a SparseRow,
    pub e: &'a SparseRow,
    pub o: &'a SparseRow,
    pub shape: RowShape,
}

impl RowRef<'_> {
    /// `(L·w)(R·w) + f(E·w) - O·w`
    pub fn residual(&self, witness: &[FieldElement], oracle: &dyn CurveOracle) -> FieldElement {
        let mut lhs = self.l.evaluate(witness) * self.r.evaluate(witness);
        if !self.e.is_empty() {
            lhs += oracle.base_mult_x(&self.e.evaluate(witness));
        }
        lhs - self.o.evaluate(witness)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConstraintSystem {
    l: Vec<SparseRow>,
    r: Vec<SparseRow>,
    e: Vec<SparseRow>,
    o: Vec<SparseRow>,
    shapes: Vec<RowShape>,
    wires: WireIndex,
    inputs: Vec<String>,
    outputs: Vec<String>,
    split_map: BTreeMap<String, Vec<usize>>,
    blinding: Option<(usize, usize)>,
}

impl ConstraintSystem {
    pub fn new() -> Self {
        Self {
            wires: WireIndex::new(),
            ..Self::default()
        }
    }

    // --- Wire allocation ---

    /// Allocate a circuit input. Inputs must be allocated before any
    /// internal wire.
    pub fn alloc_input(&mut self, name: &str) -> Option<usize> {
        let slot = self.wires.insert(name)?;
        self.inputs.push(name.to_string());
        Some(slot)
    }

    /// Allocate an internal wire (gate output, split bit, blinding wire).
    pub fn alloc_wire(&mut self, name: &str) -> Option<usize> {
        self.wires.insert(name)
    }

    pub fn mark_output(&mut self, name: &str) {
        self.outputs.push(name.to_string());
    }

    pub fn record_split(&mut self, name: &str, bit_slots: Vec<usize>) {
        self.split_map.insert(name.to_string(), bit_slots);
    }

    pub fn set_blinding(&mut self, random: usize, target: usize) {
        self.blinding = Some((random, target));
    }

    // --- Rows ---

    pub fn push_row(
        &mut self,
        l: SparseRow,
        r: SparseRow,
        e: SparseRow,
        o: SparseRow,
        shape: RowShape,
    ) -> usize {
        self.l.push(l);
        self.r.push(r);
        self.e.push(e);
        self.o.push(o);
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    // --- Queries ---

    pub fn num_rows(&self) -> usize {
        self.shapes.len()
    }

    pub fn num_wires(&self) -> usize {
        self.wires.len()
    }

    pub fn row(&self, i: usize) -> RowRef<'_> {
        RowRef {
            l: &self.l[i],
            r: &self.r[i],
            e: &self.e[i],
            o: &self.o[i],
            shape: self.shapes[i],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        (0..self.num_rows()).map(|i| self.row(i))
    }

    pub fn l_rows(&self) -> &[SparseRow] {
        &self.l
    }

    pub fn r_rows(&self) -> &[SparseRow] {
        &self.r
    }

    pub fn e_rows(&self) -> &[SparseRow] {
        &self.e
    }

    pub fn o_rows(&self) -> &[SparseRow] {
        &self.o
    }

    pub fn shapes(&self) -> &[RowShape] {
        &self.shapes
    }

    pub fn wires(&self) -> &WireIndex {
        &self.wires
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.wires.slot(name)
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn split_map(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.split_map
    }

    pub fn blinding(&self) -> Option<(usize, usize)> {
        self.blinding
    }

    /// Rows with a non-empty `E` list.
    pub fn num_exponent_rows(&self) -> usize {
        self.e.iter().filter(|row| !row.is_empty()).count()
    }

    // --- Encodings ---

    /// Dense encoding: every row as a coefficient vector of `num_wires()`.
    pub fn to_dense(&self) -> DenseSystem {
        let width = self.num_wires();
        let dense = |rows: &[SparseRow]| -> Vec<DenseRow> {
            rows.iter().map(|row| row.to_dense(width)).collect()
        };
        DenseSystem {
            width,
            l: dense(&self.l),
            r: dense(&self.r),
            e: dense(&self.e),
            o: dense(&self.o),
        }
    }

    // --- Verification ---

    /// Verify that a witness satisfies all rows.
    ///
    /// Returns the index of the first failing row, or `usize::MAX` when the
    /// witness has the wrong length or slot 0 is not one.
    pub fn verify(&self, witness: &[FieldElement], oracle: &dyn CurveOracle) -> Result<(), usize> {
        if witness.len() != self.num_wires() || witness[0] != FieldElement::one() {
            return Err(usize::MAX);
        }
        for (i, row) in self.rows().enumerate() {
            if !field::Zero::is_zero(&row.residual(witness, oracle)) {
                return Err(i);
            }
        }
        Ok(())
    }
}

/// Dense form of a constraint system's rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseSystem {
    pub width: usize,
    pub l: Vec<DenseRow>,
    pub r: Vec<DenseRow>,
    pub e: Vec<DenseRow>,
    pub o: Vec<DenseRow>,
}

impl DenseSystem {
    pub fn num_rows(&self) -> usize {
        self.l.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use field::{from_u64, Bn254G1Oracle};

    fn product_system() -> ConstraintSystem {
        // x * z = out
        let mut cs = ConstraintSystem::new();
        let x = cs.alloc_input("x").unwrap();
        let z = cs.alloc_input("z").unwrap();
        let out = cs.alloc_wire("$w0").unwrap();
        cs.push_row(
            SparseRow::single(x, from_u64(1)),
            SparseRow::single(z, from_u64(1)),
            SparseRow::new(),
            SparseRow::single(out, from_u64(1)),
            RowShape::Forward { target: out },
        );
        cs.mark_output("$w0");
        cs
    }

    #[test]
    fn layout_reserves_slot_zero() {
        let cs = product_system();
        assert_eq!(cs.slot_of(ONE_WIRE), Some(0));
        assert_eq!(cs.slot_of("x"), Some(1));
        assert_eq!(cs.slot_of("z"), Some(2));
        assert_eq!(cs.slot_of("$w0"), Some(3));
        assert_eq!(cs.wires().name(3), Some("$w0"));
        assert_eq!(cs.inputs(), ["x", "z"]);
    }

    #[test]
    fn duplicate_wire_is_rejected() {
        let mut cs = product_system();
        assert_eq!(cs.alloc_wire("x"), None);
        assert_eq!(cs.alloc_input("$w0"), None);
    }

    #[test]
    fn verify_finds_failing_row() {
        let cs = product_system();
        let good = [from_u64(1), from_u64(3), from_u64(4), from_u64(12)];
        assert_eq!(cs.verify(&good, &Bn254G1Oracle), Ok(()));
        let bad = [from_u64(1), from_u64(3), from_u64(4), from_u64(13)];
        assert_eq!(cs.verify(&bad, &Bn254G1Oracle), Err(0));
        assert_eq!(cs.verify(&good[..3], &Bn254G1Oracle), Err(usize::MAX));
    }

    #[test]
    fn exponent_rows_use_the_oracle() {
        // f(e) = out, with e = 1 so out = x(G) = 1
        let mut cs = ConstraintSystem::new();
        let e = cs.alloc_input("e").unwrap();
        let out = cs.alloc_wire("$w0").unwrap();
        cs.push_row(
            SparseRow::new(),
            SparseRow::new(),
            SparseRow::single(e, from_u64(1)),
            SparseRow::single(out, from_u64(1)),
            RowShape::Forward { target: out },
        );
        assert_eq!(cs.num_exponent_rows(), 1);
        let w = [from_u64(1), from_u64(1), from_u64(1)];
        assert_eq!(cs.verify(&w, &Bn254G1Oracle), Ok(()));
    }

    #[test]
    fn dense_matches_sparse() {
        let cs = product_system();
        let dense = cs.to_dense();
        assert_eq!(dense.width, 4);
        assert_eq!(dense.num_rows(), 1);
        for i in 0..cs.num_rows() {
            assert_eq!(dense.l[i].to_sparse(), cs.l_rows()[i]);
            assert_eq!(dense.r[i].to_sparse(), cs.r_rows()[i]);
            assert_eq!(dense.e[i].to_sparse(), cs.e_rows()[i]);
            assert_eq!(dense.o[i].to_sparse(), cs.o_rows()[i]);
        }
    }
}
