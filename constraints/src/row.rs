/// Constraint rows.
///
/// A row is a linear combination Σ(coefficient_i · w[slot_i]) over the
/// witness vector. Rows are stored sparsely in slot order; the dense form
/// is a full-width coefficient vector. Both expose the same non-zero
/// `(slot, coefficient)` pairs.
use std::collections::BTreeMap;

use field::{FieldElement, Zero};

// ============================================================================
// SparseRow
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SparseRow {
    terms: BTreeMap<usize, FieldElement>,
}

impl SparseRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// `coeff · w[slot]`
    pub fn single(slot: usize, coeff: FieldElement) -> Self {
        let mut row = Self::new();
        row.add_term(slot, coeff);
        row
    }

    /// Add `coeff · w[slot]`, accumulating onto an existing term for the
    /// same slot. Terms that cancel to zero are removed.
    pub fn add_term(&mut self, slot: usize, coeff: FieldElement) {
        let entry = self.terms.entry(slot).or_insert_with(FieldElement::zero);
        *entry += coeff;
        if entry.is_zero() {
            self.terms.remove(&slot);
        }
    }

    pub fn get(&self, slot: usize) -> FieldElement {
        self.terms.get(&slot).copied().unwrap_or_else(FieldElement::zero)
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.terms.contains_key(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Non-zero terms in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, FieldElement)> + '_ {
        self.terms.iter().map(|(slot, coeff)| (*slot, *coeff))
    }

    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.terms.keys().copied()
    }

    /// Evaluate against a complete witness.
    pub fn evaluate(&self, witness: &[FieldElement]) -> FieldElement {
        self.iter()
            .map(|(slot, coeff)| coeff * witness[slot])
            .fold(FieldElement::zero(), |acc, term| acc + term)
    }

    /// Evaluate every term except `skip` against a partial assignment.
    /// Returns the first unresolved slot on failure.
    pub fn evaluate_without(
        &self,
        values: &[Option<FieldElement>],
        skip: Option<usize>,
    ) -> Result<FieldElement, usize> {
        let mut sum = FieldElement::zero();
        for (slot, coeff) in self.iter() {
            if Some(slot) == skip {
                continue;
            }
            match values.get(slot).copied().flatten() {
                Some(value) => sum += coeff * value,
                None => return Err(slot),
            }
        }
        Ok(sum)
    }

    pub fn to_dense(&self, width: usize) -> DenseRow {
        let mut coeffs = vec![FieldElement::zero(); width];
        for (slot, coeff) in self.iter() {
            coeffs[slot] = coeff;
        }
        DenseRow { coeffs }
    }
}

impl FromIterator<(usize, FieldElement)> for SparseRow {
    fn from_iter<I: IntoIterator<Item = (usize, FieldElement)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (slot, coeff) in iter {
            row.add_term(slot, coeff);
        }
        row
    }
}

// ============================================================================
// DenseRow
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseRow {
    coeffs: Vec<FieldElement>,
}

impl DenseRow {
    pub fn width(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coefficients(&self) -> &[FieldElement] {
        &self.coeffs
    }

    /// Non-zero entries as `(slot, coefficient)` pairs in slot order.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (usize, FieldElement)> + '_ {
        self.coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(slot, c)| (slot, *c))
    }

    pub fn evaluate(&self, witness: &[FieldElement]) -> FieldElement {
        self.iter_nonzero()
            .map(|(slot, coeff)| coeff * witness[slot])
            .fold(FieldElement::zero(), |acc, term| acc + term)
    }

    pub fn to_sparse(&self) -> SparseRow {
        self.iter_nonzero().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field::from_u64;
    use proptest::prelude::*;

    #[test]
    fn repeated_slots_accumulate() {
        let mut row = SparseRow::new();
        row.add_term(2, from_u64(3));
        row.add_term(2, from_u64(4));
        assert_eq!(row.get(2), from_u64(7));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn cancelled_terms_disappear() {
        let mut row = SparseRow::new();
        row.add_term(1, from_u64(5));
        row.add_term(1, -from_u64(5));
        assert!(row.is_empty());
        assert!(!row.contains(1));
    }

    #[test]
    fn dense_and_sparse_agree() {
        let row: SparseRow = [(0, from_u64(1)), (3, from_u64(9)), (1, from_u64(2))]
            .into_iter()
            .collect();
        let dense = row.to_dense(5);
        assert_eq!(dense.width(), 5);
        assert_eq!(
            dense.iter_nonzero().collect::<Vec<_>>(),
            row.iter().collect::<Vec<_>>()
        );
        assert_eq!(dense.to_sparse(), row);

        let w = [from_u64(1), from_u64(2), from_u64(0), from_u64(3), from_u64(7)];
        assert_eq!(row.evaluate(&w), from_u64(1 + 4 + 27));
        assert_eq!(dense.evaluate(&w), row.evaluate(&w));
    }

    #[test]
    fn partial_evaluation_reports_unknown() {
        let row: SparseRow = [(1, from_u64(2)), (2, from_u64(3))].into_iter().collect();
        let values = vec![Some(from_u64(1)), Some(from_u64(5)), None];
        assert_eq!(row.evaluate_without(&values, None), Err(2));
        assert_eq!(row.evaluate_without(&values, Some(2)), Ok(from_u64(10)));
    }

    proptest! {
        #[test]
        fn dense_round_trip_preserves_evaluation(
            terms in proptest::collection::vec((0usize..8, 0u64..1000), 0..12),
            values in proptest::collection::vec(0u64..1000, 8),
        ) {
            let row: SparseRow = terms.iter().map(|&(slot, c)| (slot, from_u64(c))).collect();
            let dense = row.to_dense(8);
            let w: Vec<FieldElement> = values.iter().copied().map(from_u64).collect();
            prop_assert_eq!(dense.to_sparse(), row.clone());
            prop_assert_eq!(dense.evaluate(&w), row.evaluate(&w));
        }
    }
}
