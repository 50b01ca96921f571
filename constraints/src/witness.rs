/// Witness evaluation for ER1CS constraint systems.
///
/// Rows are replayed in order. Each row's `RowShape` names the slot it
/// resolves; every other slot the row references must already be known.
/// After a row is resolved it is checked, so a witness that evaluates
/// successfully always satisfies the system.
use std::collections::HashMap;

use field::{to_biguint, CurveOracle, Field, FieldElement, One, UniformRand, Zero};
use rand::{rngs::OsRng, Rng};
use thiserror::Error;

use crate::system::{ConstraintSystem, RowRef, RowShape};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WitnessError {
    #[error("missing value for input `{name}`")]
    MissingInput { name: String },
    #[error("`{name}` is not an input of this circuit")]
    UnknownInput { name: String },
    #[error("row {row}: slot {slot} is unresolved and is not the row's target")]
    AmbiguousUnknown { row: usize, slot: usize },
    #[error("row {row}: target slot {slot} is already resolved")]
    AlreadyResolved { row: usize, slot: usize },
    #[error("row {row}: division by zero")]
    DivisionByZero { row: usize },
    #[error("row {row}: constraint not satisfied")]
    ConstraintViolated { row: usize },
    #[error("wire `{name}` (slot {slot}) was never resolved")]
    UnresolvedWire { slot: usize, name: String },
}

/// A complete, satisfying assignment. Slot 0 holds one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    values: Vec<FieldElement>,
}

impl Witness {
    pub fn values(&self) -> &[FieldElement] {
        &self.values
    }

    pub fn get(&self, slot: usize) -> Option<FieldElement> {
        self.values.get(slot).copied()
    }

    /// Value of a named wire.
    pub fn value_of(&self, cs: &ConstraintSystem, name: &str) -> Option<FieldElement> {
        cs.slot_of(name).and_then(|slot| self.get(slot))
    }

    /// Values of the circuit outputs, in declaration order.
    pub fn outputs(&self, cs: &ConstraintSystem) -> Vec<FieldElement> {
        cs.outputs()
            .iter()
            .filter_map(|name| self.value_of(cs, name))
            .collect()
    }
}

/// Evaluate a witness, drawing blinding values from the OS rng.
pub fn evaluate(
    cs: &ConstraintSystem,
    inputs: &HashMap<String, FieldElement>,
    oracle: &dyn CurveOracle,
) -> Result<Witness, WitnessError> {
    evaluate_with_rng(cs, inputs, oracle, &mut OsRng)
}

pub fn evaluate_with_rng<R: Rng + ?Sized>(
    cs: &ConstraintSystem,
    inputs: &HashMap<String, FieldElement>,
    oracle: &dyn CurveOracle,
    rng: &mut R,
) -> Result<Witness, WitnessError> {
    let _span = tracing::debug_span!("witness", rows = cs.num_rows(), wires = cs.num_wires())
        .entered();

    for name in inputs.keys() {
        if !cs.inputs().contains(name) {
            return Err(WitnessError::UnknownInput { name: name.clone() });
        }
    }

    let mut values: Vec<Option<FieldElement>> = vec![None; cs.num_wires()];
    values[0] = Some(FieldElement::one());
    for name in cs.inputs() {
        let value = inputs
            .get(name)
            .ok_or_else(|| WitnessError::MissingInput { name: name.clone() })?;
        if let Some(slot) = cs.slot_of(name) {
            values[slot] = Some(*value);
        }
    }

    for (i, row) in cs.rows().enumerate() {
        resolve_row(i, &row, &mut values, oracle, rng)?;
        check_row(i, &row, &values, oracle)?;
    }

    let mut complete = Vec::with_capacity(values.len());
    for (slot, value) in values.into_iter().enumerate() {
        match value {
            Some(v) => complete.push(v),
            None => {
                return Err(WitnessError::UnresolvedWire {
                    slot,
                    name: cs.wires().name(slot).unwrap_or("?").to_string(),
                })
            }
        }
    }
    tracing::debug!(slots = complete.len(), "witness complete");
    Ok(Witness { values: complete })
}

fn unresolved_target(
    row: usize,
    slot: usize,
    values: &[Option<FieldElement>],
) -> Result<(), WitnessError> {
    if values[slot].is_some() {
        Err(WitnessError::AlreadyResolved { row, slot })
    } else {
        Ok(())
    }
}

fn known(
    row: usize,
    side: &crate::row::SparseRow,
    values: &[Option<FieldElement>],
    skip: Option<usize>,
) -> Result<FieldElement, WitnessError> {
    side.evaluate_without(values, skip)
        .map_err(|slot| WitnessError::AmbiguousUnknown { row, slot })
}

/// `(L·w)(R·w) + f(E·w)` with every slot known.
fn forward_value(
    i: usize,
    row: &RowRef<'_>,
    values: &[Option<FieldElement>],
    oracle: &dyn CurveOracle,
) -> Result<FieldElement, WitnessError> {
    let mut lhs = known(i, row.l, values, None)? * known(i, row.r, values, None)?;
    if !row.e.is_empty() {
        lhs += oracle.base_mult_x(&known(i, row.e, values, None)?);
    }
    Ok(lhs)
}

/// Solve `O·w = value` for the single unknown `target` on `O`.
fn solve_output(
    i: usize,
    row: &RowRef<'_>,
    target: usize,
    value: FieldElement,
    values: &mut [Option<FieldElement>],
) -> Result<(), WitnessError> {
    let rest = known(i, row.o, values, Some(target))?;
    let coeff_inv = row
        .o
        .get(target)
        .inverse()
        .ok_or(WitnessError::AmbiguousUnknown { row: i, slot: target })?;
    values[target] = Some((value - rest) * coeff_inv);
    Ok(())
}

fn resolve_row<R: Rng + ?Sized>(
    i: usize,
    row: &RowRef<'_>,
    values: &mut [Option<FieldElement>],
    oracle: &dyn CurveOracle,
    rng: &mut R,
) -> Result<(), WitnessError> {
    match row.shape {
        RowShape::Forward { target } => {
            unresolved_target(i, target, values)?;
            for side in [row.l, row.r, row.e] {
                if side.contains(target) {
                    return Err(WitnessError::AmbiguousUnknown { row: i, slot: target });
                }
            }
            let value = forward_value(i, row, values, oracle)?;
            solve_output(i, row, target, value, values)
        }
        RowShape::Inverse { target } => {
            unresolved_target(i, target, values)?;
            let numerator = known(i, row.o, values, None)?;
            let denominator = known(i, row.r, values, None)?;
            let quotient = numerator
                * denominator
                    .inverse()
                    .ok_or(WitnessError::DivisionByZero { row: i })?;
            let rest = known(i, row.l, values, Some(target))?;
            let coeff_inv = row
                .l
                .get(target)
                .inverse()
                .ok_or(WitnessError::AmbiguousUnknown { row: i, slot: target })?;
            values[target] = Some((quotient - rest) * coeff_inv);
            Ok(())
        }
        RowShape::BitDecompose {
            target,
            source,
            position,
        } => {
            unresolved_target(i, target, values)?;
            let source_value = values[source]
                .ok_or(WitnessError::AmbiguousUnknown { row: i, slot: source })?;
            let bit = to_biguint(&source_value).bit(position as u64);
            values[target] = Some(if bit {
                FieldElement::one()
            } else {
                FieldElement::zero()
            });
            Ok(())
        }
        RowShape::Check => Ok(()),
        RowShape::Blinding { random, target } => {
            unresolved_target(i, random, values)?;
            values[random] = Some(FieldElement::rand(rng));
            unresolved_target(i, target, values)?;
            let value = forward_value(i, row, values, oracle)?;
            solve_output(i, row, target, value, values)
        }
    }
}

fn check_row(
    i: usize,
    row: &RowRef<'_>,
    values: &[Option<FieldElement>],
    oracle: &dyn CurveOracle,
) -> Result<(), WitnessError> {
    let lhs = forward_value(i, row, values, oracle)?;
    let rhs = known(i, row.o, values, None)?;
    if lhs == rhs {
        Ok(())
    } else {
        Err(WitnessError::ConstraintViolated { row: i })
    }
}
