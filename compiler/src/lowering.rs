//! Gate list → ER1CS rows.
//!
//! Slots are assigned in a fixed order: the constant one, the entry inputs,
//! then one slot per output-producing gate and per split bit in emission
//! order. Each gate becomes exactly one row.

use constraints::{ConstraintSystem, RowShape, SparseRow};
use field::{FieldElement, One};
use tracing::debug;

use crate::error::GateLoweringError;
use crate::factor::{FactorList, Reference};
use crate::gate::{Gate, GateKind};

pub const BLINDING_WIRES: [&str; 2] = ["$blind0", "$blind1"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Append a `b0 · b0 = b1` row with a freshly sampled `b0`.
    pub randomize: bool,
}

pub fn lower(
    gates: &[Gate],
    inputs: &[String],
    output: Option<&str>,
    options: LoweringOptions,
) -> Result<ConstraintSystem, GateLoweringError> {
    let _span = tracing::debug_span!("lower", gates = gates.len()).entered();
    let mut cs = ConstraintSystem::new();
    for name in inputs {
        cs.alloc_input(name)
            .ok_or_else(|| GateLoweringError::DuplicateWireAssignment { name: name.clone() })?;
    }

    for gate in gates {
        let target = match gate.kind {
            GateKind::BitRangeAssert => gate.aux_wire.as_deref(),
            _ => gate.output_wire.as_deref(),
        };
        let target = match target {
            Some(name) => Some(alloc(&mut cs, name)?),
            None => None,
        };
        let l = scatter(&cs, &gate.left)?;
        let r = scatter(&cs, &gate.right)?;
        let e = scatter(&cs, &gate.exponent)?;
        let o = scatter(&cs, &gate.output)?;
        let shape = shape_of(&cs, gate, target)?;
        cs.push_row(l, r, e, o, shape);

        if gate.kind == GateKind::BitRecombineAssert {
            if let Some(z) = &gate.aux_wire {
                let bits = gate
                    .left
                    .wires()
                    .map(|bit| slot(&cs, bit))
                    .collect::<Result<Vec<_>, _>>()?;
                cs.record_split(z, bits);
            }
        }
    }

    if let Some(name) = output {
        slot(&cs, name)?;
        cs.mark_output(name);
    }

    if options.randomize {
        let random = alloc(&mut cs, BLINDING_WIRES[0])?;
        let target = alloc(&mut cs, BLINDING_WIRES[1])?;
        cs.push_row(
            SparseRow::single(random, FieldElement::one()),
            SparseRow::single(random, FieldElement::one()),
            SparseRow::new(),
            SparseRow::single(target, FieldElement::one()),
            RowShape::Blinding { random, target },
        );
        cs.set_blinding(random, target);
    }

    debug!(rows = cs.num_rows(), wires = cs.num_wires(), "lowered");
    Ok(cs)
}

fn alloc(cs: &mut ConstraintSystem, name: &str) -> Result<usize, GateLoweringError> {
    cs.alloc_wire(name)
        .ok_or_else(|| GateLoweringError::DuplicateWireAssignment {
            name: name.to_string(),
        })
}

fn slot(cs: &ConstraintSystem, name: &str) -> Result<usize, GateLoweringError> {
    cs.slot_of(name)
        .ok_or_else(|| GateLoweringError::UnknownWireReference {
            name: name.to_string(),
        })
}

/// Coefficients of `list` by slot. Repeated slots accumulate.
fn scatter(cs: &ConstraintSystem, list: &FactorList) -> Result<SparseRow, GateLoweringError> {
    let mut row = SparseRow::new();
    for factor in list.terms() {
        let slot = match &factor.reference {
            Reference::One => 0,
            Reference::Wire(name) => slot(cs, name)?,
        };
        row.add_term(slot, factor.coefficient.to_field());
    }
    Ok(row)
}

fn shape_of(
    cs: &ConstraintSystem,
    gate: &Gate,
    target: Option<usize>,
) -> Result<RowShape, GateLoweringError> {
    let target = || {
        target.ok_or_else(|| GateLoweringError::UnknownWireReference {
            name: format!("output of gate {:016x}", gate.id),
        })
    };
    Ok(match gate.kind {
        GateKind::Multiply | GateKind::Add | GateKind::ScalarMult => RowShape::Forward { target: target()? },
        GateKind::Divide => RowShape::Inverse { target: target()? },
        GateKind::EqualityAssert | GateKind::BitRecombineAssert => RowShape::Check,
        GateKind::BitRangeAssert => {
            let bit = gate
                .bit
                .as_ref()
                .ok_or_else(|| GateLoweringError::UnknownWireReference {
                    name: format!("source of gate {:016x}", gate.id),
                })?;
            RowShape::BitDecompose {
                target: target()?,
                source: slot(cs, &bit.source)?,
                position: bit.position,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GateContainer, GateKey};
    use crate::rational::Rational;
    use field::from_u64;

    fn product() -> GateContainer {
        let mut gates = GateContainer::new();
        let x = FactorList::wire("x");
        let z = FactorList::wire("z").scale(&Rational::from_i64(2));
        gates.insert(GateKey::multiply(&x, &z), Gate::multiply(x, z, "$w0"));
        gates
    }

    #[test]
    fn slots_follow_inputs_then_emission_order() {
        let cs = lower(
            product().gates(),
            &["x".to_string(), "z".to_string()],
            Some("$w0"),
            LoweringOptions::default(),
        )
        .unwrap();
        assert_eq!(cs.wires().names(), ["$one", "x", "z", "$w0"]);
        assert_eq!(cs.outputs(), ["$w0"]);
        let row = cs.row(0);
        assert_eq!(row.r.get(2), from_u64(2));
        assert_eq!(row.shape, RowShape::Forward { target: 3 });
    }

    #[test]
    fn unknown_wire_is_rejected() {
        let err = lower(product().gates(), &["x".to_string()], None, LoweringOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            GateLoweringError::UnknownWireReference {
                name: "z".to_string()
            }
        );
    }

    #[test]
    fn duplicate_wire_is_rejected() {
        let err = lower(
            product().gates(),
            &["x".to_string(), "z".to_string(), "$w0".to_string()],
            None,
            LoweringOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GateLoweringError::DuplicateWireAssignment {
                name: "$w0".to_string()
            }
        );
    }

    #[test]
    fn repeated_references_accumulate() {
        let list = FactorList::wire("x").add(&FactorList::wire("x"));
        let mut gates = GateContainer::new();
        gates.insert(GateKey::add(&list), Gate::add(list.clone(), "$w0"));
        let cs = lower(gates.gates(), &["x".to_string()], None, LoweringOptions::default()).unwrap();
        assert_eq!(cs.row(0).l.get(1), from_u64(2));
        assert_eq!(cs.row(0).l.len(), 1);
    }

    #[test]
    fn blinding_row_is_appended() {
        let cs = lower(
            product().gates(),
            &["x".to_string(), "z".to_string()],
            Some("$w0"),
            LoweringOptions { randomize: true },
        )
        .unwrap();
        assert_eq!(cs.num_rows(), 2);
        assert_eq!(cs.blinding(), Some((4, 5)));
        assert_eq!(cs.row(1).shape, RowShape::Blinding { random: 4, target: 5 });
    }
}
