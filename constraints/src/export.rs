/// JSON export for constraint systems and witnesses.
///
/// Field elements are written as canonical decimal strings. Rows are written
/// either sparsely, as `[slot, "coefficient"]` pairs, or densely, as one
/// string per wire.
use std::collections::BTreeMap;
use std::io::Write;

use field::to_decimal_string;
use serde::{Deserialize, Serialize};

use crate::row::SparseRow;
use crate::system::{ConstraintSystem, RowShape};
use crate::witness::Witness;

/// Row encoding used when exporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Dense,
    #[default]
    Sparse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowDocument {
    Sparse(Vec<(usize, String)>),
    Dense(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDocument {
    pub shape: RowShape,
    pub l: RowDocument,
    pub r: RowDocument,
    pub e: RowDocument,
    pub o: RowDocument,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDocument {
    pub encoding: Encoding,
    pub wires: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub split_map: BTreeMap<String, Vec<usize>>,
    pub blinding: Option<(usize, usize)>,
    pub constraints: Vec<ConstraintDocument>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessDocument {
    pub values: Vec<String>,
    pub outputs: BTreeMap<String, String>,
}

fn row_document(row: &SparseRow, encoding: Encoding, width: usize) -> RowDocument {
    match encoding {
        Encoding::Sparse => RowDocument::Sparse(
            row.iter()
                .map(|(slot, coeff)| (slot, to_decimal_string(&coeff)))
                .collect(),
        ),
        Encoding::Dense => RowDocument::Dense(
            row.to_dense(width)
                .coefficients()
                .iter()
                .map(to_decimal_string)
                .collect(),
        ),
    }
}

pub fn system_document(cs: &ConstraintSystem, encoding: Encoding) -> SystemDocument {
    let width = cs.num_wires();
    let constraints = cs
        .rows()
        .map(|row| ConstraintDocument {
            shape: row.shape,
            l: row_document(row.l, encoding, width),
            r: row_document(row.r, encoding, width),
            e: row_document(row.e, encoding, width),
            o: row_document(row.o, encoding, width),
        })
        .collect();
    SystemDocument {
        encoding,
        wires: cs.wires().names().to_vec(),
        inputs: cs.inputs().to_vec(),
        outputs: cs.outputs().to_vec(),
        split_map: cs.split_map().clone(),
        blinding: cs.blinding(),
        constraints,
    }
}

pub fn witness_document(cs: &ConstraintSystem, witness: &Witness) -> WitnessDocument {
    let outputs = cs
        .outputs()
        .iter()
        .filter_map(|name| {
            witness
                .value_of(cs, name)
                .map(|v| (name.clone(), to_decimal_string(&v)))
        })
        .collect();
    WitnessDocument {
        values: witness.values().iter().map(to_decimal_string).collect(),
        outputs,
    }
}

pub fn write_system_json<W: Write>(
    writer: W,
    cs: &ConstraintSystem,
    encoding: Encoding,
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &system_document(cs, encoding))
}

pub fn write_witness_json<W: Write>(
    writer: W,
    cs: &ConstraintSystem,
    witness: &Witness,
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &witness_document(cs, witness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use field::from_u64;

    fn small_system() -> ConstraintSystem {
        let mut cs = ConstraintSystem::new();
        let x = cs.alloc_input("x").unwrap();
        let out = cs.alloc_wire("$w0").unwrap();
        cs.push_row(
            SparseRow::single(x, from_u64(1)),
            SparseRow::single(x, from_u64(1)),
            SparseRow::new(),
            SparseRow::single(out, from_u64(1)),
            RowShape::Forward { target: out },
        );
        cs.mark_output("$w0");
        cs
    }

    #[test]
    fn sparse_document_lists_pairs() {
        let doc = system_document(&small_system(), Encoding::Sparse);
        assert_eq!(doc.wires, ["$one", "x", "$w0"]);
        assert_eq!(
            doc.constraints[0].l,
            RowDocument::Sparse(vec![(1, "1".to_string())])
        );
        assert_eq!(doc.constraints[0].e, RowDocument::Sparse(vec![]));
    }

    #[test]
    fn dense_document_has_full_width() {
        let doc = system_document(&small_system(), Encoding::Dense);
        assert_eq!(
            doc.constraints[0].o,
            RowDocument::Dense(vec!["0".into(), "0".into(), "1".into()])
        );
    }

    #[test]
    fn json_round_trips_through_serde() {
        let mut buf = Vec::new();
        write_system_json(&mut buf, &small_system(), Encoding::Sparse).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"kind\": \"forward\""));
        let parsed: SystemDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, system_document(&small_system(), Encoding::Sparse));
    }
}
