pub mod export;
pub mod row;
pub mod system;
pub mod witness;

pub use export::{write_system_json, write_witness_json, Encoding};
pub use row::{DenseRow, SparseRow};
pub use system::{ConstraintSystem, DenseSystem, RowRef, RowShape, WireIndex, ONE_WIRE};
pub use witness::{evaluate, evaluate_with_rng, Witness, WitnessError};
