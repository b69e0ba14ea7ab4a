mod compare;
mod materialize;
pub mod markers;
mod types;

pub use compare::{reconcile, CompareError};
pub use materialize::{materialize, MaterializeError};
pub use types::{
    CopyFailure, MaterializeReport, ReconciliationDecisions, ReconciliationResult,
};
