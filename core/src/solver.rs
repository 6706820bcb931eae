//! The solver seam.
//!
//! Solving is external to this crate. A Solver maps a populated instance to
//! a Solution; the engine records what comes back.

use crate::{error::GenResult, exec_params::ExecParams, types::ArcId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Wall-clock solve time in seconds.
    pub time:      f64,
    pub objective: f64,
    /// Version tag of the solver that produced this solution.
    pub version:   String,
    /// Arc → flow, for arcs carrying flow.
    pub flows:     BTreeMap<ArcId, f64>,
}

pub trait Solver {
    /// Stable name of the solver kind, e.g. "cbc".
    fn kind(&self) -> &str;

    fn solve(&self, params: &ExecParams) -> GenResult<Solution>;
}
