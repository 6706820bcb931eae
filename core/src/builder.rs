//! Builder trait and the intermediate shapes builders pass between steps.
//!
//! RULE: Every scenario builder implements ExchangeBuilder.
//! A builder is single-use: build() consumes its sampled state and
//! a second call, or a call after any build step was run by hand, fails
//! with GenError::BuilderConsumed.

use crate::{
    error::GenResult,
    exchange::IdRanges,
    exec_params::ExecParams,
    types::{CommodId, GroupId, MutualSet, NodeId},
};
use std::collections::BTreeMap;

/// Request group → one mutual set per requested assembly.
pub type RequestMap = BTreeMap<GroupId, Vec<MutualSet>>;

/// Supply group → the links realized for it.
pub type SupplyMap = BTreeMap<GroupId, Vec<SupplyLink>>;

/// Supply group → supplied commodities, primary first.
pub type SupplierCommods = BTreeMap<GroupId, Vec<CommodId>>;

/// One realized supply-request connection: a new supply node paired with
/// the request node it can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyLink {
    pub node:    NodeId,
    pub request: NodeId,
    pub commod:  CommodId,
}

/// The contract every scenario builder fulfills.
pub trait ExchangeBuilder {
    /// Unique stable name for this scenario.
    fn name(&self) -> &'static str;

    /// Sample and populate a complete instance.
    fn build(&mut self) -> GenResult<ExecParams>;

    /// Id ranges consumed so far. Node and arc ranges are only complete
    /// after build().
    fn id_ranges(&self) -> IdRanges;
}
