use crate::types::{CommodId, NodeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("There must be at least as many suppliers as commodities: {commods} commodities, {suppliers} suppliers")]
    Undersupplied { commods: usize, suppliers: usize },

    #[error("No supply fraction in {fracs:?} is >= cutoff {cutoff}")]
    EmptyFractionSet { cutoff: f64, fracs: Vec<f64> },

    #[error("Cannot draw {requested} distinct commodities from {available}")]
    TooManyCommodities { requested: usize, available: usize },

    #[error("Invalid sampler configuration: {0}")]
    Config(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Request node {node} has no eligible supplier")]
    OrphanRequest { node: NodeId },

    #[error("Commodity {commod} has no primary supplier")]
    UncoveredCommodity { commod: CommodId },

    #[error("Builder already consumed; construct a new one to build again")]
    BuilderConsumed,

    #[error("Id ranges overlap for {kind}")]
    OverlappingIds { kind: &'static str },

    #[error("Duplicate {kind} id {id}")]
    IdCollision { kind: &'static str, id: u64 },

    #[error("Scenario '{0}' has no sampling semantics yet")]
    ScenarioNotImplemented(&'static str),

    #[error("Instance '{0}' not found")]
    InstanceNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GenResult<T> = Result<T, GenError>;
