use crate::{exchange::IdOffsets, space::SamplerSpace};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A conversion run: which parameter space to sweep and how many
/// instances to generate per point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_seed")]
    pub seed:                u64,
    #[serde(default = "default_instances_per_point")]
    pub instances_per_point: usize,
    #[serde(default)]
    pub offsets:             IdOffsets,
    #[serde(default)]
    pub space:               SamplerSpace,
}

fn default_seed() -> u64 {
    42
}

fn default_instances_per_point() -> usize {
    1
}

impl RunConfig {
    /// Load a run-control file.
    /// In tests, use RunConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RunConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// A small sweep: two commodity counts, two connection densities,
    /// enough suppliers for either.
    pub fn default_test() -> Self {
        let space = SamplerSpace::new()
            .with("n_commods", vec![json!(1), json!(3)])
            .with("n_request", vec![json!(4)])
            .with("assem_per_req", vec![json!(2)])
            .with("n_supply", vec![json!(5)])
            .with("n_req_constr", vec![json!(1)])
            .with("exclusive", vec![json!(0.3)])
            .with("connection", vec![json!(0.5), json!(1.0)]);
        Self {
            seed: default_seed(),
            instances_per_point: 2,
            offsets: IdOffsets::default(),
            space,
        }
    }
}
