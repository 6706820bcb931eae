//! Parameter spaces for sweeping sampler configurations.
//!
//! A space maps sampler field names to candidate values. Every combination
//! of candidates is one point, and each point is a complete
//! ReactorRequestSampler (fields the space does not mention keep their
//! defaults).
//!
//! ```json
//! { "n_commods": [1, 2], "n_supply": 4, "connection": [0.5, 1.0] }
//! ```
//!
//! describes four points. A bare (non-array) value is a single candidate;
//! no sampler literal is itself an array, so the two forms never clash.

use crate::{
    error::{GenError, GenResult},
    sampler::ReactorRequestSampler,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SamplerSpace {
    candidates: BTreeMap<String, Vec<Value>>,
}

impl SamplerSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the candidates for one field.
    pub fn with(mut self, field: &str, values: Vec<Value>) -> Self {
        self.candidates.insert(field.to_string(), values);
        self
    }

    /// Number of points, without building any of them.
    pub fn count(&self) -> usize {
        self.candidates.values().map(Vec::len).product()
    }

    /// Every point, in a stable order: fields in name order, the last
    /// field varying fastest.
    pub fn points(&self) -> GenResult<Vec<ReactorRequestSampler>> {
        let mut combos: Vec<Map<String, Value>> = vec![Map::new()];
        for (field, values) in &self.candidates {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut point = combo.clone();
                    point.insert(field.clone(), value.clone());
                    next.push(point);
                }
            }
            combos = next;
        }
        combos
            .into_iter()
            .map(|point| serde_json::from_value(Value::Object(point)).map_err(GenError::from))
            .collect()
    }
}

impl<'de> Deserialize<'de> for SamplerSpace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let candidates = raw
            .into_iter()
            .map(|(field, value)| match value {
                Value::Array(values) => (field, values),
                single => (field, vec![single]),
            })
            .collect();
        Ok(Self { candidates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;
    use serde_json::json;

    #[test]
    fn empty_space_is_one_default_point() {
        let space = SamplerSpace::new();
        assert_eq!(space.count(), 1);
        let points = space.points().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].n_commods, Param::new(1));
    }

    #[test]
    fn points_are_the_cartesian_product() {
        let space: SamplerSpace = serde_json::from_value(json!({
            "n_commods": [1, 2],
            "n_supply": 4,
            "connection": [0.5, 1.0]
        }))
        .unwrap();
        assert_eq!(space.count(), 4);
        let points = space.points().unwrap();
        let pairs: Vec<(usize, f64)> = points
            .iter()
            .map(|p| (p.n_commods.avg, p.connection.cutoff))
            .collect();
        // "connection" sorts before "n_commods", so n_commods varies fastest
        assert_eq!(pairs, vec![(1, 0.5), (2, 0.5), (1, 1.0), (2, 1.0)]);
        assert!(points.iter().all(|p| p.n_supply == Param::new(4)));
    }

    #[test]
    fn empty_candidate_list_means_no_points() {
        let space = SamplerSpace::new().with("n_request", vec![]);
        assert_eq!(space.count(), 0);
        assert!(space.points().unwrap().is_empty());
    }

    #[test]
    fn invalid_point_is_reported() {
        let space = SamplerSpace::new().with("sup_constr_val", vec![json!(0.5), json!(2.0)]);
        assert!(space.points().is_err());
    }
}
