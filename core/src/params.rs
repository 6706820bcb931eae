//! Sampled parameters.
//!
//! Every structural quantity of a generated exchange (how many commodities,
//! how many assemblies a reactor asks for, how dense the connections are, ...)
//! is drawn from one of these samplers. All of them take the instance's
//! ExchangeRng explicitly; none memoize.
//!
//! In configuration files each sampler accepts either a bare literal
//! (`"n_commods": 3`, `"connection": 0.5`) or an object naming its fields
//! (`"constr_coeff": {"lb": 0.1, "ub": 2.0}`).

use crate::{
    error::{GenError, GenResult},
    rng::ExchangeRng,
};
use rand_distr::Triangular;
use serde::{Deserialize, Serialize};

/// The supply fractions a SupConstrParam chooses from when none are given.
pub const DEFAULT_SUPPLY_FRACS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

/// The smallest positive f64. Coefficient samplers default to it as their
/// lower bound so that drawn coefficients are never zero.
pub fn smallest_positive() -> f64 {
    f64::from_bits(1)
}

/// Anything that can be sampled during a build.
pub trait Sample {
    type Output;

    fn sample(&self, rng: &mut ExchangeRng) -> Self::Output;
}

// ── Param ──────────────────────────────────────────────────────────

/// A fixed count. Always samples to `avg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ParamRepr")]
pub struct Param {
    pub avg: usize,
}

impl Param {
    pub const fn new(avg: usize) -> Self {
        Self { avg }
    }
}

impl Sample for Param {
    type Output = usize;

    fn sample(&self, _rng: &mut ExchangeRng) -> usize {
        self.avg
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamFields {
    avg: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParamRepr {
    Literal(usize),
    Fields(ParamFields),
}

impl From<ParamRepr> for Param {
    fn from(repr: ParamRepr) -> Self {
        match repr {
            ParamRepr::Literal(avg) => Param::new(avg),
            ParamRepr::Fields(f) => Param::new(f.avg),
        }
    }
}

// ── BoolParam ──────────────────────────────────────────────────────

/// A binary event that fires with probability `cutoff`.
/// `cutoff <= 0` never fires; `cutoff >= 1` always fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "BoolParamRepr")]
pub struct BoolParam {
    pub cutoff: f64,
}

impl BoolParam {
    pub const fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }
}

impl Sample for BoolParam {
    type Output = bool;

    fn sample(&self, rng: &mut ExchangeRng) -> bool {
        rng.chance(self.cutoff)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoolParamFields {
    cutoff: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolParamRepr {
    Literal(f64),
    Fields(BoolParamFields),
}

impl From<BoolParamRepr> for BoolParam {
    fn from(repr: BoolParamRepr) -> Self {
        match repr {
            BoolParamRepr::Literal(cutoff) => BoolParam::new(cutoff),
            BoolParamRepr::Fields(f) => BoolParam::new(f.cutoff),
        }
    }
}

// ── CoeffParam ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoeffDist {
    /// Uniform on (lb, ub].
    #[default]
    Uniform,
    /// Triangular on [lb, ub] peaking at `mode`.
    Triangular { mode: f64 },
}

/// A real-valued coefficient drawn from `dist` over `lb..ub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CoeffParamFields", into = "CoeffParamFields")]
pub struct CoeffParam {
    lb:         f64,
    ub:         f64,
    dist:       CoeffDist,
    triangular: Option<Triangular<f64>>,
}

impl CoeffParam {
    /// Uniform on (lb, ub].
    pub fn new(lb: f64, ub: f64) -> GenResult<Self> {
        Self::with_dist(lb, ub, CoeffDist::Uniform)
    }

    pub fn with_dist(lb: f64, ub: f64, dist: CoeffDist) -> GenResult<Self> {
        if !(lb.is_finite() && ub.is_finite()) || lb > ub {
            return Err(GenError::Config(format!(
                "coefficient bounds must be finite with lb <= ub, got ({lb}, {ub})"
            )));
        }
        let triangular = match dist {
            CoeffDist::Uniform => None,
            CoeffDist::Triangular { mode } => Some(Triangular::new(lb, ub, mode).map_err(|e| {
                GenError::Config(format!("triangular({lb}, {ub}, {mode}): {e}"))
            })?),
        };
        Ok(Self { lb, ub, dist, triangular })
    }

    pub fn lb(&self) -> f64 {
        self.lb
    }

    pub fn ub(&self) -> f64 {
        self.ub
    }

    pub fn dist(&self) -> CoeffDist {
        self.dist
    }
}

impl Default for CoeffParam {
    /// Uniform on (smallest positive f64, 1].
    fn default() -> Self {
        Self {
            lb:         smallest_positive(),
            ub:         1.0,
            dist:       CoeffDist::Uniform,
            triangular: None,
        }
    }
}

impl Sample for CoeffParam {
    type Output = f64;

    fn sample(&self, rng: &mut ExchangeRng) -> f64 {
        match &self.triangular {
            Some(tri) => rng.sample(tri),
            // next_f64 is in [0, 1), so this lands in (lb, ub].
            None => self.ub - (self.ub - self.lb) * rng.next_f64(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CoeffParamFields {
    #[serde(default = "smallest_positive")]
    lb:   f64,
    #[serde(default = "one")]
    ub:   f64,
    #[serde(default)]
    dist: CoeffDist,
}

fn one() -> f64 {
    1.0
}

impl TryFrom<CoeffParamFields> for CoeffParam {
    type Error = GenError;

    fn try_from(f: CoeffParamFields) -> GenResult<Self> {
        CoeffParam::with_dist(f.lb, f.ub, f.dist)
    }
}

impl From<CoeffParam> for CoeffParamFields {
    fn from(p: CoeffParam) -> Self {
        Self { lb: p.lb, ub: p.ub, dist: p.dist }
    }
}

// ── SupConstrParam ─────────────────────────────────────────────────

/// A supply constraint value, as a fraction of the demand a supplier faces.
///
/// With `dist` set the cutoff itself is returned; otherwise one of the
/// configured fractions at or above the cutoff is chosen uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SupConstrRepr", into = "SupConstrFields")]
pub struct SupConstrParam {
    cutoff:   f64,
    dist:     bool,
    fracs:    Vec<f64>,
    eligible: Vec<f64>,
}

impl SupConstrParam {
    /// Chooses among the default fractions at or above `cutoff`.
    pub fn new(cutoff: f64) -> GenResult<Self> {
        Self::with_fracs(cutoff, false, DEFAULT_SUPPLY_FRACS.to_vec())
    }

    /// Fails when no fraction in `fracs` reaches `cutoff`, since sampling
    /// could then never produce a value.
    pub fn with_fracs(cutoff: f64, dist: bool, fracs: Vec<f64>) -> GenResult<Self> {
        let eligible: Vec<f64> = fracs.iter().copied().filter(|f| *f >= cutoff).collect();
        if eligible.is_empty() {
            return Err(GenError::EmptyFractionSet { cutoff, fracs });
        }
        Ok(Self { cutoff, dist, fracs, eligible })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Fractions that sampling may return.
    pub fn eligible(&self) -> &[f64] {
        &self.eligible
    }
}

impl Default for SupConstrParam {
    /// Cutoff 1: every supplier can cover its full demand.
    fn default() -> Self {
        Self {
            cutoff:   1.0,
            dist:     false,
            fracs:    DEFAULT_SUPPLY_FRACS.to_vec(),
            eligible: vec![1.0],
        }
    }
}

impl Sample for SupConstrParam {
    type Output = f64;

    fn sample(&self, rng: &mut ExchangeRng) -> f64 {
        if self.dist {
            return self.cutoff;
        }
        let i = rng.next_u64_below(self.eligible.len() as u64) as usize;
        self.eligible[i]
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SupConstrFields {
    cutoff: f64,
    #[serde(default)]
    dist:   bool,
    #[serde(default = "default_fracs")]
    fracs:  Vec<f64>,
}

fn default_fracs() -> Vec<f64> {
    DEFAULT_SUPPLY_FRACS.to_vec()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SupConstrRepr {
    Literal(f64),
    Fields(SupConstrFields),
}

impl TryFrom<SupConstrRepr> for SupConstrParam {
    type Error = GenError;

    fn try_from(repr: SupConstrRepr) -> GenResult<Self> {
        match repr {
            SupConstrRepr::Literal(cutoff) => SupConstrParam::new(cutoff),
            SupConstrRepr::Fields(f) => SupConstrParam::with_fracs(f.cutoff, f.dist, f.fracs),
        }
    }
}

impl From<SupConstrParam> for SupConstrFields {
    fn from(p: SupConstrParam) -> Self {
        Self { cutoff: p.cutoff, dist: p.dist, fracs: p.fracs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_is_constant() {
        let mut rng = ExchangeRng::seeded(1);
        let p = Param::new(4);
        for _ in 0..100 {
            assert_eq!(p.sample(&mut rng), 4);
        }
    }

    #[test]
    fn bool_param_rate_tracks_cutoff() {
        let mut rng = ExchangeRng::seeded(2);
        let n = 20_000;
        for cutoff in [0.1, 0.5, 0.8] {
            let p = BoolParam::new(cutoff);
            let hits = (0..n).filter(|_| p.sample(&mut rng)).count();
            let rate = hits as f64 / n as f64;
            assert!(
                (rate - cutoff).abs() < 0.02,
                "cutoff {cutoff}: empirical rate {rate}"
            );
        }
    }

    #[test]
    fn bool_param_bounds() {
        let mut rng = ExchangeRng::seeded(3);
        for cutoff in [-1.0, 0.0] {
            let p = BoolParam::new(cutoff);
            assert!((0..10_000).all(|_| !p.sample(&mut rng)));
        }
        for cutoff in [1.0, 2.0] {
            let p = BoolParam::new(cutoff);
            assert!((0..10_000).all(|_| p.sample(&mut rng)));
        }
    }

    #[test]
    fn default_coeff_is_positive_with_midpoint_mean() {
        let mut rng = ExchangeRng::seeded(4);
        let p = CoeffParam::default();
        let n = 5_000;
        let mut total = 0.0;
        for _ in 0..n {
            let c = p.sample(&mut rng);
            assert!(c > 0.0 && c <= 1.0, "coefficient {c} outside (0, 1]");
            total += c;
        }
        let mean = total / n as f64;
        assert!((mean - 0.5).abs() < 0.03, "mean {mean}");
    }

    #[test]
    fn coeff_respects_custom_bounds() {
        let mut rng = ExchangeRng::seeded(5);
        let p = CoeffParam::new(2.0, 3.0).unwrap();
        for _ in 0..1_000 {
            let c = p.sample(&mut rng);
            assert!(c > 2.0 && c <= 3.0, "coefficient {c} outside (2, 3]");
        }
    }

    #[test]
    fn triangular_coeff_stays_in_bounds() {
        let mut rng = ExchangeRng::seeded(6);
        let p = CoeffParam::with_dist(0.0, 10.0, CoeffDist::Triangular { mode: 2.0 }).unwrap();
        let n = 5_000;
        let mut total = 0.0;
        for _ in 0..n {
            let c = p.sample(&mut rng);
            assert!((0.0..=10.0).contains(&c));
            total += c;
        }
        // Triangular mean is (lb + ub + mode) / 3.
        let mean = total / n as f64;
        assert!((mean - 4.0).abs() < 0.2, "mean {mean}");
    }

    #[test]
    fn inverted_coeff_bounds_rejected() {
        assert!(matches!(CoeffParam::new(1.0, 0.5), Err(GenError::Config(_))));
    }

    #[test]
    fn sup_constr_cutoff_one_is_always_one() {
        let mut rng = ExchangeRng::seeded(7);
        let p = SupConstrParam::new(1.0).unwrap();
        assert!((0..1_000).all(|_| p.sample(&mut rng) == 1.0));
    }

    #[test]
    fn sup_constr_samples_only_eligible_fracs() {
        let mut rng = ExchangeRng::seeded(8);
        let p = SupConstrParam::new(0.5).unwrap();
        assert_eq!(p.eligible(), &[0.5, 0.75, 1.0]);
        let mut seen = [false; 3];
        for _ in 0..1_000 {
            let v = p.sample(&mut rng);
            let i = p.eligible().iter().position(|f| *f == v).expect("eligible value");
            seen[i] = true;
        }
        assert!(seen.iter().all(|s| *s), "Not every eligible fraction was drawn");
    }

    #[test]
    fn sup_constr_dist_returns_cutoff() {
        let mut rng = ExchangeRng::seeded(9);
        let p = SupConstrParam::with_fracs(0.3, true, default_fracs()).unwrap();
        assert!((0..100).all(|_| p.sample(&mut rng) == 0.3));
    }

    #[test]
    fn sup_constr_without_eligible_fraction_is_config_error() {
        let err = SupConstrParam::new(1.5).unwrap_err();
        assert!(matches!(err, GenError::EmptyFractionSet { .. }));
    }

    #[test]
    fn literal_and_object_forms_deserialize() {
        let p: Param = serde_json::from_str("3").unwrap();
        assert_eq!(p, Param::new(3));
        let p: Param = serde_json::from_str(r#"{"avg": 3}"#).unwrap();
        assert_eq!(p, Param::new(3));

        let b: BoolParam = serde_json::from_str("0.25").unwrap();
        assert_eq!(b.cutoff, 0.25);

        let c: CoeffParam = serde_json::from_str(r#"{"lb": 1.0, "ub": 2.0}"#).unwrap();
        assert_eq!((c.lb(), c.ub()), (1.0, 2.0));

        let c: CoeffParam =
            serde_json::from_str(r#"{"ub": 4.0, "dist": {"kind": "triangular", "mode": 1.0}}"#)
                .unwrap();
        assert_eq!(c.dist(), CoeffDist::Triangular { mode: 1.0 });

        let s: SupConstrParam = serde_json::from_str("0.75").unwrap();
        assert_eq!(s.eligible(), &[0.75, 1.0]);
    }

    #[test]
    fn bad_sup_constr_config_fails_to_deserialize() {
        let res: Result<SupConstrParam, _> =
            serde_json::from_str(r#"{"cutoff": 0.9, "fracs": [0.1, 0.2]}"#);
        assert!(res.is_err());
    }
}
