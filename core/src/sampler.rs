//! Sampler containers: the single place a build's randomness is configured.
//!
//! A container holds one sampler per structural quantity. Every field has a
//! conservative default, so a configuration only names the quantities it
//! wants to vary. Unknown field names are rejected.

use crate::params::{BoolParam, CoeffParam, Param, SupConstrParam};
use serde::{Deserialize, Serialize};

/// Samplers for a reactor request scenario: reactors (request groups) ask
/// for assemblies, suppliers are generated to match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReactorRequestSampler {
    /// Number of commodities.
    pub n_commods: Param,
    /// Number of requesters (request groups).
    pub n_request: Param,
    /// Assemblies requested per request group.
    pub assem_per_req: Param,
    /// Whether an assembly request can be satisfied by more than one commodity.
    pub assem_multi_commod: BoolParam,
    /// Extra alternative commodities for a multi-commodity assembly.
    pub req_multi_commods: Param,
    /// Probability that a request node is exclusive.
    pub exclusive: BoolParam,
    /// Constraints per request group.
    pub n_req_constr: Param,
    /// Number of suppliers (supply groups).
    pub n_supply: Param,
    /// Whether a supplier supplies more than one commodity.
    pub sup_multi: BoolParam,
    /// Extra commodities a multi-commodity supplier supplies.
    pub sup_multi_commods: Param,
    /// Constraints per supply group.
    pub n_sup_constr: Param,
    /// Supply constraint value as a fraction of the supplier's demand.
    pub sup_constr_val: SupConstrParam,
    /// Probability that an eligible supply-request connection is realized.
    pub connection: BoolParam,
    /// Arc capacity coefficients.
    pub constr_coeff: CoeffParam,
    /// Arc preferences.
    pub pref_coeff: CoeffParam,
}

impl Default for ReactorRequestSampler {
    fn default() -> Self {
        Self {
            n_commods:          Param::new(1),
            n_request:          Param::new(1),
            assem_per_req:      Param::new(1),
            assem_multi_commod: BoolParam::new(0.0),
            req_multi_commods:  Param::new(0),
            exclusive:          BoolParam::new(0.0),
            n_req_constr:       Param::new(0),
            n_supply:           Param::new(1),
            sup_multi:          BoolParam::new(0.0),
            sup_multi_commods:  Param::new(1),
            n_sup_constr:       Param::new(1),
            sup_constr_val:     SupConstrParam::default(),
            connection:         BoolParam::new(1.0),
            constr_coeff:       CoeffParam::default(),
            pref_coeff:         CoeffParam::default(),
        }
    }
}

/// Samplers for a reactor supply scenario: suppliers drive sampling and
/// requests are derived to match. Only the parameter set is defined;
/// see `supply_builder::ReactorSupplyBuilder`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReactorSupplySampler {
    pub n_commods:      Param,
    pub n_supply:       Param,
    pub n_request:      Param,
    pub assem_per_sup:  Param,
    pub commod_per_sup: Param,
    pub exclusive:      BoolParam,
    pub connection:     BoolParam,
    pub n_sup_constr:   Param,
    pub sup_constr_val: SupConstrParam,
    pub dem_multi:      BoolParam,
    pub dem_multi_commods: Param,
    pub n_dem_constr:   Param,
    pub constr_coeff:   CoeffParam,
    pub pref_coeff:     CoeffParam,
}

impl Default for ReactorSupplySampler {
    fn default() -> Self {
        Self {
            n_commods:         Param::new(1),
            n_supply:          Param::new(1),
            n_request:         Param::new(1),
            assem_per_sup:     Param::new(1),
            commod_per_sup:    Param::new(1),
            exclusive:         BoolParam::new(0.0),
            connection:        BoolParam::new(1.0),
            n_sup_constr:      Param::new(1),
            sup_constr_val:    SupConstrParam::default(),
            dem_multi:         BoolParam::new(0.0),
            dem_multi_commods: Param::new(1),
            n_dem_constr:      Param::new(0),
            constr_coeff:      CoeffParam::default(),
            pref_coeff:        CoeffParam::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{params::Sample, rng::ExchangeRng};

    #[test]
    fn request_defaults_sample_conservatively() {
        let s = ReactorRequestSampler::default();
        let mut rng = ExchangeRng::seeded(11);
        assert_eq!(s.n_commods.sample(&mut rng), 1);
        assert_eq!(s.n_request.sample(&mut rng), 1);
        assert_eq!(s.assem_per_req.sample(&mut rng), 1);
        assert!(!s.assem_multi_commod.sample(&mut rng));
        assert_eq!(s.req_multi_commods.sample(&mut rng), 0);
        assert!(!s.exclusive.sample(&mut rng));
        assert_eq!(s.n_req_constr.sample(&mut rng), 0);
        assert_eq!(s.n_supply.sample(&mut rng), 1);
        assert!(!s.sup_multi.sample(&mut rng));
        assert_eq!(s.sup_multi_commods.sample(&mut rng), 1);
        assert_eq!(s.n_sup_constr.sample(&mut rng), 1);
        assert_eq!(s.sup_constr_val.sample(&mut rng), 1.0);
        assert!(s.connection.sample(&mut rng));

        let n = 1_000;
        let (mut constr_total, mut pref_total) = (0.0, 0.0);
        for _ in 0..n {
            let constr = s.constr_coeff.sample(&mut rng);
            let pref = s.pref_coeff.sample(&mut rng);
            assert!(constr > 0.0 && constr <= 1.0);
            assert!(pref > 0.0 && pref <= 1.0);
            constr_total += constr;
            pref_total += pref;
        }
        assert!((constr_total / n as f64 - 0.5).abs() < 0.05);
        assert!((pref_total / n as f64 - 0.5).abs() < 0.05);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let s: ReactorRequestSampler = serde_json::from_str(
            r#"{"n_commods": 3, "n_supply": {"avg": 5}, "connection": 0.4}"#,
        )
        .unwrap();
        assert_eq!(s.n_commods, Param::new(3));
        assert_eq!(s.n_supply, Param::new(5));
        assert_eq!(s.connection.cutoff, 0.4);
        assert_eq!(s.n_request, Param::new(1));
        assert_eq!(s.sup_constr_val.cutoff(), 1.0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let res: Result<ReactorRequestSampler, _> =
            serde_json::from_str(r#"{"n_commodities": 3}"#);
        assert!(res.is_err());
    }

    #[test]
    fn sampler_round_trips_through_json() {
        let s = ReactorRequestSampler {
            n_commods: Param::new(4),
            sup_constr_val: SupConstrParam::new(0.5).unwrap(),
            ..Default::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: ReactorRequestSampler = serde_json::from_str(&json).unwrap();
        assert_eq!(back.n_commods, Param::new(4));
        assert_eq!(back.sup_constr_val, s.sup_constr_val);
    }
}
