//! Reactor supply scenario builder.
//!
//! The supply-driven scenario mirrors the request-driven one: suppliers are
//! sampled first and requests derived to match. Its parameter set is
//! defined (ReactorSupplySampler) so configurations can already target it,
//! but the sampling rules are not yet designed, so build() refuses to run
//! rather than guess.

use crate::{
    builder::ExchangeBuilder,
    error::{GenError, GenResult},
    exchange::{IdOffsets, IdRanges},
    exec_params::ExecParams,
    sampler::ReactorSupplySampler,
};

pub struct ReactorSupplyBuilder {
    pub sampler: ReactorSupplySampler,
    offsets:     IdOffsets,
}

impl ReactorSupplyBuilder {
    pub fn new(sampler: ReactorSupplySampler, offsets: IdOffsets) -> Self {
        Self { sampler, offsets }
    }
}

impl ExchangeBuilder for ReactorSupplyBuilder {
    fn name(&self) -> &'static str {
        "reactor_supply"
    }

    fn build(&mut self) -> GenResult<ExecParams> {
        Err(GenError::ScenarioNotImplemented("reactor_supply"))
    }

    /// Nothing is ever allocated, so every range is empty at its offset.
    fn id_ranges(&self) -> IdRanges {
        let o = self.offsets;
        IdRanges {
            commods:        o.commod..o.commod,
            request_groups: o.req_group..o.req_group,
            supply_groups:  o.sup_group..o.sup_group,
            request_nodes:  o.req_node..o.req_node,
            supply_nodes:   o.sup_node..o.sup_node,
            arcs:           o.arc..o.arc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_refused() {
        let mut b = ReactorSupplyBuilder::new(
            ReactorSupplySampler::default(),
            IdOffsets::default(),
        );
        let err = b.build().unwrap_err();
        assert!(matches!(err, GenError::ScenarioNotImplemented("reactor_supply")));
        assert!(b.id_ranges().arcs.is_empty());
    }
}
