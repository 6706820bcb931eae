//! Several builders composed into one exchange.

use exchange_core::{
    builder::ExchangeBuilder,
    error::GenError,
    exchange::{Exchange, IdOffsets},
    params::Param,
    request_builder::ReactorRequestBuilder,
    rng::RngBank,
    sampler::{ReactorRequestSampler, ReactorSupplySampler},
    supply_builder::ReactorSupplyBuilder,
};
use std::collections::BTreeSet;

fn sampler() -> ReactorRequestSampler {
    ReactorRequestSampler {
        n_commods: Param::new(2),
        n_request: Param::new(3),
        assem_per_req: Param::new(2),
        n_supply: Param::new(3),
        n_req_constr: Param::new(1),
        ..Default::default()
    }
}

#[test]
fn chained_builders_merge_without_collisions() {
    let bank = RngBank::new(5);
    let mut exchange = Exchange::new();

    let mut first =
        ReactorRequestBuilder::new(sampler(), IdOffsets::default(), bank.stream(0)).unwrap();
    exchange.build_from(&mut first).unwrap();
    let arcs_after_first = exchange.params().arc_count();

    let offsets = exchange.next_offsets();
    assert!(offsets.commod >= 2);
    let mut second = ReactorRequestBuilder::new(sampler(), offsets, bank.stream(1)).unwrap();
    exchange.build_from(&mut second).unwrap();

    let p = exchange.params();
    assert_eq!(p.u_nodes_per_req.len(), 6);
    assert_eq!(p.v_nodes_per_sup.len(), 6);
    assert!(p.arc_count() > arcs_after_first);
    p.validate().unwrap();
    assert!(p.orphan_request_nodes().is_empty());

    let groups: BTreeSet<u64> = p
        .u_nodes_per_req
        .keys()
        .chain(p.v_nodes_per_sup.keys())
        .copied()
        .collect();
    assert_eq!(groups.len(), 12, "Request and supply groups share one id space");
}

#[test]
fn overlapping_offsets_are_rejected() {
    let bank = RngBank::new(5);
    let mut exchange = Exchange::new();

    let mut first =
        ReactorRequestBuilder::new(sampler(), IdOffsets::default(), bank.stream(0)).unwrap();
    exchange.build_from(&mut first).unwrap();
    let before = exchange.params().clone();

    let mut second =
        ReactorRequestBuilder::new(sampler(), IdOffsets::default(), bank.stream(1)).unwrap();
    let err = exchange.build_from(&mut second).unwrap_err();
    assert!(matches!(err, GenError::OverlappingIds { kind: "commodity" }));
    assert_eq!(exchange.params(), &before, "A rejected builder must not leave partial output");
}

#[test]
fn disjoint_commodities_but_shared_nodes_are_rejected() {
    let bank = RngBank::new(8);
    let mut exchange = Exchange::new();

    let mut first =
        ReactorRequestBuilder::new(sampler(), IdOffsets::default(), bank.stream(0)).unwrap();
    exchange.build_from(&mut first).unwrap();

    let offsets = IdOffsets {
        req_node: 0,
        ..exchange.next_offsets()
    };
    let mut second = ReactorRequestBuilder::new(sampler(), offsets, bank.stream(1)).unwrap();
    let err = exchange.build_from(&mut second).unwrap_err();
    assert!(matches!(err, GenError::OverlappingIds { kind: "node" }));
}

#[test]
fn supply_scenario_refuses_inside_an_exchange() {
    let mut exchange = Exchange::new();
    let mut b = ReactorSupplyBuilder::new(ReactorSupplySampler::default(), IdOffsets::default());
    assert_eq!(b.name(), "reactor_supply");
    let err = exchange.build_from(&mut b).unwrap_err();
    assert!(matches!(err, GenError::ScenarioNotImplemented("reactor_supply")));
    assert_eq!(exchange.params().arc_count(), 0);
}
