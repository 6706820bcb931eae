//! Reactor request scenario builder.
//!
//! BUILD ORDER (fixed, never reordered):
//!   1. generate_request: request groups, assemblies, request nodes
//!   2. generate_supply:  supplier commodities, then supply nodes per
//!                        realized connection
//!   3. populate_params:  quantities, constraints, arcs, coefficients
//!
//! RULES:
//!   - Every commodity is the primary commodity of some supplier.
//!   - Every request node gets at least one supply connection.
//!   - All randomness flows through the builder's own ExchangeRng.

use crate::{
    builder::{ExchangeBuilder, RequestMap, SupplierCommods, SupplyLink, SupplyMap},
    error::{GenError, GenResult},
    exchange::{IdOffsets, IdRanges},
    exec_params::ExecParams,
    incrementer::Incrementer,
    params::Sample,
    rng::ExchangeRng,
    sampler::ReactorRequestSampler,
    types::{CommodId, GroupId, Id, NodeId},
};
use std::collections::BTreeMap;
use std::ops::Range;

pub struct ReactorRequestBuilder {
    sampler:         ReactorRequestSampler,
    offsets:         IdOffsets,
    rng:             ExchangeRng,
    commods:         Vec<CommodId>,
    requesters:      Vec<GroupId>,
    suppliers:       Vec<GroupId>,
    req_node_ids:    Incrementer,
    sup_node_ids:    Option<Incrementer>,
    arc_ids:         Incrementer,
    reqs_to_commods: BTreeMap<NodeId, CommodId>,
    commods_to_reqs: BTreeMap<CommodId, Vec<NodeId>>,
    req_node_groups: BTreeMap<NodeId, GroupId>,
    built:           bool,
}

impl ReactorRequestBuilder {
    /// Sample the commodity, requester and supplier counts and lay out
    /// their ids. These counts are fixed for the builder's lifetime.
    pub fn new(
        sampler: ReactorRequestSampler,
        offsets: IdOffsets,
        mut rng: ExchangeRng,
    ) -> GenResult<Self> {
        let n_commods = sampler.n_commods.sample(&mut rng);
        if n_commods == 0 {
            return Err(GenError::Config("n_commods must be at least 1".into()));
        }
        let n_request = sampler.n_request.sample(&mut rng);
        let n_supply = sampler.n_supply.sample(&mut rng);

        let commods = (offsets.commod..offsets.commod + n_commods as Id).collect();

        let req_g_ids = Incrementer::new(offsets.req_group);
        let requesters: Vec<GroupId> = (0..n_request).map(|_| req_g_ids.next_id()).collect();
        // groups of both kinds share one id space
        let sup_g_ids =
            Incrementer::new(offsets.req_group + offsets.sup_group + requesters.len() as Id);
        let suppliers = (0..n_supply).map(|_| sup_g_ids.next_id()).collect();

        Ok(Self {
            req_node_ids: Incrementer::new(offsets.req_node),
            sup_node_ids: None,
            arc_ids: Incrementer::new(offsets.arc),
            sampler,
            offsets,
            rng,
            commods,
            requesters,
            suppliers,
            reqs_to_commods: BTreeMap::new(),
            commods_to_reqs: BTreeMap::new(),
            req_node_groups: BTreeMap::new(),
            built: false,
        })
    }

    pub fn commods(&self) -> &[CommodId] {
        &self.commods
    }

    pub fn requesters(&self) -> &[GroupId] {
        &self.requesters
    }

    pub fn suppliers(&self) -> &[GroupId] {
        &self.suppliers
    }

    /// Request node → its commodity, as filled by generate_request.
    pub fn request_commods(&self) -> &BTreeMap<NodeId, CommodId> {
        &self.reqs_to_commods
    }

    // ── Step 1: request ───────────────────────────────────────────

    /// Every requester asks for a sampled number of assemblies. Each
    /// assembly becomes one mutual set: a single node for its primary
    /// commodity, or one node per eligible commodity when the assembly
    /// accepts several.
    pub fn generate_request(
        &mut self,
        commods: &[CommodId],
        requesters: &[GroupId],
    ) -> GenResult<RequestMap> {
        let mut requests = RequestMap::new();
        for &g_id in requesters {
            let assems = self.sampler.assem_per_req.sample(&mut self.rng);
            let mut sets = Vec::with_capacity(assems);
            for _ in 0..assems {
                let mut assem_commods = self.assem_commods(commods)?;
                if !self.sampler.assem_multi_commod.sample(&mut self.rng) {
                    assem_commods.truncate(1);
                }
                let mut set = Vec::with_capacity(assem_commods.len());
                for commod in assem_commods {
                    let n_id = self.req_node_ids.next_id();
                    set.push((n_id, commod));
                    self.reqs_to_commods.insert(n_id, commod);
                    self.commods_to_reqs.entry(commod).or_default().push(n_id);
                    self.req_node_groups.insert(n_id, g_id);
                }
                sets.push(set);
            }
            requests.insert(g_id, sets);
        }
        log::debug!(
            "reactor_request: {} request nodes across {} groups",
            self.reqs_to_commods.len(),
            requests.len()
        );
        Ok(requests)
    }

    /// The commodities that can satisfy one assembly: a uniformly chosen
    /// primary first, then `req_multi_commods` distinct others.
    fn assem_commods(&mut self, commods: &[CommodId]) -> GenResult<Vec<CommodId>> {
        let primary = *self.rng.choose(commods).ok_or(GenError::TooManyCommodities {
            requested: 1,
            available: 0,
        })?;
        let others: Vec<CommodId> = commods.iter().copied().filter(|c| *c != primary).collect();
        let n_extra = self.sampler.req_multi_commods.sample(&mut self.rng);
        let extra = self
            .rng
            .sample_distinct(&others, n_extra)
            .ok_or(GenError::TooManyCommodities {
                requested: n_extra,
                available: others.len(),
            })?;
        let mut assem = Vec::with_capacity(1 + extra.len());
        assem.push(primary);
        assem.extend(extra);
        Ok(assem)
    }

    // ── Step 2: supply ────────────────────────────────────────────

    /// Assign commodities to suppliers, then realize supply connections
    /// for every request node generated so far.
    pub fn generate_supply(
        &mut self,
        commods: &[CommodId],
        suppliers: &[GroupId],
    ) -> GenResult<(SupplyMap, SupplierCommods)> {
        let assign = self.assign_supply_commods(commods, suppliers)?;
        for commod in commods {
            if !assign.values().any(|cs| cs.first() == Some(commod)) {
                return Err(GenError::UncoveredCommodity { commod: *commod });
            }
        }
        let supply = self.select_supply(&assign)?;
        Ok((supply, assign))
    }

    /// Give each supplier a primary commodity, cycling through a shuffled
    /// commodity order so that every commodity is some supplier's primary.
    /// Suppliers that sample as multi-commodity also get distinct secondaries.
    pub fn assign_supply_commods(
        &mut self,
        commods: &[CommodId],
        suppliers: &[GroupId],
    ) -> GenResult<SupplierCommods> {
        if commods.is_empty() {
            return Err(GenError::Config("no commodities to assign to suppliers".into()));
        }
        if commods.len() > suppliers.len() {
            return Err(GenError::Undersupplied {
                commods:   commods.len(),
                suppliers: suppliers.len(),
            });
        }
        let mut order = commods.to_vec();
        self.rng.shuffle(&mut order);

        let mut assign = SupplierCommods::new();
        for (i, &sup) in suppliers.iter().enumerate() {
            let primary = order[i % order.len()];
            let n_extra = if self.sampler.sup_multi.sample(&mut self.rng) {
                self.sampler.sup_multi_commods.sample(&mut self.rng)
            } else {
                0
            };
            let others: Vec<CommodId> = order.iter().copied().filter(|c| *c != primary).collect();
            let secondaries = self
                .rng
                .sample_distinct(&others, n_extra)
                .ok_or(GenError::TooManyCommodities {
                    requested: n_extra,
                    available: others.len(),
                })?;
            let mut supplied = Vec::with_capacity(1 + secondaries.len());
            supplied.push(primary);
            supplied.extend(secondaries);
            assign.insert(sup, supplied);
        }
        Ok(assign)
    }

    /// For every request node, connect one eligible supplier unconditionally
    /// and each remaining eligible supplier with the connection probability.
    /// Every connection allocates a fresh supply node.
    fn select_supply(&mut self, assign: &SupplierCommods) -> GenResult<SupplyMap> {
        // nodes of both kinds share one id space
        let sup_ids = Incrementer::new(
            self.offsets.req_node + self.offsets.sup_node + self.reqs_to_commods.len() as Id,
        );

        let mut by_commod: BTreeMap<CommodId, Vec<GroupId>> = BTreeMap::new();
        for (&sup, supplied) in assign {
            for &commod in supplied {
                by_commod.entry(commod).or_default().push(sup);
            }
        }

        let mut supply: SupplyMap = assign.keys().map(|g| (*g, Vec::new())).collect();
        let requests: Vec<(NodeId, CommodId)> =
            self.reqs_to_commods.iter().map(|(n, c)| (*n, *c)).collect();
        for (request, commod) in requests {
            let mut eligible = by_commod.get(&commod).cloned().unwrap_or_default();
            if eligible.is_empty() {
                return Err(GenError::OrphanRequest { node: request });
            }
            self.rng.shuffle(&mut eligible);
            for (i, g_id) in eligible.into_iter().enumerate() {
                if i > 0 && !self.sampler.connection.sample(&mut self.rng) {
                    continue;
                }
                let link = SupplyLink {
                    node: sup_ids.next_id(),
                    request,
                    commod,
                };
                supply.entry(g_id).or_default().push(link);
            }
        }
        log::debug!(
            "reactor_request: {} supply nodes across {} suppliers",
            supply.values().map(Vec::len).sum::<usize>(),
            supply.len()
        );
        self.sup_node_ids = Some(sup_ids);
        Ok(supply)
    }

    // ── Step 3: parameters ────────────────────────────────────────

    /// Translate the sampled graph into solver parameters.
    ///
    /// Assemblies are unit mass, so a request group's quantity is its
    /// number of assemblies, and every request constraint shares that value.
    /// A supplier's constraints are sampled fractions of its capacity.
    pub fn populate_params(
        &mut self,
        request: &RequestMap,
        supply: &SupplyMap,
        supplier_commods: &SupplierCommods,
    ) -> GenResult<ExecParams> {
        let mut p = ExecParams::new();

        for (&g_id, sets) in request {
            p.add_request_group(g_id);
            let qty = sets.len() as f64;
            p.req_qty.insert(g_id, qty);
            let n_constr = self.sampler.n_req_constr.sample(&mut self.rng);
            p.constr_vals.insert(g_id, vec![qty; n_constr]);
            for &(n_id, _) in sets.iter().flatten() {
                p.add_request_node(n_id, g_id);
                p.node_qty.insert(n_id, 1.0);
                p.def_constr_coeff.insert(n_id, 1.0);
                let excl = self.sampler.exclusive.sample(&mut self.rng);
                p.node_excl.insert(n_id, excl);
                if excl {
                    p.excl_req_nodes.entry(g_id).or_default().push(n_id);
                }
            }
        }

        for (&g_id, links) in supply {
            p.add_supply_group(g_id);
            let supplied = supplier_commods.get(&g_id).map_or(&[][..], Vec::as_slice);
            let capacity = self.supplier_capacity(supplied);
            let n_constr = self.sampler.n_sup_constr.sample(&mut self.rng);
            let mut vals = Vec::with_capacity(n_constr);
            for _ in 0..n_constr {
                vals.push(self.sampler.sup_constr_val.sample(&mut self.rng) * capacity);
            }
            p.constr_vals.insert(g_id, vals);

            for link in links {
                p.add_supply_node(link.node, g_id);
                p.node_qty.insert(link.node, 1.0);
                p.node_excl.insert(link.node, false);

                let a_id = self.arc_ids.next_id();
                p.add_arc(a_id, link.request, link.node);
                let u_group = self.req_node_groups.get(&link.request).copied().ok_or(
                    GenError::OrphanRequest { node: link.request },
                )?;
                let n_u = p.constr_vals.get(&u_group).map_or(0, Vec::len);
                let n_v = p.constr_vals.get(&g_id).map_or(0, Vec::len);
                let u_caps = self.sample_coeffs(n_u);
                let v_caps = self.sample_coeffs(n_v);
                p.node_ucaps.entry(link.request).or_default().insert(a_id, u_caps);
                p.node_ucaps.entry(link.node).or_default().insert(a_id, v_caps);
                let pref = self.sampler.pref_coeff.sample(&mut self.rng);
                p.arc_pref.insert(a_id, pref);
            }
        }
        Ok(p)
    }

    fn sample_coeffs(&mut self, n: usize) -> Vec<f64> {
        (0..n)
            .map(|_| self.sampler.constr_coeff.sample(&mut self.rng))
            .collect()
    }

    /// The largest demand among the commodities a supplier supplies.
    fn supplier_capacity(&self, supplied: &[CommodId]) -> f64 {
        supplied
            .iter()
            .map(|c| self.commod_demand(*c))
            .fold(0.0, f64::max)
    }

    /// Total requested quantity of a commodity: one per request node.
    fn commod_demand(&self, commod: CommodId) -> f64 {
        self.commods_to_reqs.get(&commod).map_or(0, Vec::len) as f64
    }

    fn group_range(ids: &[GroupId], start: Id) -> Range<Id> {
        match (ids.first(), ids.last()) {
            (Some(first), Some(last)) => *first..*last + 1,
            _ => start..start,
        }
    }
}

impl ExchangeBuilder for ReactorRequestBuilder {
    fn name(&self) -> &'static str {
        "reactor_request"
    }

    fn build(&mut self) -> GenResult<ExecParams> {
        // a step run by hand has already spent ids this build would reuse
        let stepped = !self.reqs_to_commods.is_empty() || self.sup_node_ids.is_some();
        if self.built || stepped {
            return Err(GenError::BuilderConsumed);
        }
        self.built = true;

        let commods = self.commods.clone();
        let requesters = self.requesters.clone();
        let suppliers = self.suppliers.clone();

        let request = self.generate_request(&commods, &requesters)?;
        let (supply, supplier_commods) = self.generate_supply(&commods, &suppliers)?;
        let params = self.populate_params(&request, &supply, &supplier_commods)?;
        params.validate()?;

        log::debug!(
            "reactor_request: built {} commodities, {} request groups, {} supply groups, {} arcs",
            commods.len(),
            requesters.len(),
            suppliers.len(),
            params.arc_count()
        );
        Ok(params)
    }

    fn id_ranges(&self) -> IdRanges {
        let sup_g_start =
            self.offsets.req_group + self.offsets.sup_group + self.requesters.len() as Id;
        let sup_n_start = self.offsets.req_node
            + self.offsets.sup_node
            + self.reqs_to_commods.len() as Id;
        IdRanges {
            commods:        self.offsets.commod..self.offsets.commod + self.commods.len() as Id,
            request_groups: Self::group_range(&self.requesters, self.offsets.req_group),
            supply_groups:  Self::group_range(&self.suppliers, sup_g_start),
            request_nodes:  self.req_node_ids.consumed(),
            supply_nodes:   self
                .sup_node_ids
                .as_ref()
                .map_or(sup_n_start..sup_n_start, Incrementer::consumed),
            arcs:           self.arc_ids.consumed(),
        }
    }
}
