//! Composing several builders into one exchange.
//!
//! Each builder fills its own id ranges, starting at the offsets it was
//! given. Nothing stops two builders from being handed overlapping offsets,
//! so Exchange checks the ranges every builder actually consumed before
//! merging its output.

use crate::{
    builder::ExchangeBuilder,
    error::{GenError, GenResult},
    exec_params::ExecParams,
    types::Id,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Where each kind of id starts for one builder.
///
/// Supply group ids start at `req_group + sup_group + (request groups)` and
/// supply node ids at `req_node + sup_node + (request nodes)`, because groups
/// of both kinds share one id space, as do nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdOffsets {
    pub commod:    Id,
    pub req_group: Id,
    pub sup_group: Id,
    pub req_node:  Id,
    pub sup_node:  Id,
    pub arc:       Id,
}

impl IdOffsets {
    /// Offsets for a builder composed after one that consumed `ranges`.
    pub fn following(ranges: &IdRanges) -> Self {
        Self {
            commod:    ranges.commods.end,
            req_group: ranges.request_groups.end.max(ranges.supply_groups.end),
            sup_group: 0,
            req_node:  ranges.request_nodes.end.max(ranges.supply_nodes.end),
            sup_node:  0,
            arc:       ranges.arcs.end,
        }
    }
}

/// The half-open id ranges one builder consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRanges {
    pub commods:        Range<Id>,
    pub request_groups: Range<Id>,
    pub supply_groups:  Range<Id>,
    pub request_nodes:  Range<Id>,
    pub supply_nodes:   Range<Id>,
    pub arcs:           Range<Id>,
}

impl IdRanges {
    /// The kind of id on which `self` and `other` collide, if any.
    pub fn overlap(&self, other: &IdRanges) -> Option<&'static str> {
        if intersects(&self.commods, &other.commods) {
            return Some("commodity");
        }
        let groups = [&self.request_groups, &self.supply_groups];
        let other_groups = [&other.request_groups, &other.supply_groups];
        if any_intersect(&groups, &other_groups) {
            return Some("group");
        }
        let nodes = [&self.request_nodes, &self.supply_nodes];
        let other_nodes = [&other.request_nodes, &other.supply_nodes];
        if any_intersect(&nodes, &other_nodes) {
            return Some("node");
        }
        if intersects(&self.arcs, &other.arcs) {
            return Some("arc");
        }
        None
    }
}

fn intersects(a: &Range<Id>, b: &Range<Id>) -> bool {
    !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end
}

fn any_intersect(a: &[&Range<Id>], b: &[&Range<Id>]) -> bool {
    a.iter().any(|x| b.iter().any(|y| intersects(x, y)))
}

/// One exchange assembled from any number of builders.
#[derive(Debug, Default)]
pub struct Exchange {
    params: ExecParams,
    ranges: Vec<IdRanges>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one builder's output, rejecting it if its id ranges overlap
    /// those of any builder absorbed earlier.
    pub fn absorb(&mut self, params: ExecParams, ranges: IdRanges) -> GenResult<()> {
        if let Some(kind) = self.ranges.iter().find_map(|r| r.overlap(&ranges)) {
            return Err(GenError::OverlappingIds { kind });
        }
        self.params.merge(params)?;
        self.ranges.push(ranges);
        Ok(())
    }

    /// Build `builder` and absorb its output.
    pub fn build_from<B: ExchangeBuilder + ?Sized>(&mut self, builder: &mut B) -> GenResult<()> {
        let params = builder.build()?;
        let ranges = builder.id_ranges();
        log::debug!(
            "exchange: absorbing {} ({} arcs)",
            builder.name(),
            params.arc_count()
        );
        self.absorb(params, ranges)
    }

    /// Offsets that cannot collide with anything absorbed so far.
    pub fn next_offsets(&self) -> IdOffsets {
        self.ranges
            .iter()
            .map(IdOffsets::following)
            .fold(IdOffsets::default(), |acc, o| IdOffsets {
                commod:    acc.commod.max(o.commod),
                req_group: acc.req_group.max(o.req_group),
                sup_group: 0,
                req_node:  acc.req_node.max(o.req_node),
                sup_node:  0,
                arc:       acc.arc.max(o.arc),
            })
    }

    pub fn params(&self) -> &ExecParams {
        &self.params
    }

    pub fn into_params(self) -> ExecParams {
        self.params
    }
}
