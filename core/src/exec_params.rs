//! The flat parameter structure handed to a solver.
//!
//! ExecParams is a passive sink: builders write into it, solvers and the
//! store read from it. Request groups and supply groups share one id space,
//! as do request nodes and supply nodes, so per-group and per-node relations
//! (`constr_vals`, `node_qty`, ...) are keyed by that shared id.
//!
//! "u" nodes are request nodes, "v" nodes are supply nodes; an arc runs from
//! its u node to its v node.

use crate::{
    error::{GenError, GenResult},
    types::{ArcId, GroupId, NodeId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecParams {
    /// Request group → its request nodes.
    pub u_nodes_per_req:  BTreeMap<GroupId, Vec<NodeId>>,
    /// Supply group → its supply nodes.
    pub v_nodes_per_sup:  BTreeMap<GroupId, Vec<NodeId>>,
    /// Request group → quantity requested.
    pub req_qty:          BTreeMap<GroupId, f64>,
    /// Any group → constraint right-hand sides.
    pub constr_vals:      BTreeMap<GroupId, Vec<f64>>,
    /// Request node → coefficient of the group's default quantity constraint.
    pub def_constr_coeff: BTreeMap<NodeId, f64>,
    /// Any node → quantity.
    pub node_qty:         BTreeMap<NodeId, f64>,
    /// Any node → whether it is exclusive.
    pub node_excl:        BTreeMap<NodeId, bool>,
    /// Request group → its exclusive request nodes.
    pub excl_req_nodes:   BTreeMap<GroupId, Vec<NodeId>>,
    /// Supply group → its exclusive supply nodes.
    pub excl_sup_nodes:   BTreeMap<GroupId, Vec<NodeId>>,
    /// Arc → its request node.
    pub arc_to_unode:     BTreeMap<ArcId, NodeId>,
    /// Arc → its supply node.
    pub arc_to_vnode:     BTreeMap<ArcId, NodeId>,
    /// Node → arc → one capacity coefficient per constraint of the node's group.
    pub node_ucaps:       BTreeMap<NodeId, BTreeMap<ArcId, Vec<f64>>>,
    /// Arc → preference.
    pub arc_pref:         BTreeMap<ArcId, f64>,
}

impl ExecParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request_group(&mut self, g_id: GroupId) {
        self.u_nodes_per_req.entry(g_id).or_default();
        self.excl_req_nodes.entry(g_id).or_default();
    }

    pub fn add_request_node(&mut self, n_id: NodeId, g_id: GroupId) {
        self.u_nodes_per_req.entry(g_id).or_default().push(n_id);
    }

    pub fn add_supply_group(&mut self, g_id: GroupId) {
        self.v_nodes_per_sup.entry(g_id).or_default();
        self.excl_sup_nodes.entry(g_id).or_default();
    }

    pub fn add_supply_node(&mut self, n_id: NodeId, g_id: GroupId) {
        self.v_nodes_per_sup.entry(g_id).or_default().push(n_id);
    }

    pub fn add_arc(&mut self, a_id: ArcId, u_id: NodeId, v_id: NodeId) {
        self.arc_to_unode.insert(a_id, u_id);
        self.arc_to_vnode.insert(a_id, v_id);
    }

    pub fn request_node_count(&self) -> usize {
        self.u_nodes_per_req.values().map(Vec::len).sum()
    }

    pub fn supply_node_count(&self) -> usize {
        self.v_nodes_per_sup.values().map(Vec::len).sum()
    }

    pub fn arc_count(&self) -> usize {
        self.arc_to_unode.len()
    }

    /// Request nodes with no arc.
    pub fn orphan_request_nodes(&self) -> Vec<NodeId> {
        let connected: BTreeSet<NodeId> = self.arc_to_unode.values().copied().collect();
        self.u_nodes_per_req
            .values()
            .flatten()
            .copied()
            .filter(|n| !connected.contains(n))
            .collect()
    }

    /// Move every entry of `other` into `self`.
    ///
    /// Fails without modifying `self` if any group, node or arc id of `other`
    /// is already present.
    pub fn merge(&mut self, other: ExecParams) -> GenResult<()> {
        let groups = self.group_ids();
        if let Some(id) = other.group_ids().intersection(&groups).next() {
            return Err(GenError::IdCollision { kind: "group", id: *id });
        }
        let nodes = self.node_ids();
        if let Some(id) = other.node_ids().intersection(&nodes).next() {
            return Err(GenError::IdCollision { kind: "node", id: *id });
        }
        if let Some(id) = other.arc_to_unode.keys().find(|a| self.arc_to_unode.contains_key(a)) {
            return Err(GenError::IdCollision { kind: "arc", id: *id });
        }

        self.u_nodes_per_req.extend(other.u_nodes_per_req);
        self.v_nodes_per_sup.extend(other.v_nodes_per_sup);
        self.req_qty.extend(other.req_qty);
        self.constr_vals.extend(other.constr_vals);
        self.def_constr_coeff.extend(other.def_constr_coeff);
        self.node_qty.extend(other.node_qty);
        self.node_excl.extend(other.node_excl);
        self.excl_req_nodes.extend(other.excl_req_nodes);
        self.excl_sup_nodes.extend(other.excl_sup_nodes);
        self.arc_to_unode.extend(other.arc_to_unode);
        self.arc_to_vnode.extend(other.arc_to_vnode);
        self.node_ucaps.extend(other.node_ucaps);
        self.arc_pref.extend(other.arc_pref);
        Ok(())
    }

    /// Check referential integrity: every node in exactly one group, every
    /// arc between a registered request node and a registered supply node,
    /// and capacity vectors sized to their group's constraints.
    pub fn validate(&self) -> GenResult<()> {
        let mut node_group: BTreeMap<NodeId, GroupId> = BTreeMap::new();
        let members = self.u_nodes_per_req.iter().chain(self.v_nodes_per_sup.iter());
        for (g_id, nodes) in members {
            for n_id in nodes {
                if node_group.insert(*n_id, *g_id).is_some() {
                    return Err(GenError::IdCollision { kind: "node", id: *n_id });
                }
            }
        }
        if let Some(g_id) = self.u_nodes_per_req.keys().find(|g| self.v_nodes_per_sup.contains_key(g)) {
            return Err(GenError::IdCollision { kind: "group", id: *g_id });
        }

        for (a_id, u_id) in &self.arc_to_unode {
            let v_id = self.arc_to_vnode.get(a_id).ok_or_else(|| {
                GenError::InvariantViolation(format!("arc {a_id} has no supply node"))
            })?;
            let u_group = self.request_group_of(*u_id, &node_group).ok_or_else(|| {
                GenError::InvariantViolation(format!("arc {a_id} starts at unknown request node {u_id}"))
            })?;
            let v_group = self.supply_group_of(*v_id, &node_group).ok_or_else(|| {
                GenError::InvariantViolation(format!("arc {a_id} ends at unknown supply node {v_id}"))
            })?;
            if !self.arc_pref.contains_key(a_id) {
                return Err(GenError::InvariantViolation(format!("arc {a_id} has no preference")));
            }
            for (n_id, g_id) in [(*u_id, u_group), (*v_id, v_group)] {
                let expected = self.constr_vals.get(&g_id).map_or(0, Vec::len);
                let actual = self
                    .node_ucaps
                    .get(&n_id)
                    .and_then(|caps| caps.get(a_id))
                    .map_or(0, Vec::len);
                if expected != actual {
                    return Err(GenError::InvariantViolation(format!(
                        "arc {a_id} at node {n_id}: {actual} capacity coefficients for {expected} constraints"
                    )));
                }
            }
        }
        if self.arc_to_vnode.len() != self.arc_to_unode.len() {
            return Err(GenError::InvariantViolation(
                "arc_to_vnode and arc_to_unode disagree".into(),
            ));
        }
        Ok(())
    }

    fn group_ids(&self) -> BTreeSet<GroupId> {
        self.u_nodes_per_req
            .keys()
            .chain(self.v_nodes_per_sup.keys())
            .copied()
            .collect()
    }

    fn node_ids(&self) -> BTreeSet<NodeId> {
        self.u_nodes_per_req
            .values()
            .chain(self.v_nodes_per_sup.values())
            .flatten()
            .copied()
            .collect()
    }

    fn request_group_of(&self, n_id: NodeId, node_group: &BTreeMap<NodeId, GroupId>) -> Option<GroupId> {
        node_group
            .get(&n_id)
            .copied()
            .filter(|g| self.u_nodes_per_req.contains_key(g))
    }

    fn supply_group_of(&self, n_id: NodeId, node_group: &BTreeMap<NodeId, GroupId>) -> Option<GroupId> {
        node_group
            .get(&n_id)
            .copied()
            .filter(|g| self.v_nodes_per_sup.contains_key(g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_arc(g_req: GroupId, g_sup: GroupId, u: NodeId, v: NodeId, a: ArcId) -> ExecParams {
        let mut p = ExecParams::new();
        p.add_request_group(g_req);
        p.add_request_node(u, g_req);
        p.constr_vals.insert(g_req, vec![]);
        p.add_supply_group(g_sup);
        p.add_supply_node(v, g_sup);
        p.constr_vals.insert(g_sup, vec![1.0]);
        p.add_arc(a, u, v);
        p.node_ucaps.entry(u).or_default().insert(a, vec![]);
        p.node_ucaps.entry(v).or_default().insert(a, vec![0.5]);
        p.arc_pref.insert(a, 0.5);
        p
    }

    #[test]
    fn well_formed_params_validate() {
        let p = one_arc(0, 1, 0, 1, 0);
        p.validate().unwrap();
        assert!(p.orphan_request_nodes().is_empty());
    }

    #[test]
    fn ucaps_length_mismatch_is_caught() {
        let mut p = one_arc(0, 1, 0, 1, 0);
        p.node_ucaps.get_mut(&1).unwrap().insert(0, vec![]);
        assert!(matches!(p.validate(), Err(GenError::InvariantViolation(_))));
    }

    #[test]
    fn merge_of_disjoint_params_keeps_everything() {
        let mut a = one_arc(0, 1, 0, 1, 0);
        let b = one_arc(10, 11, 10, 11, 10);
        a.merge(b).unwrap();
        assert_eq!(a.arc_count(), 2);
        assert_eq!(a.request_node_count(), 2);
        a.validate().unwrap();
    }

    #[test]
    fn merge_rejects_colliding_ids() {
        let mut a = one_arc(0, 1, 0, 1, 0);
        let b = one_arc(0, 11, 10, 11, 10);
        let err = a.merge(b).unwrap_err();
        assert!(matches!(err, GenError::IdCollision { kind: "group", id: 0 }));
        assert_eq!(a.arc_count(), 1, "Failed merge must not modify the target");
    }

    #[test]
    fn unconnected_request_node_is_an_orphan() {
        let mut p = one_arc(0, 1, 0, 1, 0);
        p.add_request_node(7, 0);
        assert_eq!(p.orphan_request_nodes(), vec![7]);
    }
}
