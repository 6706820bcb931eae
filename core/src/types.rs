//! Shared primitive types used across instance generation.

/// Any integer id in an exchange: commodity, group, node or arc.
pub type Id = u64;

/// A fungible resource type.
pub type CommodId = Id;

/// A request group or supply group. Both kinds share one id space.
pub type GroupId = Id;

/// A request node or supply node. Both kinds share one id space.
pub type NodeId = Id;

/// An arc between a request node and a supply node.
pub type ArcId = Id;

/// One assembly's alternatives: `(request node, commodity)` pairs, any one of
/// which satisfies the assembly.
pub type MutualSet = Vec<(NodeId, CommodId)>;
