//! The typed program-graph genome: three variants — [`tree::Tree`],
//! [`cgp::Cgp`], [`icgp::Icgp`] — sharing a node vocabulary
//! ([`node::NodeKind`]) and an [`active_set::ActiveSet`] contract, but kept
//! as genuinely distinct types rather than forced under one `Genome` trait:
//! their node containers (recursive tree, flat back-linked vector, id-keyed
//! map) and their invariants diverge enough that a shared trait would mostly
//! be boilerplate.
//!
//! This crate owns construction (`rand_genome`/`empty_genome`), the
//! low-level structural primitives ICGP mutation needs (`exchange_node`,
//! `reparent`, `discard_with_downstream`, `bump` internally), and the
//! active-set analyser. The variation policies that decide *when* to call
//! these — `mutate`, `crossover`, `vary_neutral` — live in
//! `evoforge-variate`, which depends on this crate.

pub mod active_set;
pub mod cgp;
pub mod icgp;
pub mod id;
pub mod node;
pub mod tree;

pub mod prelude {
    pub use crate::active_set::{ActiveSet, TreeNodeRef};
    pub use crate::cgp::{Cgp, CgpNode, CgpOptions};
    pub use crate::icgp::{Icgp, IcgpNode, IcgpOptions};
    pub use crate::id::NodeId;
    pub use crate::node::NodeKind;
    pub use crate::tree::{Tree, TreeNode, TreeOptions};
}
