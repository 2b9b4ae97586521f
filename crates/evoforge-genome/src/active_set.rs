//! The active-set analyser: the traversal each genome variant's `nodes`
//! container already knows how to run (backward from `out_refs`, or — for
//! Tree, which has no separate node store to prune — simply "every node"),
//! unified behind one trait so the compiler and the driver can call it
//! without matching on genome variant.

use std::collections::BTreeSet;

use crate::cgp::Cgp;
use crate::icgp::Icgp;
use crate::id::NodeId;
use crate::tree::Tree;
use evoforge_lang::Ty;

/// A genome that can report which of its nodes are reachable from its
/// outputs. `NodeRef` is whatever a genome variant uses to address a node:
/// a flat index for CGP, a global id for ICGP, a root-relative path for
/// Tree.
pub trait ActiveSet {
    type NodeRef: Ord + Clone;

    fn active_set(&self) -> BTreeSet<Self::NodeRef>;
}

impl<T: Ty, V: Clone> ActiveSet for Cgp<T, V> {
    type NodeRef = usize;

    fn active_set(&self) -> BTreeSet<usize> {
        Cgp::active_set(self)
    }
}

impl<T: Ty, V: Clone> ActiveSet for Icgp<T, V> {
    type NodeRef = NodeId;

    fn active_set(&self) -> BTreeSet<NodeId> {
        Icgp::active_set(self)
    }
}

/// A node reference within a Tree genome: which output's root it falls
/// under, and the child-index path from that root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TreeNodeRef {
    pub output: usize,
    pub path: Vec<usize>,
}

impl<T: Ty, V: Clone + std::fmt::Debug> ActiveSet for Tree<T, V> {
    type NodeRef = TreeNodeRef;

    /// Every node in every output tree is reachable by construction — a
    /// tree genome has no separate node store to prune, so the active set
    /// is just "everything currently grown".
    fn active_set(&self) -> BTreeSet<TreeNodeRef> {
        let mut out = BTreeSet::new();
        for (output, root) in self.roots.iter().enumerate() {
            if let Some(root) = root {
                for path in root.all_paths() {
                    out.insert(TreeNodeRef { output, path });
                }
            }
        }
        out
    }
}
