//! Flattens each genome variant's active set into a [`Program`]: compute the
//! active set, walk it in an order that is already topological (ascending
//! CGP index / ICGP id is guaranteed earlier-than by the acyclicity
//! invariant; Tree is walked post-order), and emit one step per node.

use std::collections::HashMap;

use evoforge_error::{evo_err, Result};
use evoforge_genome::active_set::ActiveSet;
use evoforge_genome::cgp::Cgp;
use evoforge_genome::icgp::Icgp;
use evoforge_genome::id::NodeId;
use evoforge_genome::node::NodeKind;
use evoforge_genome::tree::{Tree, TreeNode};
use evoforge_lang::Ty;

use crate::program::{Program, Step};
use crate::value::Value;

/// A genome that knows how to flatten itself into a [`Program`] and report a
/// structural fingerprint cheap enough to compare every generation.
pub trait Compile {
    fn compile_program(&self) -> Result<Program>;
    fn fingerprint(&self) -> u64;
}

impl<T: Ty> Compile for Cgp<T, Value> {
    fn compile_program(&self) -> Result<Program> {
        let active = ActiveSet::active_set(self);
        let mut slot_of: HashMap<usize, usize> = HashMap::new();
        let mut steps = Vec::with_capacity(active.len());

        for &idx in &active {
            let node = &self.nodes()[idx];
            let step = if idx < self.n_inputs() {
                Step::Input(idx)
            } else {
                match &node.kind {
                    NodeKind::Constant { value, .. } | NodeKind::Erc { value, .. } => Step::Literal(value.clone()),
                    NodeKind::Function { name, .. } => Step::Call {
                        name: name.clone(),
                        args: node.inputs.iter().map(|l| slot_of[l]).collect(),
                    },
                    NodeKind::Input { .. } => unreachable!("input nodes occupy indices < n_inputs"),
                }
            };
            slot_of.insert(idx, steps.len());
            steps.push(step);
        }

        let outputs = self.out_refs().iter().map(|r| slot_of[r]).collect();
        Ok(Program::new(steps, outputs, self.n_inputs()))
    }

    fn fingerprint(&self) -> u64 {
        Cgp::fingerprint(self)
    }
}

impl<T: Ty> Compile for Icgp<T, Value> {
    fn compile_program(&self) -> Result<Program> {
        let active = ActiveSet::active_set(self);
        let input_positions: HashMap<NodeId, usize> =
            self.input_ids().iter().enumerate().map(|(i, (id, _, _))| (*id, i)).collect();

        let mut slot_of: HashMap<NodeId, usize> = HashMap::new();
        let mut steps = Vec::with_capacity(active.len());

        for &id in &active {
            let node = &self.nodes()[&id];
            let step = match &node.kind {
                NodeKind::Input { .. } => Step::Input(input_positions[&id]),
                NodeKind::Constant { value, .. } | NodeKind::Erc { value, .. } => Step::Literal(value.clone()),
                NodeKind::Function { name, .. } => Step::Call {
                    name: name.clone(),
                    args: node.inputs.iter().map(|l| slot_of[l]).collect(),
                },
            };
            slot_of.insert(id, steps.len());
            steps.push(step);
        }

        let outputs = self
            .out_refs()
            .iter()
            .map(|r| r.and_then(|id| slot_of.get(&id).copied()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| evo_err!(Compile: "an output ref is missing or inactive"))?;

        Ok(Program::new(steps, outputs, input_positions.len()))
    }

    fn fingerprint(&self) -> u64 {
        Icgp::fingerprint(self)
    }
}

impl<T: Ty> Compile for Tree<T, Value> {
    fn compile_program(&self) -> Result<Program> {
        let mut steps = Vec::new();
        let mut outputs = Vec::with_capacity(self.out_types().len());
        let input_positions: HashMap<String, usize> =
            self.inputs().iter().enumerate().map(|(i, (name, _))| (name.clone(), i)).collect();

        for i in 0..self.out_types().len() {
            let root = self
                .root(i)
                .ok_or_else(|| evo_err!(Compile: "tree genome has an uninitialised output"))?;
            outputs.push(flatten_tree_node(root, &input_positions, &mut steps));
        }

        Ok(Program::new(steps, outputs, input_positions.len()))
    }

    fn fingerprint(&self) -> u64 {
        Tree::fingerprint(self)
    }
}

fn flatten_tree_node<T>(node: &TreeNode<T, Value>, input_positions: &HashMap<String, usize>, steps: &mut Vec<Step>) -> usize {
    let step = match &node.kind {
        NodeKind::Input { name, .. } => Step::Input(input_positions[name]),
        NodeKind::Constant { value, .. } | NodeKind::Erc { value, .. } => Step::Literal(value.clone()),
        NodeKind::Function { name, .. } => {
            let args = node.children.iter().map(|c| flatten_tree_node(c, input_positions, steps)).collect();
            Step::Call { name: name.clone(), args }
        }
    };
    steps.push(step);
    steps.len() - 1
}
