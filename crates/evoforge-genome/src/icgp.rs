//! Immutable typed CGP: nodes live in a map keyed by globally unique,
//! monotonically increasing ids, and a function node's `inputs` are absolute
//! ids strictly smaller than its own. Mutation never overwrites a node's
//! content in place — a changed node gets a fresh id, and everything
//! downstream that referenced the old id gets re-issued with fresh ids too
//! (*bump*), which is what keeps "smaller id = earlier" true after an edit.

use evoforge_core::random;
use evoforge_error::{evo_err, Result};
use evoforge_lang::{ErcGen, Language, LangEntry, Ty};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::id::NodeId;
use crate::node::NodeKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IcgpOptions {
    pub erc_prob: f64,
    pub atrophy_steps: u64,
    pub force_recache: bool,
    pub max_tries: usize,
}

impl Default for IcgpOptions {
    fn default() -> Self {
        IcgpOptions { erc_prob: 0.0, atrophy_steps: 200, force_recache: false, max_tries: 8 }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IcgpNode<T, V> {
    pub kind: NodeKind<T, V>,
    pub inputs: Vec<NodeId>,
    pub last_use: u64,
}

impl<T: Ty, V> IcgpNode<T, V> {
    pub fn ty(&self) -> &T {
        self.kind.ty()
    }
}

/// Draws a `(kind, inputs)` pair the same way CGP's `rand_node` does, except
/// link candidates are drawn from an explicit `candidate_ids` pool rather
/// than "every earlier index" — `rand_genome` passes every existing id,
/// `mutate`'s link/function draws pass only non-downstream ids.
pub fn rand_node<T, V>(
    lang: &Language<T, V>,
    existing: &BTreeMap<NodeId, IcgpNode<T, V>>,
    candidate_ids: &[NodeId],
    options: &IcgpOptions,
    erc_gen: &impl ErcGen<T, V>,
) -> Result<(NodeKind<T, V>, Vec<NodeId>)>
where
    T: Ty,
    V: Clone,
{
    if options.erc_prob > 0.0 && random::bool(options.erc_prob as f32) {
        let (value, ty) = erc_gen.generate();
        return Ok((NodeKind::Erc { value, ty }, Vec::new()));
    }

    for _ in 0..options.max_tries.max(1) {
        let entry = lang.random_entry();
        let LangEntry::Function { name, return_type, arg_types } = entry else {
            let LangEntry::Constant { value, ty } = entry else { unreachable!() };
            return Ok((NodeKind::Constant { value: value.clone(), ty: ty.clone() }, Vec::new()));
        };

        if !arg_types.is_empty() && candidate_ids.is_empty() {
            continue;
        }

        let mut links = Vec::with_capacity(arg_types.len());
        let mut ok = true;
        for arg_type in arg_types {
            match random_compatible_id(existing, candidate_ids, arg_type) {
                Some(id) => links.push(id),
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            return Ok((
                NodeKind::Function { name: name.clone(), return_type: return_type.clone(), arg_types: arg_types.clone() },
                links,
            ));
        }
    }

    Err(evo_err!(NoTypedNode: "no compatible candidate id after {} tries", options.max_tries))
}

fn random_compatible_id<T: Ty, V>(
    existing: &BTreeMap<NodeId, IcgpNode<T, V>>,
    candidate_ids: &[NodeId],
    wanted: &T,
) -> Option<NodeId> {
    let candidates: Vec<NodeId> =
        candidate_ids.iter().copied().filter(|id| existing[id].ty().is_subtype_of(wanted)).collect();
    if candidates.is_empty() {
        None
    } else {
        Some(*random::choose(&candidates))
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Icgp<T, V> {
    pub(crate) input_ids: Vec<(NodeId, String, T)>,
    pub(crate) nodes: BTreeMap<NodeId, IcgpNode<T, V>>,
    /// Inputs and genome-level constants: never removed by atrophy or
    /// neutral drift.
    pub(crate) pinned: BTreeSet<NodeId>,
    pub(crate) out_refs: Vec<Option<NodeId>>,
    pub(crate) out_types: Vec<T>,
    pub(crate) lang: Arc<Language<T, V>>,
    pub(crate) options: IcgpOptions,
    pub(crate) timestep: u64,
}

impl<T: Ty, V: Clone> Icgp<T, V> {
    pub fn empty_genome(
        inputs: Vec<(String, T)>,
        constants: Vec<(V, T)>,
        out_types: Vec<T>,
        lang: Arc<Language<T, V>>,
        options: IcgpOptions,
    ) -> Self {
        let mut nodes = BTreeMap::new();
        let mut pinned = BTreeSet::new();
        let mut input_ids = Vec::with_capacity(inputs.len());

        for (name, ty) in inputs {
            let id = NodeId::next();
            nodes.insert(id, IcgpNode { kind: NodeKind::Input { name: name.clone(), ty: ty.clone() }, inputs: Vec::new(), last_use: 0 });
            pinned.insert(id);
            input_ids.push((id, name, ty));
        }
        for (value, ty) in constants {
            let id = NodeId::next();
            nodes.insert(id, IcgpNode { kind: NodeKind::Constant { value, ty }, inputs: Vec::new(), last_use: 0 });
            pinned.insert(id);
        }

        let n_out = out_types.len();
        Icgp {
            input_ids,
            nodes,
            pinned,
            out_refs: vec![None; n_out],
            out_types,
            lang,
            options,
            timestep: 0,
        }
    }

    pub fn rand_genome(
        inputs: Vec<(String, T)>,
        constants: Vec<(V, T)>,
        out_types: Vec<T>,
        lang: Arc<Language<T, V>>,
        initial_size: usize,
        options: IcgpOptions,
        erc_gen: &impl ErcGen<T, V>,
    ) -> Result<Self> {
        let mut genome = Self::empty_genome(inputs, constants, out_types, lang, options);
        let target = initial_size.max(genome.nodes.len());
        while genome.nodes.len() < target {
            let existing_ids: Vec<NodeId> = genome.nodes.keys().copied().collect();
            let (kind, links) = rand_node(&genome.lang, &genome.nodes, &existing_ids, &genome.options, erc_gen)?;
            genome.insert_node(kind, links);
        }
        genome.init_out_refs()?;
        Ok(genome)
    }

    pub fn init_out_refs(&mut self) -> Result<()> {
        for i in 0..self.out_refs.len() {
            if self.out_refs[i].is_none() {
                let out_type = self.out_types[i].clone();
                let candidates: Vec<NodeId> = self.nodes.keys().copied().collect();
                let id = random_compatible_id(&self.nodes, &candidates, &out_type)
                    .ok_or_else(|| evo_err!(NoCompatibleOutput: "no node compatible with output type"))?;
                self.out_refs[i] = Some(id);
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, IcgpNode<T, V>> {
        &self.nodes
    }

    /// The genome's declared inputs, in formal-parameter order: `(id, name, type)`.
    pub fn input_ids(&self) -> &[(NodeId, String, T)] {
        &self.input_ids
    }

    pub fn out_refs(&self) -> &[Option<NodeId>] {
        &self.out_refs
    }

    pub fn set_out_ref(&mut self, output: usize, id: NodeId) {
        self.out_refs[output] = Some(id);
    }

    pub fn out_types(&self) -> &[T] {
        &self.out_types
    }

    pub fn lang(&self) -> &Language<T, V> {
        &self.lang
    }

    pub fn options(&self) -> &IcgpOptions {
        &self.options
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn is_pinned(&self, id: NodeId) -> bool {
        self.pinned.contains(&id)
    }

    pub fn is_executable(&self) -> bool {
        self.out_refs.iter().all(Option::is_some)
    }

    /// All ids reachable from `out_refs`, following `inputs` backward.
    pub fn active_set(&self) -> BTreeSet<NodeId> {
        let mut active = BTreeSet::new();
        let mut stack: Vec<NodeId> = self.out_refs.iter().filter_map(|r| *r).collect();
        while let Some(id) = stack.pop() {
            if active.insert(id) {
                if let Some(node) = self.nodes.get(&id) {
                    stack.extend(node.inputs.iter().copied());
                }
            }
        }
        active
    }

    /// Node identities are stable across a genome's life, so a fingerprint
    /// over the output-ref set alone detects every behavioural change: two
    /// genomes with the same `out_refs` compile to the same callable.
    pub fn fingerprint(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.out_refs.hash(&mut hasher);
        hasher.finish()
    }

    /// Unions two genomes' node maps into a fresh genome (collision-free,
    /// since ids are globally unique), taking `a`'s output types, language,
    /// and options. `init_out_refs` must be called on the result to pick
    /// outputs from the combined pool — merging alone breaks no invariant,
    /// but it leaves every output unset.
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut nodes = a.nodes.clone();
        nodes.extend(b.nodes.iter().map(|(&id, n)| (id, n.clone())));
        let mut pinned = a.pinned.clone();
        pinned.extend(b.pinned.iter().copied());
        let mut input_ids = a.input_ids.clone();
        input_ids.extend(b.input_ids.iter().cloned());

        let n_out = a.out_types.len();
        Icgp {
            input_ids,
            nodes,
            pinned,
            out_refs: vec![None; n_out],
            out_types: a.out_types.clone(),
            lang: a.lang.clone(),
            options: a.options,
            timestep: a.timestep.max(b.timestep),
        }
    }

    pub fn insert_node(&mut self, kind: NodeKind<T, V>, inputs: Vec<NodeId>) -> NodeId {
        let id = NodeId::next();
        self.nodes.insert(id, IcgpNode { kind, inputs, last_use: self.timestep });
        id
    }

    /// All ids that transitively reference `id` through `inputs` — i.e.
    /// everything that must be re-pointed (and bumped) if `id` is replaced
    /// or removed. Ascending id order.
    pub fn downstream_of(&self, id: NodeId) -> BTreeSet<NodeId> {
        let mut deps: BTreeSet<NodeId> = BTreeSet::new();
        let mut frontier: BTreeSet<NodeId> = [id].into_iter().collect();
        loop {
            let mut newly = BTreeSet::new();
            for (&nid, node) in self.nodes.iter() {
                if deps.contains(&nid) || nid == id {
                    continue;
                }
                if node.inputs.iter().any(|l| frontier.contains(l)) {
                    newly.insert(nid);
                }
            }
            if newly.is_empty() {
                break;
            }
            deps.extend(newly.iter().copied());
            frontier = newly;
        }
        deps
    }

    fn replace_references(&mut self, old: NodeId, new: NodeId) {
        for node in self.nodes.values_mut() {
            for link in node.inputs.iter_mut() {
                if *link == old {
                    *link = new;
                }
            }
        }
        for r in self.out_refs.iter_mut() {
            if *r == Some(old) {
                *r = Some(new);
            }
        }
    }

    /// Re-inserts every id in `ids` (ascending) with a fresh id, rewriting
    /// their own cross-references and any `out_refs` that pointed at them.
    /// Ids not in `ids` are left untouched, so an anchor id passed in via
    /// `replace_references` beforehand stays stable.
    fn bump(&mut self, ids: &BTreeSet<NodeId>) {
        let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
        for &old_id in ids {
            let node = self.nodes.remove(&old_id).expect("bumped id must exist");
            let remapped_inputs = node.inputs.iter().map(|l| *remap.get(l).unwrap_or(l)).collect();
            let new_id = NodeId::next();
            self.nodes.insert(new_id, IcgpNode { kind: node.kind, inputs: remapped_inputs, last_use: node.last_use });
            remap.insert(old_id, new_id);
        }
        for r in self.out_refs.iter_mut() {
            if let Some(old_id) = *r {
                if let Some(&new_id) = remap.get(&old_id) {
                    *r = Some(new_id);
                }
            }
        }
    }

    /// Replaces `old_id` with a freshly inserted node, re-points everything
    /// downstream of `old_id` at the new id, then bumps that downstream set
    /// so ids stay monotonically increasing along link direction. Whether
    /// `new_kind`'s return type is actually subtype-compatible with the
    /// node being replaced is the caller's concern — this is a mechanical
    /// primitive, not a policy.
    pub fn exchange_node(&mut self, old_id: NodeId, new_kind: NodeKind<T, V>, new_inputs: Vec<NodeId>) -> NodeId {
        let downstream = self.downstream_of(old_id);
        let new_id = self.insert_node(new_kind, new_inputs);
        self.replace_references(old_id, new_id);
        self.nodes.remove(&old_id);
        self.bump(&downstream);
        new_id
    }

    /// Re-points everything that referenced `old_id` at `replacement_id`
    /// (an existing node) instead, then retires `old_id`. Used when
    /// `exchange_node`'s type is incompatible but some other existing node
    /// can stand in.
    pub fn reparent(&mut self, old_id: NodeId, replacement_id: NodeId) {
        let downstream = self.downstream_of(old_id);
        self.replace_references(old_id, replacement_id);
        self.nodes.remove(&old_id);
        self.bump(&downstream);
    }

    /// Removes `id` and everything downstream of it. Returns the removed
    /// ids (ascending) so the caller can append replacements and re-point
    /// any `out_refs` that lost their target.
    pub fn discard_with_downstream(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut removed: Vec<NodeId> = self.downstream_of(id).into_iter().collect();
        removed.push(id);
        removed.sort_unstable();
        for &r in &removed {
            self.nodes.remove(&r);
        }
        for out in self.out_refs.iter_mut() {
            if matches!(*out, Some(r) if removed.contains(&r)) {
                *out = None;
            }
        }
        removed
    }

    /// Advances the timestep and refreshes `last_use` on every currently
    /// active node.
    pub fn tick(&mut self) {
        self.timestep += 1;
        let active = self.active_set();
        for id in active {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.last_use = self.timestep;
            }
        }
    }

    /// Retires every non-pinned, non-active node whose `last_use` lags the
    /// current timestep by more than `atrophy_steps`. Returns the ids
    /// removed.
    pub fn atrophy(&mut self) -> Vec<NodeId> {
        let active = self.active_set();
        let horizon = self.options.atrophy_steps;
        let timestep = self.timestep;
        let stale: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(id, node)| {
                !self.pinned.contains(id) && !active.contains(id) && timestep.saturating_sub(node.last_use) > horizon
            })
            .map(|(&id, _)| id)
            .collect();
        for id in &stale {
            self.nodes.remove(id);
        }
        stale
    }
}
