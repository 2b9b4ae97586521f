//! ICGP mutation policy (spec §4.5.3 — "the harder part"): decreasing-id
//! iteration over non-fixed nodes, `links_based_on` type-preserving link
//! reuse, and the exchange/reparent/discard fallback chain, all built atop
//! `evoforge-genome::icgp`'s structural primitives.
//!
//! Iterating ids in *decreasing* order is what makes a single precomputed id
//! list safe to use for the whole pass: a node's downstream dependents
//! always carry *larger* ids than it does (an input must precede its
//! referencing node), so by the time we reach a given id every id larger
//! than it — the only ones `bump` can ever re-issue — has already been
//! visited and will not be revisited.

use evoforge_core::random;
use evoforge_error::{evo_err, Result};
use evoforge_genome::icgp::{rand_node, Icgp};
use evoforge_genome::id::NodeId;
use evoforge_genome::node::NodeKind;
use evoforge_lang::{ErcGen, Ty};

/// Mutates `genome` in place per the ICGP policy.
pub fn mutate<T, V>(genome: &mut Icgp<T, V>, node_mut_rate: f64, erc_gen: &impl ErcGen<T, V>) -> Result<()>
where
    T: Ty,
    V: Clone,
{
    let ids: Vec<NodeId> = genome.nodes().keys().rev().copied().filter(|id| !genome.is_pinned(*id)).collect();

    for id in ids {
        if !genome.nodes().contains_key(&id) {
            continue; // discarded by an earlier step in this same pass
        }
        if !random::bool(node_mut_rate as f32) {
            continue;
        }
        if random::bool(0.5) {
            mutate_function(genome, id, erc_gen);
        } else {
            mutate_link(genome, id);
        }
    }

    for output in 0..genome.out_refs().len() {
        if random::bool(node_mut_rate as f32) {
            mutate_out_ref(genome, output)?;
        }
    }

    Ok(())
}

fn mutate_function<T, V>(genome: &mut Icgp<T, V>, old_id: NodeId, erc_gen: &impl ErcGen<T, V>)
where
    T: Ty,
    V: Clone,
{
    let downstream = genome.downstream_of(old_id);
    let non_downstream: Vec<NodeId> =
        genome.nodes().keys().copied().filter(|id| *id != old_id && !downstream.contains(id)).collect();

    let Ok((new_kind, fresh_inputs)) = rand_node(genome.lang(), genome.nodes(), &non_downstream, genome.options(), erc_gen)
    else {
        return;
    };

    let old_node = &genome.nodes()[&old_id];
    let (old_inputs, old_arg_types): (Vec<NodeId>, Vec<T>) = match &old_node.kind {
        NodeKind::Function { arg_types, .. } => (old_node.inputs.clone(), arg_types.clone()),
        _ => (Vec::new(), Vec::new()),
    };
    let new_arg_types = new_kind.arg_types().to_vec();

    let inputs = match links_based_on(genome, &old_inputs, &old_arg_types, &new_arg_types, &non_downstream) {
        Some(inputs) => inputs,
        None => fresh_inputs, // new_arg_types is empty (terminal kind): nothing to match, use as-is
    };
    if new_arg_types.len() != inputs.len() {
        return; // a gap in links_based_on could not be filled: skip, genome unchanged
    }

    exchange_or_fallback(genome, old_id, new_kind, inputs, &non_downstream, erc_gen);
}

/// For each `new_arg_types[j]`, reuse an old input id of a compatible old
/// type if one remains in the pool; otherwise draw a fresh typed link from
/// `non_downstream`. Returns `None` only when `new_arg_types` is empty
/// (nothing to do — the caller treats that as "use the freshly drawn
/// inputs verbatim").
fn links_based_on<T, V>(
    genome: &Icgp<T, V>,
    old_inputs: &[NodeId],
    old_arg_types: &[T],
    new_arg_types: &[T],
    non_downstream: &[NodeId],
) -> Option<Vec<NodeId>>
where
    T: Ty,
    V: Clone,
{
    if new_arg_types.is_empty() {
        return None;
    }

    let mut pool: Vec<(T, NodeId)> = old_arg_types.iter().cloned().zip(old_inputs.iter().copied()).collect();
    let mut result = Vec::with_capacity(new_arg_types.len());

    for arg_type in new_arg_types {
        if let Some(pos) = pool.iter().position(|(ty, _)| ty.is_subtype_of(arg_type)) {
            let (_, id) = pool.remove(pos);
            result.push(id);
        } else if let Some(id) = random_compatible_id(genome, non_downstream, arg_type) {
            result.push(id);
        }
        // else: leave this slot unfilled — the caller detects the length
        // mismatch and skips the mutation.
    }
    Some(result)
}

fn mutate_link<T, V>(genome: &mut Icgp<T, V>, id: NodeId)
where
    T: Ty,
    V: Clone,
{
    let node = &genome.nodes()[&id];
    if !node.kind.is_function() || node.inputs.is_empty() {
        return;
    }
    let arg_types = node.kind.arg_types().to_vec();
    let j = random::index(arg_types.len());

    let downstream = genome.downstream_of(id);
    let candidates: Vec<NodeId> =
        genome.nodes().keys().copied().filter(|cid| *cid != id && !downstream.contains(cid)).collect();

    let Some(new_link) = random_compatible_id(genome, &candidates, &arg_types[j]) else {
        return;
    };

    let mut inputs = genome.nodes()[&id].inputs.clone();
    inputs[j] = new_link;
    let kind = genome.nodes()[&id].kind.clone();
    // Same kind, same return type: always subtype-of itself, so this is
    // always the "insert new id, bump downstream" branch of exchange.
    genome.exchange_node(id, kind, inputs);
}

/// Applies the three-tier exchange-node fallback from §4.5.3: if the new
/// kind's return type remains subtype-compatible, a plain exchange; else a
/// reparent onto some other non-downstream node of a compatible type; else
/// discard the node and its downstream, backfill with fresh random nodes,
/// and let `init_out_refs` repoint any output that lost its target. The
/// last step is attempted transactionally — on any failure the genome is
/// rolled back to a snapshot taken before the discard, per the "skip the
/// mutation" contract (never leave the genome in a partially-reduced state).
fn exchange_or_fallback<T, V>(
    genome: &mut Icgp<T, V>,
    old_id: NodeId,
    new_kind: NodeKind<T, V>,
    inputs: Vec<NodeId>,
    non_downstream: &[NodeId],
    erc_gen: &impl ErcGen<T, V>,
) where
    T: Ty,
    V: Clone,
{
    let old_ty = genome.nodes()[&old_id].kind.ty().clone();

    if new_kind.ty().is_subtype_of(&old_ty) {
        genome.exchange_node(old_id, new_kind, inputs);
        return;
    }

    if let Some(replacement) = random_compatible_id(genome, non_downstream, &old_ty) {
        genome.reparent(old_id, replacement);
        return;
    }

    let snapshot = genome.clone();
    let removed = genome.discard_with_downstream(old_id);
    for _ in 0..removed.len() {
        let existing_ids: Vec<NodeId> = genome.nodes().keys().copied().collect();
        match rand_node(genome.lang(), genome.nodes(), &existing_ids, genome.options(), erc_gen) {
            Ok((kind, links)) => {
                genome.insert_node(kind, links);
            }
            Err(_) => {
                *genome = snapshot;
                return;
            }
        }
    }
    if genome.init_out_refs().is_err() {
        *genome = snapshot;
    }
}

fn mutate_out_ref<T, V>(genome: &mut Icgp<T, V>, output: usize) -> Result<()>
where
    T: Ty,
    V: Clone,
{
    let out_type = genome.out_types()[output].clone();
    let candidates: Vec<NodeId> = genome.nodes().keys().copied().collect();
    let id = random_compatible_id(genome, &candidates, &out_type)
        .ok_or_else(|| evo_err!(NoCompatibleOutput: "no node compatible with output index {}", output))?;
    genome.set_out_ref(output, id);
    Ok(())
}

fn random_compatible_id<T: Ty, V>(genome: &Icgp<T, V>, candidates: &[NodeId], wanted: &T) -> Option<NodeId> {
    let matches: Vec<NodeId> =
        candidates.iter().copied().filter(|id| genome.nodes()[id].kind.ty().is_subtype_of(wanted)).collect();
    if matches.is_empty() {
        None
    } else {
        Some(*random::choose(&matches))
    }
}

/// If the genome has grown past `target_size`, discards a random inactive,
/// non-fixed node and its dependants; otherwise adds a random node. Keeps
/// genome size drifting toward `target_size` between mutation passes.
pub fn vary_neutral<T, V>(genome: &mut Icgp<T, V>, target_size: usize, erc_gen: &impl ErcGen<T, V>) -> Result<()>
where
    T: Ty,
    V: Clone,
{
    if genome.nodes().len() > target_size {
        let active = genome.active_set();
        let candidates: Vec<NodeId> = genome
            .nodes()
            .keys()
            .copied()
            .filter(|id| !genome.is_pinned(*id) && !active.contains(id))
            .collect();
        if !candidates.is_empty() {
            let id = *random::choose(&candidates);
            genome.discard_with_downstream(id);
        }
    } else {
        let existing_ids: Vec<NodeId> = genome.nodes().keys().copied().collect();
        let (kind, links) = rand_node(genome.lang(), genome.nodes(), &existing_ids, genome.options(), erc_gen)?;
        genome.insert_node(kind, links);
    }
    Ok(())
}

/// Advances the genome's timestep and, if `apply_atrophy`, retires stale
/// inactive nodes past `atrophy_steps`. Returns the ids atrophy removed.
pub fn tick<T, V>(genome: &mut Icgp<T, V>, apply_atrophy: bool) -> Vec<NodeId>
where
    T: Ty,
    V: Clone,
{
    genome.tick();
    if apply_atrophy {
        genome.atrophy()
    } else {
        Vec::new()
    }
}

/// Unions two genomes (§4.5.4, optional) and re-initialises outputs against
/// the combined pool.
pub fn merge<T, V>(a: &Icgp<T, V>, b: &Icgp<T, V>) -> Result<Icgp<T, V>>
where
    T: Ty,
    V: Clone,
{
    let mut merged = Icgp::merge(a, b);
    merged.init_out_refs()?;
    Ok(merged)
}
