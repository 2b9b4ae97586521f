//! CGP mutation policy (spec §4.5.2): per-index function/link mutation with
//! arity-continuity rules, applied in place atop `evoforge-genome`'s
//! construction primitives.

use evoforge_core::random;
use evoforge_error::Result;
use evoforge_genome::cgp::{rand_node, Cgp, CgpNode};
use evoforge_lang::{ErcGen, Ty};

/// Mutates `genome` in place. For every non-input node index, with
/// probability `gene_mut_rate` regenerates its function — preserving the
/// old input-link prefix where arity allows, extending with the new node's
/// extra links otherwise — else perturbs each of its input links
/// independently at the same rate. Finally perturbs each output ref at the
/// same rate. Fingerprint changes automatically; there is nothing to
/// "recache" here, since the compiled-program cache lives outside the
/// genome (`evoforge-compile::CachedGenome`) and is recomputed lazily on
/// next use.
///
/// A per-index function draw that fails (no type-compatible candidate,
/// e.g. a heterogeneously-typed language starved of one arg type at that
/// position) is skipped rather than propagated — mirrors ICGP's skip-silent
/// policy and keeps the whole pass transactional: every other index's
/// mutation still applies, but a single `NoTypedNode` never aborts the rest
/// of the genome mid-mutation.
pub fn mutate<T, V>(genome: &mut Cgp<T, V>, gene_mut_rate: f64, erc_gen: &impl ErcGen<T, V>) -> Result<()>
where
    T: Ty,
    V: Clone + std::fmt::Debug,
{
    for i in genome.n_inputs()..genome.nodes().len() {
        if random::bool(gene_mut_rate as f32) {
            mutate_function(genome, i, erc_gen);
        } else {
            mutate_links(genome, i);
        }
    }

    for output in 0..genome.out_refs().len() {
        if random::bool(gene_mut_rate as f32) {
            let out_type = genome.out_types()[output].clone();
            if let Some(idx) = random_compatible_index(genome.nodes(), genome.nodes().len(), &out_type) {
                genome.set_out_ref(output, idx);
            }
        }
    }

    Ok(())
}

fn mutate_function<T, V>(genome: &mut Cgp<T, V>, i: usize, erc_gen: &impl ErcGen<T, V>)
where
    T: Ty,
    V: Clone + std::fmt::Debug,
{
    let Ok(new_node) = rand_node(genome.lang(), &genome.nodes()[..i], i, genome.options(), erc_gen) else {
        return;
    };
    let old_arity = genome.nodes()[i].inputs.len();
    let new_arity = new_node.inputs.len();

    let inputs = if new_arity <= old_arity {
        genome.nodes()[i].inputs[..new_arity].to_vec()
    } else {
        let mut links = genome.nodes()[i].inputs.clone();
        links.extend_from_slice(&new_node.inputs[old_arity..]);
        links
    };

    let node = genome.node_mut(i);
    node.kind = new_node.kind;
    node.inputs = inputs;
}

fn mutate_links<T, V>(genome: &mut Cgp<T, V>, i: usize)
where
    T: Ty,
    V: Clone + std::fmt::Debug,
{
    let arity = genome.nodes()[i].kind.arity();
    for link in 0..arity {
        let arg_type = genome.nodes()[i].kind.arg_types()[link].clone();
        if let Some(new_link) = random_compatible_index(genome.nodes(), i, &arg_type) {
            genome.node_mut(i).inputs[link] = new_link;
        }
    }
}

fn random_compatible_index<T: Ty, V>(nodes: &[CgpNode<T, V>], at: usize, wanted: &T) -> Option<usize> {
    let candidates: Vec<usize> = (0..at).filter(|&i| nodes[i].ty().is_subtype_of(wanted)).collect();
    if candidates.is_empty() {
        None
    } else {
        Some(*random::choose(&candidates))
    }
}
