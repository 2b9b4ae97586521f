//! Cartesian Genetic Programming: a flat, indexed vector of nodes. A
//! function node's input links are indices strictly less than its own
//! position, which is what makes acyclicity a structural invariant rather
//! than something checked by traversal.

use evoforge_core::random;
use evoforge_error::{evo_err, Result};
use evoforge_lang::{ErcGen, Language, LangEntry, Ty};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::node::NodeKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CgpOptions {
    pub erc_prob: f64,
    /// Bounded retries `rand_node` spends trying another language entry
    /// before giving up with `NoTypedNode`.
    pub max_tries: usize,
}

impl Default for CgpOptions {
    fn default() -> Self {
        CgpOptions { erc_prob: 0.0, max_tries: 8 }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CgpNode<T, V> {
    pub kind: NodeKind<T, V>,
    /// Back-links: each is a node index strictly less than this node's own
    /// index. Stored absolute for simplicity; `offset_from` recovers the
    /// relative back-offset the spec describes.
    pub inputs: Vec<usize>,
    pub last_use: u64,
}

impl<T: Ty, V> CgpNode<T, V> {
    pub fn ty(&self) -> &T {
        self.kind.ty()
    }

    /// The back-offset of `self`'s `link`-th input, as seen from `at_index`
    /// (`self`'s own position in the node vector).
    pub fn offset_from(&self, at_index: usize, link: usize) -> usize {
        at_index - self.inputs[link]
    }
}

/// Draws one random node for position `at` in a CGP node vector: with
/// probability `options.erc_prob`, an ERC; otherwise a random language entry
/// whose arguments are filled by uniformly chosen earlier nodes of a
/// compatible type. Retries up to `options.max_tries` language entries
/// before failing with `NoTypedNode`.
pub fn rand_node<T, V>(
    lang: &Language<T, V>,
    existing: &[CgpNode<T, V>],
    at: usize,
    options: &CgpOptions,
    erc_gen: &impl ErcGen<T, V>,
) -> Result<CgpNode<T, V>>
where
    T: Ty,
    V: Clone,
{
    if options.erc_prob > 0.0 && random::bool(options.erc_prob as f32) {
        let (value, ty) = erc_gen.generate();
        return Ok(CgpNode { kind: NodeKind::Erc { value, ty }, inputs: Vec::new(), last_use: 0 });
    }

    for _ in 0..options.max_tries.max(1) {
        let entry = lang.random_entry();
        let LangEntry::Function { name, return_type, arg_types } = entry else {
            let LangEntry::Constant { value, ty } = entry else { unreachable!() };
            return Ok(CgpNode {
                kind: NodeKind::Constant { value: value.clone(), ty: ty.clone() },
                inputs: Vec::new(),
                last_use: 0,
            });
        };

        if !arg_types.is_empty() && at == 0 {
            continue; // no earlier nodes to link to
        }

        let mut links = Vec::with_capacity(arg_types.len());
        let mut ok = true;
        for arg_type in arg_types {
            match random_compatible_index(existing, at, arg_type) {
                Some(idx) => links.push(idx),
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            return Ok(CgpNode {
                kind: NodeKind::Function {
                    name: name.clone(),
                    return_type: return_type.clone(),
                    arg_types: arg_types.clone(),
                },
                inputs: links,
                last_use: 0,
            });
        }
    }

    Err(evo_err!(NoTypedNode: "no compatible earlier node after {} tries", options.max_tries))
}

fn random_compatible_index<T: Ty, V>(existing: &[CgpNode<T, V>], at: usize, wanted: &T) -> Option<usize> {
    let candidates: Vec<usize> = (0..at).filter(|&i| existing[i].ty().is_subtype_of(wanted)).collect();
    if candidates.is_empty() {
        None
    } else {
        Some(*random::choose(&candidates))
    }
}

/// A flat CGP genome: input and constant nodes occupy a fixed prefix of
/// `nodes`, followed by function/ERC nodes created by `rand_node`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cgp<T, V> {
    pub(crate) n_inputs: usize,
    pub(crate) n_fixed: usize,
    pub(crate) nodes: Vec<CgpNode<T, V>>,
    pub(crate) out_refs: Vec<usize>,
    pub(crate) out_types: Vec<T>,
    pub(crate) lang: Arc<Language<T, V>>,
    pub(crate) options: CgpOptions,
}

impl<T: Ty, V: Clone + std::fmt::Debug> Cgp<T, V> {
    pub fn empty_genome(
        inputs: Vec<(String, T)>,
        constants: Vec<(V, T)>,
        out_types: Vec<T>,
        lang: Arc<Language<T, V>>,
        options: CgpOptions,
    ) -> Self {
        let mut nodes = Vec::with_capacity(inputs.len() + constants.len());
        for (name, ty) in inputs {
            nodes.push(CgpNode { kind: NodeKind::Input { name, ty }, inputs: Vec::new(), last_use: 0 });
        }
        let n_inputs = nodes.len();
        for (value, ty) in constants {
            nodes.push(CgpNode { kind: NodeKind::Constant { value, ty }, inputs: Vec::new(), last_use: 0 });
        }
        let n_fixed = nodes.len();
        let n_out = out_types.len();
        Cgp {
            n_inputs,
            n_fixed,
            nodes,
            out_refs: vec![usize::MAX; n_out],
            out_types,
            lang,
            options,
        }
    }

    pub fn rand_genome(
        inputs: Vec<(String, T)>,
        constants: Vec<(V, T)>,
        out_types: Vec<T>,
        lang: Arc<Language<T, V>>,
        initial_size: usize,
        options: CgpOptions,
        erc_gen: &impl ErcGen<T, V>,
    ) -> Result<Self> {
        let mut genome = Self::empty_genome(inputs, constants, out_types, lang, options);
        let target = initial_size.max(genome.n_fixed);
        while genome.nodes.len() < target {
            let at = genome.nodes.len();
            let node = rand_node(&genome.lang, &genome.nodes, at, &genome.options, erc_gen)?;
            genome.nodes.push(node);
        }
        genome.init_out_refs()?;
        Ok(genome)
    }

    pub fn init_out_refs(&mut self) -> Result<()> {
        for i in 0..self.out_refs.len() {
            if self.out_refs[i] == usize::MAX {
                let out_type = self.out_types[i].clone();
                let idx = random_compatible_index(&self.nodes, self.nodes.len(), &out_type)
                    .ok_or_else(|| evo_err!(NoCompatibleOutput: "no node compatible with output type"))?;
                self.out_refs[i] = idx;
            }
        }
        Ok(())
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_fixed(&self) -> usize {
        self.n_fixed
    }

    pub fn nodes(&self) -> &[CgpNode<T, V>] {
        &self.nodes
    }

    pub fn out_refs(&self) -> &[usize] {
        &self.out_refs
    }

    pub fn out_types(&self) -> &[T] {
        &self.out_types
    }

    pub fn lang(&self) -> &Language<T, V> {
        &self.lang
    }

    pub fn options(&self) -> &CgpOptions {
        &self.options
    }

    pub fn is_executable(&self) -> bool {
        self.out_refs.iter().all(|&r| r != usize::MAX)
    }

    /// Direct mutable access to node `index`'s kind and input links.
    /// A structural primitive for variation policy; the caller is
    /// responsible for preserving the "inputs precede index" invariant.
    pub fn node_mut(&mut self, index: usize) -> &mut CgpNode<T, V> {
        &mut self.nodes[index]
    }

    pub fn set_out_ref(&mut self, output: usize, index: usize) {
        self.out_refs[output] = index;
    }

    /// All node indices reachable from `out_refs`, following `inputs`
    /// backward. `O(|active set|)`.
    pub fn active_set(&self) -> BTreeSet<usize> {
        let mut active = BTreeSet::new();
        let mut stack: Vec<usize> = self.out_refs.iter().copied().filter(|&r| r != usize::MAX).collect();
        while let Some(idx) = stack.pop() {
            if active.insert(idx) {
                stack.extend(self.nodes[idx].inputs.iter().copied());
            }
        }
        active
    }

    /// A fingerprint over the active subgraph only: inactive nodes may
    /// change freely (neutral drift) without perturbing this value.
    pub fn fingerprint(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        let active = self.active_set();
        for &idx in &active {
            idx.hash(&mut hasher);
            format!("{:?}", self.nodes[idx].kind).hash(&mut hasher);
            self.nodes[idx].inputs.hash(&mut hasher);
        }
        self.out_refs.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoforge_lang::SymbolType;

    const FLOAT: SymbolType = SymbolType::leaf("float");

    fn lang() -> Arc<Language<SymbolType, f64>> {
        Arc::new(
            Language::new(vec![
                LangEntry::Function { name: "add".into(), return_type: FLOAT, arg_types: vec![FLOAT, FLOAT] },
                LangEntry::Constant { value: 1.0, ty: FLOAT },
            ])
            .unwrap(),
        )
    }

    fn erc() -> impl Fn() -> (f64, SymbolType) {
        || (0.0, FLOAT)
    }

    #[test]
    fn rand_genome_is_executable_and_acyclic() {
        let inputs = vec![("x".to_string(), FLOAT)];
        let genome =
            Cgp::rand_genome(inputs, vec![], vec![FLOAT], lang(), 6, CgpOptions::default(), &erc()).unwrap();
        assert!(genome.is_executable());
        for (i, node) in genome.nodes().iter().enumerate() {
            for &link in &node.inputs {
                assert!(link < i, "link {link} must precede node {i}");
            }
        }
    }

    #[test]
    fn active_set_is_subset_of_nodes_and_contains_out_refs() {
        let inputs = vec![("x".to_string(), FLOAT)];
        let genome =
            Cgp::rand_genome(inputs, vec![], vec![FLOAT], lang(), 6, CgpOptions::default(), &erc()).unwrap();
        let active = genome.active_set();
        assert!(active.len() <= genome.nodes().len());
        for &r in genome.out_refs() {
            assert!(active.contains(&r));
        }
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let inputs = vec![("x".to_string(), FLOAT)];
        let genome =
            Cgp::rand_genome(inputs, vec![], vec![FLOAT], lang(), 6, CgpOptions::default(), &erc()).unwrap();
        assert_eq!(genome.fingerprint(), genome.fingerprint());
    }
}
