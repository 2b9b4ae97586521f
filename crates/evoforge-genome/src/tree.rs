//! The Tree genome: a forest of nested expressions, one per declared output.
//! There is no separate node store or back-link indirection — a tree's
//! "output reference" *is* its root node, so acyclicity and reachability
//! hold by construction; the invariants worth enforcing are arity, type
//! compatibility, and `max_expr_depth`.

use evoforge_core::random;
use evoforge_error::{evo_err, Result};
use evoforge_lang::{ErcGen, Language, LangEntry, Ty};
use std::sync::Arc;

use crate::node::NodeKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeOptions {
    pub max_expr_depth: usize,
    pub terminal_prob: f64,
    pub erc_prob: f64,
}

impl Default for TreeOptions {
    fn default() -> Self {
        TreeOptions {
            max_expr_depth: 8,
            terminal_prob: 0.5,
            erc_prob: 0.0,
        }
    }
}

/// One node of a tree, owning its children directly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeNode<T, V> {
    pub kind: NodeKind<T, V>,
    pub children: Vec<TreeNode<T, V>>,
    pub last_use: u64,
}

impl<T: Ty, V: Clone + std::fmt::Debug> TreeNode<T, V> {
    pub fn leaf(kind: NodeKind<T, V>) -> Self {
        TreeNode {
            kind,
            children: Vec::new(),
            last_use: 0,
        }
    }

    pub fn ty(&self) -> &T {
        self.kind.ty()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    pub fn at(&self, path: &[usize]) -> &TreeNode<T, V> {
        path.iter().fold(self, |n, &i| &n.children[i])
    }

    pub fn replace_at(&mut self, path: &[usize], replacement: TreeNode<T, V>) {
        match path.split_first() {
            None => *self = replacement,
            Some((&head, rest)) => self.children[head].replace_at(rest, replacement),
        }
    }

    /// Every path (including the empty path, the root itself) reachable in
    /// this tree, depth-first.
    pub fn all_paths(&self) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(&mut prefix, &mut out);
        out
    }

    fn collect_paths(&self, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        out.push(prefix.clone());
        for (i, child) in self.children.iter().enumerate() {
            prefix.push(i);
            child.collect_paths(prefix, out);
            prefix.pop();
        }
    }
}

/// Grows a single typed expression tree of return type `demanded`, using the
/// "grow" method: below `options.max_expr_depth`, each node is a terminal
/// with probability `terminal_prob` (always a terminal once the depth limit
/// is hit); otherwise a compatible function is chosen and its arguments are
/// grown recursively.
pub fn grow<T, V>(
    lang: &Language<T, V>,
    inputs: &[(String, T)],
    demanded: &T,
    depth: usize,
    options: &TreeOptions,
    erc_gen: &impl ErcGen<T, V>,
) -> Result<TreeNode<T, V>>
where
    T: Ty,
    V: Clone + std::fmt::Debug,
{
    let at_depth_limit = depth >= options.max_expr_depth;
    let want_terminal = at_depth_limit || random::bool(options.terminal_prob as f32);

    if want_terminal {
        if let Some(node) = terminal(lang, inputs, demanded, options, erc_gen) {
            return Ok(node);
        }
        // No terminal of this type; fall through and try a function instead
        // so construction does not dead-end purely on draw probability.
    }

    let Some(entry) = lang.random_compatible(demanded) else {
        return Err(evo_err!(NoCompatibleOutput: "no language entry compatible with demanded type"));
    };

    match entry {
        LangEntry::Function { name, return_type, arg_types } => {
            let mut children = Vec::with_capacity(arg_types.len());
            for arg_type in arg_types {
                children.push(grow(lang, inputs, arg_type, depth + 1, options, erc_gen)?);
            }
            Ok(TreeNode {
                kind: NodeKind::Function {
                    name: name.clone(),
                    return_type: return_type.clone(),
                    arg_types: arg_types.clone(),
                },
                children,
                last_use: 0,
            })
        }
        LangEntry::Constant { value, ty } => Ok(TreeNode::leaf(NodeKind::Constant {
            value: value.clone(),
            ty: ty.clone(),
        })),
    }
}

fn terminal<T, V>(
    lang: &Language<T, V>,
    inputs: &[(String, T)],
    demanded: &T,
    options: &TreeOptions,
    erc_gen: &impl ErcGen<T, V>,
) -> Option<TreeNode<T, V>>
where
    T: Ty,
    V: Clone + std::fmt::Debug,
{
    if options.erc_prob > 0.0 && random::bool(options.erc_prob as f32) {
        let (value, ty) = erc_gen.generate();
        if ty.is_subtype_of(demanded) {
            return Some(TreeNode::leaf(NodeKind::Erc { value, ty }));
        }
    }

    let matching_inputs: Vec<&(String, T)> =
        inputs.iter().filter(|(_, ty)| ty.is_subtype_of(demanded)).collect();
    let matching_constants: Vec<&LangEntry<T, V>> = lang
        .entries()
        .iter()
        .filter(|e| e.is_constant() && e.return_type().is_subtype_of(demanded))
        .collect();

    if matching_inputs.is_empty() && matching_constants.is_empty() {
        return None;
    }

    let total = matching_inputs.len() + matching_constants.len();
    let pick = random::index(total);
    if pick < matching_inputs.len() {
        let (name, ty) = matching_inputs[pick];
        Some(TreeNode::leaf(NodeKind::Input {
            name: name.clone(),
            ty: ty.clone(),
        }))
    } else {
        match matching_constants[pick - matching_inputs.len()] {
            LangEntry::Constant { value, ty } => Some(TreeNode::leaf(NodeKind::Constant {
                value: value.clone(),
                ty: ty.clone(),
            })),
            LangEntry::Function { .. } => unreachable!("filtered to constants only"),
        }
    }
}

/// A forest of expression trees, one per declared output. `roots[i]` is
/// `None` only between `empty_genome` and `init_out_refs`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tree<T, V> {
    pub(crate) inputs: Vec<(String, T)>,
    pub(crate) roots: Vec<Option<TreeNode<T, V>>>,
    pub(crate) out_types: Vec<T>,
    pub(crate) lang: Arc<Language<T, V>>,
    pub(crate) options: TreeOptions,
}

impl<T: Ty, V: Clone + std::fmt::Debug> Tree<T, V> {
    pub fn empty_genome(
        inputs: Vec<(String, T)>,
        out_types: Vec<T>,
        lang: Arc<Language<T, V>>,
        options: TreeOptions,
    ) -> Self {
        let n_out = out_types.len();
        Tree {
            inputs,
            roots: (0..n_out).map(|_| None).collect(),
            out_types,
            lang,
            options,
        }
    }

    pub fn rand_genome(
        inputs: Vec<(String, T)>,
        out_types: Vec<T>,
        lang: Arc<Language<T, V>>,
        options: TreeOptions,
        erc_gen: &impl ErcGen<T, V>,
    ) -> Result<Self> {
        let mut genome = Self::empty_genome(inputs, out_types, lang, options);
        genome.init_out_refs(erc_gen)?;
        Ok(genome)
    }

    /// Grows a fresh root for every output still missing one.
    pub fn init_out_refs(&mut self, erc_gen: &impl ErcGen<T, V>) -> Result<()> {
        for i in 0..self.roots.len() {
            if self.roots[i].is_none() {
                let out_type = self.out_types[i].clone();
                let root = grow(&self.lang, &self.inputs, &out_type, 0, &self.options, erc_gen)?;
                self.roots[i] = Some(root);
            }
        }
        Ok(())
    }

    pub fn inputs(&self) -> &[(String, T)] {
        &self.inputs
    }

    pub fn out_types(&self) -> &[T] {
        &self.out_types
    }

    pub fn lang(&self) -> &Language<T, V> {
        &self.lang
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn root(&self, output: usize) -> Option<&TreeNode<T, V>> {
        self.roots[output].as_ref()
    }

    pub fn root_mut(&mut self, output: usize) -> Option<&mut TreeNode<T, V>> {
        self.roots[output].as_mut()
    }

    pub fn set_root(&mut self, output: usize, node: TreeNode<T, V>) {
        self.roots[output] = Some(node);
    }

    pub fn is_executable(&self) -> bool {
        self.roots.iter().all(Option::is_some)
    }

    /// Trims every output tree so `depth() <= max_expr_depth`: any subtree
    /// one level shy of the limit is collapsed to a single type-compatible
    /// terminal, so its former children never get the chance to push the
    /// tree one level past `max_expr_depth`.
    pub fn trim(&mut self, erc_gen: &impl ErcGen<T, V>) -> Result<()> {
        for root in self.roots.iter_mut().flatten() {
            trim_node(root, 0, self.options.max_expr_depth, &self.lang, &self.inputs, erc_gen)?;
        }
        Ok(())
    }

    /// A structural fingerprint over the active (= entire, for Tree) forest;
    /// changes whenever any output tree's shape or content changes.
    pub fn fingerprint(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for root in &self.roots {
            hash_node(root, &mut hasher);
        }
        hasher.finish()
    }
}

fn trim_node<T, V>(
    node: &mut TreeNode<T, V>,
    depth: usize,
    max_depth: usize,
    lang: &Language<T, V>,
    inputs: &[(String, T)],
    erc_gen: &impl ErcGen<T, V>,
) -> Result<()>
where
    T: Ty,
    V: Clone + std::fmt::Debug,
{
    if depth + 1 >= max_depth && !node.children.is_empty() {
        let demanded = node.ty().clone();
        let replacement = terminal(lang, inputs, &demanded, &TreeOptions::default(), erc_gen)
            .ok_or_else(|| evo_err!(NoCompatibleOutput: "no terminal to trim into for demanded type"))?;
        *node = replacement;
        return Ok(());
    }
    for child in node.children.iter_mut() {
        trim_node(child, depth + 1, max_depth, lang, inputs, erc_gen)?;
    }
    Ok(())
}

fn hash_node<T, V, H: std::hash::Hasher>(node: &Option<TreeNode<T, V>>, hasher: &mut H)
where
    T: std::fmt::Debug,
    V: std::fmt::Debug,
{
    use std::hash::Hash;
    match node {
        None => "none".hash(hasher),
        Some(n) => hash_present(n, hasher),
    }
}

fn hash_present<T, V, H: std::hash::Hasher>(node: &TreeNode<T, V>, hasher: &mut H)
where
    T: std::fmt::Debug,
    V: std::fmt::Debug,
{
    use std::hash::Hash;
    format!("{:?}", node.kind).hash(hasher);
    for child in &node.children {
        hash_present(child, hasher);
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
                LangEntry::Function {
                    name: "add".into(),
                    return_type: FLOAT,
                    arg_types: vec![FLOAT, FLOAT],
                },
                LangEntry::Constant { value: 1.0, ty: FLOAT },
            ])
            .unwrap(),
        )
    }

    fn erc() -> impl Fn() -> (f64, SymbolType) {
        || (0.0, FLOAT)
    }

    #[test]
    fn rand_genome_respects_max_depth() {
        let opts = TreeOptions { max_expr_depth: 3, terminal_prob: 0.1, erc_prob: 0.0 };
        let inputs = vec![("x".to_string(), FLOAT)];
        let genome = Tree::rand_genome(inputs, vec![FLOAT], lang(), opts, &erc()).unwrap();
        assert!(genome.is_executable());
        assert!(genome.root(0).unwrap().depth() <= opts.max_expr_depth + 1);
    }

    #[test]
    fn empty_genome_is_not_executable_until_init() {
        let inputs = vec![("x".to_string(), FLOAT)];
        let mut genome = Tree::empty_genome(inputs, vec![FLOAT], lang(), TreeOptions::default());
        assert!(!genome.is_executable());
        genome.init_out_refs(&erc()).unwrap();
        assert!(genome.is_executable());
    }

    #[test]
    fn trim_enforces_max_depth() {
        let opts = TreeOptions { max_expr_depth: 8, terminal_prob: 0.0, erc_prob: 0.0 };
        let inputs = vec![("x".to_string(), FLOAT)];
        let mut genome = Tree::rand_genome(inputs, vec![FLOAT], lang(), opts, &erc()).unwrap();
        genome.options.max_expr_depth = 2;
        genome.trim(&erc()).unwrap();
        assert!(genome.root(0).unwrap().depth() <= 2);
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let opts = TreeOptions { max_expr_depth: 3, terminal_prob: 0.1, erc_prob: 0.0 };
        let inputs = vec![("x".to_string(), FLOAT)];
        let mut a = Tree::rand_genome(inputs.clone(), vec![FLOAT], lang(), opts, &erc()).unwrap();
        let fp_before = a.fingerprint();
        a.roots[0] = Some(TreeNode::leaf(NodeKind::Constant { value: 42.0, ty: FLOAT }));
        assert_ne!(fp_before, a.fingerprint());
    }
}
