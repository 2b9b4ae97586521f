//! The operator vocabulary a genome is built from: a declared, immutable set
//! of [`LangEntry`] values (functions and constants) over a type domain that
//! only has to answer `is_subtype_of`.
//!
//! The type domain itself is left to the caller — [`Ty`] is a trait, not an
//! enum, because the system is meant to run over whatever type hierarchy a
//! problem brings (booleans, floats, a tagged "action" hierarchy for the ant
//! trail problem, ...). [`SymbolType`] is a small ready-made hierarchy for
//! callers who just want named types with explicit subtype edges.

use evoforge_core::random;
use evoforge_error::{evo_err, Result};
use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A type in the language's type domain. The only operation the rest of the
/// system needs is `is_subtype_of`: whether a value of `self`'s type may be
/// used where `other` is declared.
pub trait Ty: Clone + PartialEq + Eq + std::hash::Hash + Debug {
    fn is_subtype_of(&self, other: &Self) -> bool;
}

/// Generates an Ephemeral Random Constant: a `(value, type)` pair drawn at
/// node-creation time. Blanket-implemented for any `Fn() -> (V, T)`, so a
/// plain closure satisfies this without naming the trait.
pub trait ErcGen<T: Ty, V> {
    fn generate(&self) -> (V, T);
}

impl<T: Ty, V, F: Fn() -> (V, T)> ErcGen<T, V> for F {
    fn generate(&self) -> (V, T) {
        self()
    }
}

/// One entry of a [`Language`]: either a function spec or a constant spec.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LangEntry<T, V> {
    Function {
        name: String,
        return_type: T,
        arg_types: Vec<T>,
    },
    Constant {
        value: V,
        ty: T,
    },
}

impl<T: Ty, V> LangEntry<T, V> {
    /// `|arg_types|` for a function entry, `0` for a constant.
    pub fn arity(&self) -> usize {
        match self {
            LangEntry::Function { arg_types, .. } => arg_types.len(),
            LangEntry::Constant { .. } => 0,
        }
    }

    pub fn return_type(&self) -> &T {
        match self {
            LangEntry::Function { return_type, .. } => return_type,
            LangEntry::Constant { ty, .. } => ty,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, LangEntry::Function { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, LangEntry::Constant { .. })
    }
}

/// An immutable, validated operator vocabulary. Constructed once per run;
/// `rand_node` and `mutate` draw entries from it but never modify it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Language<T, V> {
    entries: Vec<LangEntry<T, V>>,
}

impl<T: Ty, V> Language<T, V> {
    /// Validates and builds a language: fails with `InvalidLanguage` if
    /// `entries` is empty. A function entry's arity is its `arg_types` length
    /// by construction, so there is nothing further to check there; the type
    /// domain itself is validated by `T`'s own construction, not here.
    pub fn new(entries: Vec<LangEntry<T, V>>) -> Result<Self> {
        if entries.is_empty() {
            return Err(evo_err!(InvalidLanguage: "a language must declare at least one entry"));
        }
        Ok(Language { entries })
    }

    pub fn entries(&self) -> &[LangEntry<T, V>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A uniformly chosen entry, of any return type.
    pub fn random_entry(&self) -> &LangEntry<T, V> {
        random::choose(&self.entries)
    }

    /// All entries whose return type is a subtype of `wanted`.
    pub fn compatible_entries(&self, wanted: &T) -> Vec<&LangEntry<T, V>> {
        self.entries
            .iter()
            .filter(|e| e.return_type().is_subtype_of(wanted))
            .collect()
    }

    /// A uniformly chosen entry among those whose return type is compatible
    /// with `wanted`, or `None` if the language has no such entry.
    pub fn random_compatible(&self, wanted: &T) -> Option<&LangEntry<T, V>> {
        let candidates = self.compatible_entries(wanted);
        if candidates.is_empty() {
            None
        } else {
            Some(*random::choose(&candidates))
        }
    }
}

/// A minimal ready-made type domain: named types with explicitly declared
/// parent edges, for callers who don't need a richer hierarchy. Two
/// `SymbolType`s with the same name are always mutually sub/supertypes;
/// `is_subtype_of` otherwise walks the declared parent chain.
///
/// This does not attempt general multiple inheritance or lattice joins —
/// just the single-parent chain the ant-trail `action` hierarchy and similar
/// toy domains need.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymbolType {
    name: &'static str,
    parent: Option<&'static str>,
}

impl SymbolType {
    pub const fn leaf(name: &'static str) -> Self {
        SymbolType { name, parent: None }
    }

    pub const fn child_of(name: &'static str, parent: &'static str) -> Self {
        SymbolType {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Ty for SymbolType {
    fn is_subtype_of(&self, other: &Self) -> bool {
        self.name == other.name || self.parent == Some(other.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOAT: SymbolType = SymbolType::leaf("float");
    const BOOL: SymbolType = SymbolType::leaf("bool");
    const ACTION: SymbolType = SymbolType::leaf("action");
    const MOVE: SymbolType = SymbolType::child_of("move", "action");

    fn lang() -> Language<SymbolType, f64> {
        Language::new(vec![
            LangEntry::Function {
                name: "add".into(),
                return_type: FLOAT,
                arg_types: vec![FLOAT, FLOAT],
            },
            LangEntry::Function {
                name: "gt".into(),
                return_type: BOOL,
                arg_types: vec![FLOAT, FLOAT],
            },
            LangEntry::Constant { value: 0.0, ty: FLOAT },
        ])
        .unwrap()
    }

    #[test]
    fn empty_language_is_invalid() {
        let err = Language::<SymbolType, f64>::new(vec![]).unwrap_err();
        assert_eq!(err.code(), evoforge_error::ErrorCode::InvalidLanguage);
    }

    #[test]
    fn arity_matches_arg_types() {
        let l = lang();
        let add = l.entries().iter().find(|e| e.is_function()).unwrap();
        assert_eq!(add.arity(), 2);
    }

    #[test]
    fn compatible_entries_filters_by_return_type() {
        let l = lang();
        let bools = l.compatible_entries(&BOOL);
        assert_eq!(bools.len(), 1);
        assert!(l.random_compatible(&BOOL).is_some());
    }

    #[test]
    fn subtype_walks_single_parent_chain() {
        assert!(MOVE.is_subtype_of(&ACTION));
        assert!(!ACTION.is_subtype_of(&MOVE));
        assert!(FLOAT.is_subtype_of(&FLOAT));
    }

    #[test]
    fn erc_gen_closure_satisfies_trait() {
        let gen = || (3.5, FLOAT);
        let (v, t) = gen.generate();
        assert_eq!(v, 3.5);
        assert_eq!(t, FLOAT);
    }
}
