//! The content every node carries, independent of how a genome links nodes
//! together. Tree, CGP, and ICGP each wrap this in their own link
//! representation (recursive children, relative back-offsets, absolute ids).

use evoforge_lang::Ty;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A node's content, tagged per §3: `Input`, `Constant`, `Function`, `Erc`.
/// Link targets are deliberately not part of this type — `Function`'s
/// input references live in the owning genome's link representation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind<T, V> {
    Input { name: String, ty: T },
    Constant { value: V, ty: T },
    Function {
        name: String,
        return_type: T,
        arg_types: Vec<T>,
    },
    /// Ephemeral Random Constant: a constant whose value was drawn at
    /// creation time from the language's `erc_gen`.
    Erc { value: V, ty: T },
}

impl<T: Ty, V> NodeKind<T, V> {
    pub fn ty(&self) -> &T {
        match self {
            NodeKind::Input { ty, .. } => ty,
            NodeKind::Constant { ty, .. } => ty,
            NodeKind::Function { return_type, .. } => return_type,
            NodeKind::Erc { ty, .. } => ty,
        }
    }

    /// `|arg_types|` for a function node, `0` otherwise — the number of
    /// input links this node's kind demands.
    pub fn arity(&self) -> usize {
        match self {
            NodeKind::Function { arg_types, .. } => arg_types.len(),
            _ => 0,
        }
    }

    pub fn arg_types(&self) -> &[T] {
        match self {
            NodeKind::Function { arg_types, .. } => arg_types,
            _ => &[],
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, NodeKind::Input { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, NodeKind::Function { .. })
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_function()
    }

    pub fn function_name(&self) -> Option<&str> {
        match self {
            NodeKind::Function { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoforge_lang::SymbolType;

    const FLOAT: SymbolType = SymbolType::leaf("float");

    #[test]
    fn function_arity_is_arg_type_count() {
        let f: NodeKind<SymbolType, f64> = NodeKind::Function {
            name: "add".into(),
            return_type: FLOAT,
            arg_types: vec![FLOAT, FLOAT],
        };
        assert_eq!(f.arity(), 2);
        assert!(f.is_function());
    }

    #[test]
    fn terminal_has_zero_arity() {
        let c: NodeKind<SymbolType, f64> = NodeKind::Constant { value: 1.0, ty: FLOAT };
        assert_eq!(c.arity(), 0);
        assert!(c.is_terminal());
    }
}
