//! Resolves a language entry's function name to an invocable primitive —
//! the "operator-symbol resolver" §6 describes as part of the (externally
//! supplied) language interface. The operator vocabularies themselves
//! (arithmetic, logic, typed-basic, ...) are out of scope; this just holds
//! whatever the caller registers.

use evoforge_error::{evo_err, Result};
use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

pub type OpImpl = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone, Default)]
pub struct Registry {
    ops: HashMap<String, OpImpl>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { ops: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> &mut Self {
        self.ops.insert(name.into(), Arc::new(f));
        self
    }

    pub fn get(&self, name: &str) -> Result<&OpImpl> {
        self.ops.get(name).ok_or_else(|| evo_err!(Compile: "no registered operator named '{}'", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_op_is_invocable() {
        let mut reg = Registry::new();
        reg.register("add", |args| {
            Value::Int(args[0].as_int().unwrap() + args[1].as_int().unwrap())
        });
        let f = reg.get("add").unwrap();
        assert_eq!(f(&[Value::Int(2), Value::Int(3)]), Value::Int(5));
    }

    #[test]
    fn missing_op_is_a_compile_error() {
        let reg = Registry::new();
        let err = reg.get("nope").unwrap_err();
        assert_eq!(err.code(), evoforge_error::ErrorCode::Compile);
    }
}
