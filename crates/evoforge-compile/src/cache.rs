//! The compiled-callable cache, kept 1:1 alongside a genome but outside it —
//! per the design note in `SPEC_FULL.md` §5, genome equality must ignore
//! caches, which is automatic if the cache simply isn't a genome field.
//!
//! Caching tolerates the benign race §5 describes: two threads racing on an
//! empty cache may both compile; the lock is held only around the swap, so
//! the last writer wins and either program is a correct compilation of the
//! same fingerprint.

use std::sync::{Arc, RwLock};

use evoforge_error::Result;

use crate::compiler::Compile;
use crate::program::Program;
use crate::registry::Registry;
use crate::value::Value;

#[derive(Clone)]
struct Compiled {
    fingerprint: u64,
    program: Arc<Program>,
}

/// A genome paired with its compiled-program cache. `recache` skips
/// recompilation when the genome's fingerprint is unchanged; `force_recache`
/// overrides that.
pub struct CachedGenome<G> {
    pub genome: G,
    cache: RwLock<Option<Compiled>>,
}

impl<G> CachedGenome<G> {
    pub fn new(genome: G) -> Self {
        CachedGenome { genome, cache: RwLock::new(None) }
    }
}

impl<G: Compile> CachedGenome<G> {
    /// Recompiles only if the fingerprint changed (or `force_recache` is
    /// set). Returns the program that is now current in the cache.
    pub fn recache(&self, force_recache: bool) -> Result<Arc<Program>> {
        let fingerprint = self.genome.fingerprint();

        if !force_recache {
            if let Some(current) = &*self.cache.read().unwrap() {
                if current.fingerprint == fingerprint {
                    return Ok(current.program.clone());
                }
            }
        }

        let program = Arc::new(self.genome.compile_program()?);
        let mut slot = self.cache.write().unwrap();
        *slot = Some(Compiled { fingerprint, program: program.clone() });
        Ok(program)
    }

    /// Evaluates the genome, compiling (or reusing the cached compile) as
    /// needed.
    pub fn call(&self, registry: &Registry, inputs: &[Value]) -> Result<Vec<Value>> {
        let program = self.recache(false)?;
        program.eval(registry, inputs)
    }

    pub fn is_cached(&self) -> bool {
        self.cache.read().unwrap().is_some()
    }
}

impl<G: Clone> Clone for CachedGenome<G> {
    /// A clone starts with an empty cache — it's a 1:1 association with a
    /// genome *value*, and a just-cloned genome hasn't been compiled yet in
    /// this lineage.
    fn clone(&self) -> Self {
        CachedGenome { genome: self.genome.clone(), cache: RwLock::new(None) }
    }
}

impl<G: std::fmt::Debug> std::fmt::Debug for CachedGenome<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedGenome")
            .field("genome", &self.genome)
            .field("cached", &self.is_cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoforge_genome::cgp::{Cgp, CgpOptions};
    use evoforge_lang::{Language, LangEntry, SymbolType};
    use std::sync::Arc as StdArc;

    const FLOAT: SymbolType = SymbolType::leaf("float");

    fn lang() -> StdArc<Language<SymbolType, Value>> {
        StdArc::new(
            Language::new(vec![
                LangEntry::Function { name: "add".into(), return_type: FLOAT, arg_types: vec![FLOAT, FLOAT] },
                LangEntry::Constant { value: Value::Float(1.0), ty: FLOAT },
            ])
            .unwrap(),
        )
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register("add", |a| Value::Float(a[0].as_float().unwrap() + a[1].as_float().unwrap()));
        reg
    }

    #[test]
    fn recache_is_a_noop_when_fingerprint_unchanged() {
        let inputs = vec![("x".to_string(), FLOAT)];
        let genome =
            Cgp::rand_genome(inputs, vec![], vec![FLOAT], lang(), 6, CgpOptions::default(), &|| (Value::Float(0.0), FLOAT))
                .unwrap();
        let cached = CachedGenome::new(genome);

        let first = cached.recache(false).unwrap();
        let second = cached.recache(false).unwrap();
        assert!(Arc::ptr_eq(&first, &second), "unchanged fingerprint must reuse the same compiled program");
    }

    #[test]
    fn call_evaluates_through_the_cache() {
        let inputs = vec![("x".to_string(), FLOAT)];
        let genome =
            Cgp::rand_genome(inputs, vec![], vec![FLOAT], lang(), 4, CgpOptions::default(), &|| (Value::Float(0.0), FLOAT))
                .unwrap();
        let cached = CachedGenome::new(genome);
        let reg = registry();
        let out = cached.call(&reg, &[Value::Float(2.0)]).unwrap();
        assert_eq!(out.len(), 1);
    }
}
