//! ICGP id stability: a mutation pass that never touches an active node must
//! leave the cached callable's identity (and the fingerprint it's keyed on)
//! untouched; a pass that repoints an output onto a different node must
//! change both.

#[cfg(test)]
mod icgp_id_stability {
    use std::sync::Arc;

    use evoforge_compile::cache::CachedGenome;
    use evoforge_compile::compiler::Compile;
    use evoforge_compile::registry::Registry;
    use evoforge_compile::value::Value;
    use evoforge_genome::icgp::{Icgp, IcgpOptions};
    use evoforge_lang::{Language, LangEntry, SymbolType};
    use evoforge_variate::icgp::vary_neutral;

    const FLOAT: SymbolType = SymbolType::leaf("float");

    fn lang() -> Arc<Language<SymbolType, Value>> {
        Arc::new(
            Language::new(vec![
                LangEntry::Function { name: "add".into(), return_type: FLOAT, arg_types: vec![FLOAT, FLOAT] },
                LangEntry::Constant { value: Value::Float(1.0), ty: FLOAT },
            ])
            .unwrap(),
        )
    }

    fn erc() -> impl Fn() -> (Value, SymbolType) {
        || (Value::Float(0.0), FLOAT)
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register("add", |a| Value::Float(a[0].as_float().unwrap() + a[1].as_float().unwrap()));
        reg
    }

    /// Two pinned constants, output wired to the first — gives a second,
    /// type-compatible node to repoint the output onto later without any
    /// randomized search.
    fn genome() -> Icgp<SymbolType, Value> {
        let mut genome = Icgp::<SymbolType, Value>::empty_genome(
            vec![],
            vec![(Value::Float(1.0), FLOAT), (Value::Float(2.0), FLOAT)],
            vec![FLOAT],
            lang(),
            IcgpOptions::default(),
        );
        let ids: Vec<_> = genome.nodes().keys().copied().collect();
        genome.set_out_ref(0, ids[0]);
        genome
    }

    #[test]
    fn neutral_growth_preserves_cached_identity() {
        let mut cached = CachedGenome::new(genome());
        let reg = registry();

        let before = cached.call(&reg, &[]).unwrap();
        let program_before = cached.recache(false).unwrap();
        let fingerprint_before = cached.genome.fingerprint();

        let target_size = cached.genome.nodes().len() + 1;
        vary_neutral(&mut cached.genome, target_size, &erc()).unwrap();

        assert_eq!(cached.genome.fingerprint(), fingerprint_before, "growing an inactive node must not touch out_refs");
        let program_after = cached.recache(false).unwrap();
        assert!(Arc::ptr_eq(&program_before, &program_after), "unchanged fingerprint must reuse the cached program");
        assert_eq!(cached.call(&reg, &[]).unwrap(), before);
    }

    #[test]
    fn repointing_an_output_changes_identity_and_fingerprint() {
        let mut cached = CachedGenome::new(genome());
        let reg = registry();
        let ids: Vec<_> = cached.genome.nodes().keys().copied().collect();

        let program_before = cached.recache(false).unwrap();
        let fingerprint_before = cached.genome.fingerprint();

        cached.genome.set_out_ref(0, ids[1]);

        let fingerprint_after = cached.genome.fingerprint();
        let program_after = cached.recache(false).unwrap();

        assert_ne!(fingerprint_after, fingerprint_before);
        assert!(!Arc::ptr_eq(&program_before, &program_after));
        assert_eq!(cached.call(&reg, &[]).unwrap(), vec![Value::Float(2.0)]);
    }
}
