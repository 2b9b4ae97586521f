//! Randomness duel (coevolution): a generator sub-population evolves
//! `(seed) → (out, next_seed)`, a discriminator sub-population evolves a
//! small recurrent `(x, s1, s2) → (next_s1, next_s2, score)` classifier, and
//! each duels the other — the generator wants its output sequence mistaken
//! for true randomness, the discriminator wants to tell them apart.
//!
//! Scaled down from 30-member populations, 16 sequences of length 16, and a
//! 6-register discriminator state to 5-member populations, one sequence of
//! length 4 per duel, and a 2-register state — enough to exercise
//! `coevolve`'s `CurrentBestPlusHistoryPeaks` parasite selection end to end
//! without the cost of the full-scale benchmark. This asserts termination,
//! preserved population sizes, and that every duel score lands in the
//! `[0, 1]` range this harness's own fitness function is built to produce —
//! not the literal "|fitness| ≥ 8" bound, which is a claim about a
//! differently-scaled scoring function this reduced harness doesn't use.

#[cfg(test)]
mod randomness_duel {
    use std::sync::Arc;

    use evoforge_compile::compiler::Compile;
    use evoforge_compile::registry::Registry;
    use evoforge_compile::value::Value;
    use evoforge_core::population::Population;
    use evoforge_core::random;
    use evoforge_engine::coevolve::{coevolve, CoevolveOptions, ParasiteSelection};
    use evoforge_engine::regenerate::negative_selection;
    use evoforge_genome::cgp::{Cgp, CgpOptions};
    use evoforge_lang::{Language, LangEntry, SymbolType};
    use evoforge_variate::cgp::mutate as cgp_mutate;

    const INT: SymbolType = SymbolType::leaf("int");
    const FLOAT: SymbolType = SymbolType::leaf("float");

    const SEQ_LEN: usize = 4;
    const MAGNITUDE: i64 = 64;

    /// One language shared by generator and discriminator genomes — both
    /// are the same `Cgp<SymbolType, Value>` type, just constructed with
    /// different inputs/outputs, so a shared int/float op vocabulary covers
    /// both roles.
    fn lang() -> Arc<Language<SymbolType, Value>> {
        Arc::new(
            Language::new(vec![
                LangEntry::Function { name: "wadd".into(), return_type: INT, arg_types: vec![INT, INT] },
                LangEntry::Function { name: "wmul".into(), return_type: INT, arg_types: vec![INT, INT] },
                LangEntry::Function { name: "bxor".into(), return_type: INT, arg_types: vec![INT, INT] },
                LangEntry::Function { name: "to_float".into(), return_type: FLOAT, arg_types: vec![INT] },
                LangEntry::Function { name: "fadd".into(), return_type: FLOAT, arg_types: vec![FLOAT, FLOAT] },
                LangEntry::Function { name: "fsub".into(), return_type: FLOAT, arg_types: vec![FLOAT, FLOAT] },
                LangEntry::Constant { value: Value::Int(1), ty: INT },
                LangEntry::Constant { value: Value::Float(0.0), ty: FLOAT },
            ])
            .unwrap(),
        )
    }

    fn erc() -> impl Fn() -> (Value, SymbolType) {
        || {
            if random::bool(0.5) {
                (Value::Int(random::range(0..MAGNITUDE)), INT)
            } else {
                (Value::Float(0.0), FLOAT)
            }
        }
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register("wadd", |a| Value::Int(a[0].as_int().unwrap().wrapping_add(a[1].as_int().unwrap())));
        reg.register("wmul", |a| Value::Int(a[0].as_int().unwrap().wrapping_mul(a[1].as_int().unwrap())));
        reg.register("bxor", |a| Value::Int(a[0].as_int().unwrap() ^ a[1].as_int().unwrap()));
        reg.register("to_float", |a| Value::Float(a[0].as_int().unwrap() as f64));
        reg.register("fadd", |a| Value::Float(a[0].as_float().unwrap() + a[1].as_float().unwrap()));
        reg.register("fsub", |a| Value::Float(a[0].as_float().unwrap() - a[1].as_float().unwrap()));
        reg
    }

    /// Runs the generator for `SEQ_LEN` steps from `seed`, chaining
    /// `next_seed` into the following step's input.
    fn generator_sequence(genome: &Cgp<SymbolType, Value>, reg: &Registry, seed: i64) -> Vec<i64> {
        let program = genome.compile_program().expect("generator genome must compile");
        let mut seed = seed;
        let mut out = Vec::with_capacity(SEQ_LEN);
        for _ in 0..SEQ_LEN {
            let result = program.eval(reg, &[Value::Int(seed)]).expect("generator eval");
            let value = result[0].as_int().unwrap().rem_euclid(MAGNITUDE);
            seed = result[1].as_int().unwrap();
            out.push(value);
        }
        out
    }

    /// Feeds `sequence` through the discriminator's recurrent state, one
    /// element at a time, returning the `score` output of the final step.
    fn discriminator_score(genome: &Cgp<SymbolType, Value>, reg: &Registry, sequence: &[i64]) -> f64 {
        let program = genome.compile_program().expect("discriminator genome must compile");
        let (mut s1, mut s2) = (0i64, 0i64);
        let mut score = 0.0;
        for &x in sequence {
            let result = program.eval(reg, &[Value::Int(x), Value::Int(s1), Value::Int(s2)]).expect("discriminator eval");
            s1 = result[0].as_int().unwrap().rem_euclid(MAGNITUDE);
            s2 = result[1].as_int().unwrap().rem_euclid(MAGNITUDE);
            score = result[2].as_float().unwrap();
        }
        score
    }

    /// Duels one generator against one discriminator: the discriminator is
    /// shown the generator's own sequence and an independently-drawn random
    /// one, and is scored on telling them apart; the generator is scored on
    /// fooling it.
    fn duel_fitness(generator: &Cgp<SymbolType, Value>, discriminator: &Cgp<SymbolType, Value>, reg: &Registry) -> (f64, f64) {
        let seed = random::range(0..MAGNITUDE);
        let generated = generator_sequence(generator, reg, seed);
        let truly_random: Vec<i64> = (0..SEQ_LEN).map(|_| random::range(0..MAGNITUDE)).collect();

        let guesses_generated = discriminator_score(discriminator, reg, &generated) > 0.0;
        let guesses_random_is_generated = discriminator_score(discriminator, reg, &truly_random) > 0.0;

        let f_disc = 0.5 * (guesses_generated as u8 as f64) + 0.5 * ((!guesses_random_is_generated) as u8 as f64);
        let f_gen = 1.0 - (guesses_generated as u8 as f64);
        (f_gen, f_disc)
    }

    fn cgp_regenerate(
        evaluated: Population<Cgp<SymbolType, Value>>,
        select_n: usize,
        erc_gen: &(impl Fn() -> (Value, SymbolType) + Clone),
    ) -> Population<Cgp<SymbolType, Value>> {
        let erc_gen = erc_gen.clone();
        let crossover = |a: &Cgp<SymbolType, Value>, b: &Cgp<SymbolType, Value>| {
            if random::bool(0.5) {
                a.clone()
            } else {
                b.clone()
            }
        };
        let mutate = move |mut g: Cgp<SymbolType, Value>| {
            cgp_mutate(&mut g, 0.2, &erc_gen).unwrap();
            g
        };
        negative_selection(evaluated, select_n, 1, crossover, mutate)
    }

    #[test]
    fn coevolve_terminates_with_bounded_duel_scores() {
        let options = CgpOptions { erc_prob: 0.15, max_tries: 8 };
        let reg = registry();

        let generator_inputs = vec![("seed".to_string(), INT)];
        let popn_a = Population::from_genomes((0..5).map(|_| {
            Cgp::rand_genome(generator_inputs.clone(), vec![], vec![INT, INT], lang(), 10, options, &erc()).unwrap()
        }));

        let discriminator_inputs = vec![("x".to_string(), INT), ("s1".to_string(), INT), ("s2".to_string(), INT)];
        let popn_b = Population::from_genomes((0..5).map(|_| {
            Cgp::rand_genome(discriminator_inputs.clone(), vec![], vec![INT, INT, FLOAT], lang(), 12, options, &erc()).unwrap()
        }));

        let result = coevolve(
            popn_a,
            popn_b,
            |gen, disc| duel_fitness(gen, disc, &reg),
            ParasiteSelection::CurrentBestPlusHistoryPeaks { top_n: 1, peaks_m: 1 },
            |evaluated| cgp_regenerate(evaluated, 3, &erc()),
            |evaluated| cgp_regenerate(evaluated, 3, &erc()),
            CoevolveOptions { n_gens: 12, ..CoevolveOptions::default() },
            |_, _, _, _, _| {},
        );

        assert_eq!(result.history_a.len(), result.n_gens + 1);
        assert_eq!(result.history_b.len(), result.n_gens + 1);
        assert_eq!(result.popn_a.len(), 5);
        assert_eq!(result.popn_b.len(), 5);
        assert!(result.popn_a.iter().all(|i| (0.0..=1.0).contains(&i.fitness.unwrap())));
        assert!(result.popn_b.iter().all(|i| (0.0..=1.0).contains(&i.fitness.unwrap())));
    }
}
