//! A thread-local random provider.
//!
//! Every thread gets its own [`SmallRng`] seeded from a shared, mutex-guarded
//! global generator. This keeps the hot path (drawing a random node, a random
//! back-link, a random mutation site) lock-free while still letting tests
//! reproduce a run with [`set_seed`].

use rand::distr::uniform::SampleUniform;
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use std::cell::RefCell;
use std::ops::Range;
use std::sync::{Arc, LazyLock, Mutex};

static GLOBAL_RNG: LazyLock<Arc<Mutex<SmallRng>>> =
    LazyLock::new(|| Arc::new(Mutex::new(SmallRng::from_os_rng())));

thread_local! {
    static TLS_RNG: RefCell<SmallRng> = RefCell::new({
        let mut global = GLOBAL_RNG.lock().unwrap();
        SmallRng::seed_from_u64(global.next_u64())
    });
}

fn with_rng<R>(f: impl FnOnce(&mut SmallRng) -> R) -> R {
    TLS_RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Reseeds the shared global generator; new threads created afterwards draw
/// their thread-local seed from it. Existing threads keep their current state
/// unless [`scoped_seed`] is used.
pub fn set_seed(seed: u64) {
    let mut global = GLOBAL_RNG.lock().unwrap();
    *global = SmallRng::seed_from_u64(seed);
    TLS_RNG.with(|cell| *cell.borrow_mut() = SmallRng::seed_from_u64(global.next_u64()));
}

/// Runs `f` with this thread's RNG temporarily reseeded, then restores it.
/// Used by tests that need a specific, reproducible sequence of draws.
pub fn scoped_seed<R>(seed: u64, f: impl FnOnce() -> R) -> R {
    TLS_RNG.with(|cell| {
        let original = {
            let mut rng = cell.borrow_mut();
            let original = rng.clone();
            *rng = SmallRng::seed_from_u64(seed);
            original
        };

        let result = f();
        *cell.borrow_mut() = original;
        result
    })
}

/// A uniform random value: `[0, 1)` for floats, `[0, MAX]` for integers.
#[inline]
pub fn random<T>() -> T
where
    T: SampleUniform,
    StandardUniform: Distribution<T>,
{
    with_rng(|rng| rng.random())
}

/// A random boolean, true with probability `prob`.
#[inline]
pub fn bool(prob: f32) -> bool {
    with_rng(|rng| rng.random_bool(prob.clamp(0.0, 1.0) as f64))
}

/// A random value uniformly drawn from `range`.
#[inline]
pub fn range<T>(range: Range<T>) -> T
where
    T: SampleUniform + PartialOrd,
{
    with_rng(|rng| rng.random_range(range))
}

/// A random index into `0..len`. Panics if `len == 0`.
#[inline]
pub fn index(len: usize) -> usize {
    range(0..len)
}

/// A reference to a uniformly chosen element of `items`. Panics on an empty slice.
pub fn choose<T>(items: &[T]) -> &T {
    with_rng(|rng| items.choose(rng).expect("choose called on empty slice"))
}

/// A sample from `Normal(mean, std_dev)`, via the Box-Muller transform.
pub fn gaussian(mean: f64, std_dev: f64) -> f64 {
    with_rng(|rng| {
        let u1: f64 = rng.random_range(f64::EPSILON..1.0);
        let u2: f64 = rng.random();
        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z0
    })
}

/// Shuffles `items` in place.
pub fn shuffle<T>(items: &mut [T]) {
    with_rng(|rng| items.shuffle(rng));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_runs_reproduce() {
        let a = scoped_seed(7, || (0..10).map(|_| range(0..1000)).collect::<Vec<i32>>());
        let b = scoped_seed(7, || (0..10).map(|_| range(0..1000)).collect::<Vec<i32>>());
        assert_eq!(a, b);
    }

    #[test]
    fn bool_respects_extremes() {
        scoped_seed(1, || {
            assert!(!bool(0.0));
            assert!(bool(1.0));
        });
    }

    #[test]
    fn choose_picks_a_member() {
        let items = [1, 2, 3, 4];
        scoped_seed(2, || {
            for _ in 0..20 {
                assert!(items.contains(choose(&items)));
            }
        });
    }
}
