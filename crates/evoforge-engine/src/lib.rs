//! The discrete-generation population driver (§4.6–§4.8): `evolve_discrete`,
//! `simple_evolve`, regeneration policies, and `coevolve`.

pub mod coevolve;
pub mod options;
pub mod regenerate;
mod driver;

pub use driver::{evolve_discrete, simple_evolve, EvolveResult};
pub use options::EvolveOptions;

pub mod prelude {
    pub use crate::coevolve::{coevolve, CoevolveOptions, CoevolveResult, ParasiteSelection};
    pub use crate::driver::{evolve_discrete, simple_evolve, EvolveResult};
    pub use crate::options::EvolveOptions;
    pub use crate::regenerate::{fully_mixed, negative_selection, tournament};
}

/// Installs a global `tracing` subscriber exactly once. Idempotent — safe to
/// call from every binary/test entry point, mirroring how the teacher's
/// engine crate wires up logging.
pub fn init_logging() {
    use std::sync::Once;
    static INIT_LOGGING: Once = Once::new();

    INIT_LOGGING.call_once(|| {
        use tracing_subscriber::fmt::format::FmtSpan;
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        std::panic::set_hook(Box::new(|info| {
            tracing::error!("PANIC: {}", info);
        }));

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                    .with_target(false)
                    .with_level(true)
                    .compact(),
            )
            .init();
    });
}
