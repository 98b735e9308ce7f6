use std::{
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::Level;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, Layer};

/// Name of the environment variable that turns tracing on.
///
/// It accepts either a plain level (`TRACE=debug`), which applies to every podvend target,
/// or an [`EnvFilter`] directive (`TRACE=podvend::resolve=trace`).
pub const TRACE_ENV: &str = "TRACE";

/// Log targets that a plain level in [`TRACE_ENV`] applies to.
const PODVEND_TARGETS: &[&str] = &[
    "podvend",
    "podvend_catalog",
    "podvend_fetcher",
    "podvend_installer",
    "podvend_resolver",
    "podvend_vendor",
];

static IS_TRACING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Install a global subscriber if [`TRACE_ENV`] is set.
///
/// Calling this more than once is harmless.
pub fn enable_tracing_by_env() {
    let Ok(trace_var) = std::env::var(TRACE_ENV) else {
        return;
    };

    let Some(layer) = filter_layer(&trace_var) else {
        eprintln!("warn: ignoring {TRACE_ENV}={trace_var:?}, it is neither a level nor a directive");
        return;
    };

    if !IS_TRACING_ENABLED.swap(true, Ordering::SeqCst) {
        use tracing_subscriber::{fmt, prelude::*};
        tracing_subscriber::registry()
            .with(layer)
            .with(fmt::layer().with_writer(std::io::stderr).with_span_events(FmtSpan::CLOSE))
            .init();
        tracing::trace!(target: "podvend", "enable_tracing_by_env");
    }
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn filter_layer(trace_var: &str) -> Option<BoxedLayer> {
    if let Ok(level) = Level::from_str(trace_var) {
        let targets = PODVEND_TARGETS.iter().map(|target| (*target, level));
        return tracing_subscriber::filter::Targets::new().with_targets(targets).boxed().into();
    }

    EnvFilter::builder().with_regex(true).parse(trace_var).ok().map(|filter| filter.boxed())
}
