pub mod atomic;
pub mod build_info;
pub mod clock;
pub mod paths;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global fmt subscriber; `RUST_LOG` directives extend the default.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "household_budget=info".parse() {
            filter = filter.add_directive(directive);
        }

        if let Err(err) = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
        {
            eprintln!("tracing subscriber not installed: {err}");
        }
    });
}
