use tracing_subscriber::EnvFilter;

use crate::settings::AppEnvironment;

/// Installs the global subscriber: JSON lines in production, human-readable otherwise.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(env: &AppEnvironment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match env {
        AppEnvironment::Production => builder.json().init(),
        _ => builder.init(),
    }
}
