//! Tracing initialisation for the CLI.

use std::collections::BTreeMap;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level, globally and per crate.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// "trace" | "debug" | "info" | "warn" | "error"
    pub level: String,
    /// Override per component: crate name → level
    pub components: BTreeMap<String, String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            components: BTreeMap::new(),
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        let mut components = BTreeMap::new();
        for krate in ["minafetch-core", "minafetch-http", "minafetch-sources"] {
            components.insert(krate.to_string(), "debug".to_string());
        }
        Self {
            level: "info".into(),
            components,
        }
    }

    /// `EnvFilter` directive string, e.g. `info,minafetch_core=debug`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Install the global subscriber on stderr. `RUST_LOG` wins when set.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directives()))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
