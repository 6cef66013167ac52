//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use shop_query::{QueryConfig, QueryManager};

use crate::output::Output;

/// File names searched for, nearest directory first.
const CONFIG_NAMES: [&str; 3] = ["shopping.toml", ".shopping.toml", "shopping.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Loaded configuration.
    pub config: QueryConfig,
    /// Manager built from the configuration.
    pub manager: QueryManager,
    /// Driver requested with `--driver`, if any.
    pub driver: Option<String>,
    /// Output handler.
    pub output: Output,
}

impl Context {
    /// Load config and connect the drivers it enables.
    pub async fn load(config_path: Option<&str>, driver: Option<String>, output: Output) -> Result<Self> {
        let config = match config_path {
            Some(path) => QueryConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path))?,
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                match find_config(&cwd) {
                    Some(path) => {
                        output.debug(&format!("Using config {}", path.display()));
                        QueryConfig::load(&path)
                            .with_context(|| format!("Failed to load config from {}", path.display()))?
                    }
                    None => {
                        output.debug("No config file found, using defaults");
                        QueryConfig::from_env()
                    }
                }
            }
        };

        let manager = QueryManager::from_config(&config)
            .await
            .context("Failed to set up query drivers")?;

        Ok(Self {
            config,
            manager,
            driver,
            output,
        })
    }

    /// The `--driver` override as the manager expects it.
    pub fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }
}

/// Find a config file in `start` or one of its parents.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
