//! Configuration loading
//!
//! Sources, later ones win:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`, default `pending-queue.toml`)
//! 3. Environment variables `PENDING_QUEUE__<SECTION>__<KEY>`
//!    (e.g. `PENDING_QUEUE__MAX_DEPTH=20`, `PENDING_QUEUE__BACKEND__IMPLEMENTATION=dual`)

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use pending_core::application::PendingQueueConfig;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "pending-queue.toml";
const ENV_PREFIX: &str = "PENDING_QUEUE";

/// Read and validate the queue configuration once at startup
pub fn load(path: &Path) -> Result<PendingQueueConfig> {
    let settings = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

    let config: PendingQueueConfig = settings
        .try_deserialize()
        .context("Invalid pending queue configuration")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pending_core::application::BackendKind;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, PendingQueueConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
max_depth = 7
shard = "east"

[retry]
max_attempts = 3

[backend]
implementation = "dual"

[backend.dual]
previous = "memory"
primary = "sqlite"
"#
        )
        .unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.max_depth, 7);
        assert_eq!(config.shard.as_deref(), Some("east"));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 100);
        assert_eq!(config.backend.implementation, BackendKind::Dual);
    }

    #[test]
    fn test_invalid_dual_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[backend]
implementation = "dual"

[backend.dual]
previous = "sqlite"
primary = "sqlite"
"#
        )
        .unwrap();

        assert!(load(file.path()).is_err());
    }
}
