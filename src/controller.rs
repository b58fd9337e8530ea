use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use herald_common::{internal, logging};
use herald_delivery::{DeliveryOrchestrator, DispatchConfig, Provider};
use herald_metrics::MetricsConfig;
use serde::Deserialize;

/// Top-level herald configuration, as read from `herald.config.ron`
#[derive(Debug, Clone, Deserialize)]
pub struct Herald {
    #[serde(alias = "delivery")]
    dispatch: DispatchConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

impl Herald {
    /// Load the configuration from the first file found by
    /// [`find_config_file`]
    ///
    /// # Errors
    ///
    /// If no file is found, or it cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_file(&find_config_file()?)
    }

    /// # Errors
    ///
    /// If the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config from {}: {}", path.display(), e)
        })?;

        Self::from_ron(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config in {}: {}", path.display(), e))
    }

    /// # Errors
    ///
    /// If `content` is not a valid configuration.
    pub fn from_ron(content: &str) -> anyhow::Result<Self> {
        let herald: Self = ron::from_str(content)?;
        herald.dispatch.validate()?;
        Ok(herald)
    }

    #[must_use]
    pub const fn dispatch(&self) -> &DispatchConfig {
        &self.dispatch
    }

    #[must_use]
    pub const fn metrics(&self) -> &MetricsConfig {
        &self.metrics
    }

    /// Install logging and, when enabled, the metrics exporter
    ///
    /// # Errors
    ///
    /// If the metrics exporter cannot be initialised.
    pub fn init(&self) -> anyhow::Result<()> {
        logging::init();
        herald_metrics::init_metrics(&self.metrics)?;

        internal!(level = INFO, "Herald initialised");
        Ok(())
    }

    /// Build the orchestrator for the configured providers, drawing the
    /// instances from `providers`
    ///
    /// # Errors
    ///
    /// If the configured providers cannot be resolved against `providers`.
    pub fn build(
        &self,
        providers: impl IntoIterator<Item = Arc<dyn Provider>>,
    ) -> anyhow::Result<DeliveryOrchestrator> {
        Ok(DeliveryOrchestrator::from_config(&self.dispatch, providers)?)
    }
}

/// Find the configuration file using the following precedence:
/// 1. `HERALD_CONFIG` environment variable
/// 2. ./herald.config.ron (current working directory)
/// 3. /etc/herald/herald.config.ron (system-wide config)
///
/// # Errors
///
/// If `HERALD_CONFIG` names a missing file, or no file exists at the
/// default locations.
pub fn find_config_file() -> anyhow::Result<PathBuf> {
    find_config_file_from(std::env::var("HERALD_CONFIG").ok())
}

fn find_config_file_from(env_path: Option<String>) -> anyhow::Result<PathBuf> {
    if let Some(env_path) = env_path {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "HERALD_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = [
        PathBuf::from("./herald.config.ron"),
        PathBuf::from("/etc/herald/herald.config.ron"),
    ];

    for path in &default_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - HERALD_CONFIG environment variable\n{paths_tried}"
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use herald_delivery::ProviderType;

    use super::*;

    const CONFIG: &str = r#"(
        dispatch: (
            providers: ["twilio", "nexmo"],
            region_providers: { "de": ["nexmo"] },
            receipt_timeout_secs: 120,
        ),
        metrics: (enabled: false),
    )"#;

    #[test]
    fn test_from_ron() {
        let herald = Herald::from_ron(CONFIG).unwrap();

        assert_eq!(
            herald.dispatch().providers,
            vec![ProviderType::Twilio, ProviderType::Nexmo]
        );
        assert_eq!(herald.dispatch().receipt_timeout_secs, 120);
        assert!(!herald.metrics().enabled);
    }

    #[test]
    fn test_metrics_section_is_optional() {
        let herald = Herald::from_ron(r#"(dispatch: (providers: ["messagebird"]))"#).unwrap();
        assert!(!herald.metrics().enabled);
    }

    #[test]
    fn test_invalid_dispatch_is_rejected() {
        assert!(Herald::from_ron("(dispatch: (providers: []))").is_err());
        assert!(Herald::from_ron(r#"(dispatch: (providers: ["pigeon"]))"#).is_err());
        assert!(
            Herald::from_ron(
                r#"(dispatch: (providers: ["twilio"], receipt_timeout_secs: 0))"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_build_requires_configured_instances() {
        let herald = Herald::from_ron(CONFIG).unwrap();
        let error = herald.build(Vec::new()).unwrap_err();

        assert!(error.to_string().contains("twilio"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let herald = Herald::from_file(file.path()).unwrap();
        assert_eq!(herald.dispatch().providers.len(), 2);
    }

    #[test]
    fn test_find_config_file_from_env() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().into_owned();

        assert_eq!(
            find_config_file_from(Some(path.clone())).unwrap(),
            PathBuf::from(path)
        );
    }

    #[test]
    fn test_find_config_file_from_missing_env_path() {
        let error = find_config_file_from(Some("/nonexistent/herald.config.ron".to_string()))
            .unwrap_err();

        assert!(error.to_string().contains("HERALD_CONFIG points to non-existent file"));
    }
}
