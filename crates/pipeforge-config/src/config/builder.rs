use std::collections::HashMap;

use camino::Utf8PathBuf;
use pipeforge_utils::error::PipeforgeError;
use pipeforge_utils::paths::WorkspaceConfig;
use pipeforge_utils::types::ConfigSource;

use super::{Config, Defaults};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// ```rust
    /// use pipeforge_config::Config;
    ///
    /// let config = Config::builder()
    ///     .root("/srv/pipeline")
    ///     .command_timeout_secs(30)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.command_timeout().as_secs(), 30);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent construction of a [`Config`] without touching the environment or
/// the filesystem. Values set here are attributed to
/// [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    root: Option<Utf8PathBuf>,
    defaults: Defaults,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace root; defaults to `.`.
    #[must_use]
    pub fn root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn runs_dir(mut self, runs_dir: impl Into<String>) -> Self {
        self.defaults.runs_dir = Some(runs_dir.into());
        self
    }

    #[must_use]
    pub fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.defaults.command_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn max_loop_attempts(mut self, attempts: u32) -> Self {
        self.defaults.max_loop_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn package_manager(mut self, pm: impl Into<String>) -> Self {
        self.defaults.package_manager = Some(pm.into());
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.defaults.verbose = Some(verbose);
        self
    }

    /// Build and validate.
    pub fn build(self) -> Result<Config, PipeforgeError> {
        let mut source_attribution = HashMap::new();
        let d = &self.defaults;
        for (key, set) in [
            ("runs_dir", d.runs_dir.is_some()),
            ("command_timeout_secs", d.command_timeout_secs.is_some()),
            ("max_loop_attempts", d.max_loop_attempts.is_some()),
            ("package_manager", d.package_manager.is_some()),
            ("verbose", d.verbose.is_some()),
        ] {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Defaults
            };
            source_attribution.insert(key.to_string(), source);
        }

        let config = Config {
            defaults: self.defaults,
            workspace: WorkspaceConfig::new(self.root.unwrap_or_else(|| Utf8PathBuf::from("."))),
            config_path: None,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
