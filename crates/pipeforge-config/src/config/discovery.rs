use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pipeforge_utils::error::{ConfigError, PipeforgeError};
use pipeforge_utils::paths::WorkspaceConfig;
use pipeforge_utils::types::ConfigSource;
use serde::Deserialize;

use super::{CliArgs, Config, Defaults};

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
}

impl Config {
    /// Discover configuration starting from the current directory.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, PipeforgeError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd, cli_args)
    }

    /// Discover configuration starting from `start`.
    ///
    /// The workspace root is resolved first (`PIPEFORGE_HOME`, then the
    /// nearest `.pipeforge/` ancestor). The config file is `--config` when
    /// given, else `<root>/.pipeforge/config.toml`, else the user-level
    /// `pipeforge/config.toml` under the platform config directory.
    pub fn discover_from(start: &Path, cli_args: &CliArgs) -> Result<Self, PipeforgeError> {
        let workspace = WorkspaceConfig::discover_from(start)
            .map_err(|e| ConfigError::InvalidFile(format!("{e:#}")))?;

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => discover_config_file(&workspace),
        };

        let file_defaults = match &config_path {
            Some(path) => load_config_file(path)?,
            None => Defaults::default(),
        };

        let mut source_attribution = HashMap::new();
        let file_source = config_path.clone().map(ConfigSource::ConfigFile);

        let defaults = Defaults {
            runs_dir: layer(
                "runs_dir",
                cli_args.runs_dir.clone(),
                file_defaults.runs_dir,
                file_source.as_ref(),
                &mut source_attribution,
            ),
            command_timeout_secs: layer(
                "command_timeout_secs",
                cli_args.command_timeout_secs,
                file_defaults.command_timeout_secs,
                file_source.as_ref(),
                &mut source_attribution,
            ),
            max_loop_attempts: layer(
                "max_loop_attempts",
                cli_args.max_loop_attempts,
                file_defaults.max_loop_attempts,
                file_source.as_ref(),
                &mut source_attribution,
            ),
            package_manager: layer(
                "package_manager",
                cli_args.package_manager.clone(),
                file_defaults.package_manager,
                file_source.as_ref(),
                &mut source_attribution,
            ),
            verbose: layer(
                "verbose",
                cli_args.verbose,
                file_defaults.verbose,
                file_source.as_ref(),
                &mut source_attribution,
            ),
        };

        let config = Self {
            defaults,
            workspace,
            config_path,
            source_attribution,
        };
        config.validate()?;

        tracing::debug!(
            root = %config.workspace.root_path,
            config_file = ?config.config_path,
            "configuration resolved"
        );
        Ok(config)
    }
}

/// Pick the CLI value over the file value and record where it came from.
fn layer<T>(
    key: &str,
    cli: Option<T>,
    file: Option<T>,
    file_source: Option<&ConfigSource>,
    attribution: &mut HashMap<String, ConfigSource>,
) -> Option<T> {
    if cli.is_some() {
        attribution.insert(key.to_string(), ConfigSource::Cli);
        return cli;
    }
    if file.is_some() {
        if let Some(source) = file_source {
            attribution.insert(key.to_string(), source.clone());
        }
        return file;
    }
    attribution.insert(key.to_string(), ConfigSource::Defaults);
    None
}

fn discover_config_file(workspace: &WorkspaceConfig) -> Option<PathBuf> {
    let local = workspace.marker_dir().join("config.toml");
    if local.is_file() {
        return Some(local.into_std_path_buf());
    }

    // PIPEFORGE_HOME pins everything to one root; no user-level fallback then.
    if std::env::var_os(pipeforge_utils::paths::HOME_ENV).is_some() {
        return None;
    }

    let user = dirs::config_dir()?.join("pipeforge").join("config.toml");
    user.is_file().then_some(user)
}

fn load_config_file(path: &Path) -> Result<Defaults, PipeforgeError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::InvalidFile(format!("failed to read {}: {e}", path.display()))
    })?;

    let parsed: TomlConfig = toml::from_str(&content).map_err(|e| {
        ConfigError::InvalidFile(format!("failed to parse {}: {e}", path.display()))
    })?;

    Ok(parsed.defaults.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeforge_utils::paths::{HOME_ENV, MARKER_DIR};
    use serial_test::serial;
    use tempfile::TempDir;

    fn workspace_with_config(contents: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join(MARKER_DIR);
        std::fs::create_dir_all(&marker).unwrap();
        std::fs::write(marker.join("config.toml"), contents).unwrap();
        temp
    }

    #[test]
    #[serial]
    fn test_file_values_are_loaded_and_attributed() {
        unsafe { std::env::remove_var(HOME_ENV) };
        let temp = workspace_with_config(
            "[defaults]\ncommand_timeout_secs = 5\npackage_manager = \"pnpm\"\n",
        );

        let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.defaults.command_timeout_secs, Some(5));
        assert!(matches!(
            config.source_of("command_timeout_secs"),
            ConfigSource::ConfigFile(_)
        ));
        assert_eq!(config.source_of("max_loop_attempts"), ConfigSource::Defaults);
        assert_eq!(config.max_loop_attempts(), 3);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_file() {
        unsafe { std::env::remove_var(HOME_ENV) };
        let temp = workspace_with_config("[defaults]\nmax_loop_attempts = 5\n");
        let cli = CliArgs {
            max_loop_attempts: Some(2),
            ..CliArgs::default()
        };

        let config = Config::discover_from(temp.path(), &cli).unwrap();

        assert_eq!(config.max_loop_attempts(), 2);
        assert_eq!(config.source_of("max_loop_attempts"), ConfigSource::Cli);
    }

    #[test]
    #[serial]
    fn test_unknown_section_is_rejected() {
        unsafe { std::env::remove_var(HOME_ENV) };
        let temp = workspace_with_config("[llm]\nprovider = \"x\"\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(
            err,
            PipeforgeError::Config(ConfigError::InvalidFile(_))
        ));
    }

    #[test]
    #[serial]
    fn test_explicit_missing_config_is_not_found() {
        let temp = TempDir::new().unwrap();
        unsafe { std::env::set_var(HOME_ENV, temp.path()) };
        let cli = CliArgs {
            config_path: Some(temp.path().join("nope.toml")),
            ..CliArgs::default()
        };

        let err = Config::discover_from(temp.path(), &cli).unwrap_err();
        unsafe { std::env::remove_var(HOME_ENV) };

        assert!(matches!(
            err,
            PipeforgeError::Config(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_home_env_without_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        unsafe { std::env::set_var(HOME_ENV, temp.path()) };

        let config = Config::discover_from(Path::new("/"), &CliArgs::default()).unwrap();
        unsafe { std::env::remove_var(HOME_ENV) };

        assert!(config.config_path.is_none());
        assert_eq!(config.workspace.root_path.as_std_path(), temp.path());
        assert_eq!(config.runs_root().as_std_path(), temp.path().join("runs"));
    }
}
