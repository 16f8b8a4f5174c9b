use pipeforge_utils::error::{ConfigError, PipeforgeError};

use super::{Config, PackageManager};

impl Config {
    /// Reject values no command could work with.
    pub fn validate(&self) -> Result<(), PipeforgeError> {
        if let Some(timeout) = self.defaults.command_timeout_secs
            && timeout < 1
        {
            return Err(invalid(
                "command_timeout_secs",
                format!("must be at least 1 second, got {timeout}"),
            ));
        }

        if let Some(attempts) = self.defaults.max_loop_attempts
            && attempts < 1
        {
            return Err(invalid(
                "max_loop_attempts",
                format!("must be at least 1, got {attempts}"),
            ));
        }

        if let Some(runs_dir) = &self.defaults.runs_dir
            && runs_dir.trim().is_empty()
        {
            return Err(invalid("runs_dir", "must not be empty".to_string()));
        }

        if let Some(pm) = &self.defaults.package_manager {
            pm.parse::<PackageManager>()
                .map_err(|reason| invalid("package_manager", reason))?;
        }

        Ok(())
    }
}

fn invalid(key: &str, value: String) -> PipeforgeError {
    PipeforgeError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}
