use std::{ffi::OsString, fs, path::PathBuf};

use tracing::debug;

use super::error::{ConfigError, ConfigResult};

/// Points directly at a config file, taking precedence over the search
/// locations. Meant for deployments where the file lives outside the
/// conventional directories.
pub const CONFIG_ENV_VAR: &str = "AULA_CONFIG";

pub fn find_config_file(use_local: bool) -> PathBuf {
    resolve_config_file(std::env::var_os(CONFIG_ENV_VAR), use_local)
}

fn resolve_config_file(explicit: Option<OsString>, use_local: bool) -> PathBuf {
    if let Some(explicit) = explicit {
        return PathBuf::from(explicit);
    }

    if use_local {
        return PathBuf::from("./config.toml");
    }

    #[cfg(unix)]
    let base = std::env::var_os("HOME");
    #[cfg(windows)]
    let base = std::env::var_os("APPDATA");

    #[cfg(any(unix, windows))]
    if let Some(base) = base {
        let mut path = PathBuf::from(base);

        if cfg!(unix) {
            path = path.join(".config");
        }

        path = path.join(crate::APPLICATION_NAME).join("config.toml");

        if path.exists() {
            return path;
        }
    }

    PathBuf::from("./config.toml")
}

pub fn read_config(use_local: bool) -> ConfigResult<String> {
    let filename = find_config_file(use_local);

    tracing::trace!("looking for config at: {}", filename.display());
    if !filename.exists() {
        return Err(ConfigError::ConfigNotFound);
    }

    debug!("using {} as configuration file", filename.display());
    Ok(fs::read_to_string(filename)?)
}
