use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

const APPLICATION_NAME: &str = "activity-logger";
const EXPORT_DIRECTORY_NAME: &str = "ActivityLogger";

/// Directory for application state, logs mostly. Created if it doesn't exist.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = state_home()?;
    path.push(APPLICATION_NAME);

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

/// Directory exports end up in when none was given. Not created here, exporter takes care of it.
pub fn default_export_path() -> Result<PathBuf> {
    let mut path = home()?;
    path.push(EXPORT_DIRECTORY_NAME);
    Ok(path)
}

fn state_home() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            env::var("APPDATA")
                .map(PathBuf::from)
                .context("APPDATA should be present on Windows")
        } else {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| home().map(|home| home.join(".local/state")))
        }
    }
}

fn home() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            env::var("USERPROFILE")
                .map(PathBuf::from)
                .context("Couldn't find USERPROFILE")
        } else {
            env::var("HOME")
                .map(PathBuf::from)
                .context("Couldn't find HOME")
        }
    }
}
