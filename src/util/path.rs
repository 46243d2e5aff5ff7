use std::path::{Path, PathBuf};

/// Expand `~`, `$VAR` and `${VAR}`. Unknown variables leave the input unchanged.
pub fn expand_env_vars(raw: &str) -> String {
    shellexpand::full(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// [`expand_env_vars`] for paths.
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_vars(&path.to_string_lossy()))
}
