#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_CONFIG_FILENAME: &str = "tablechat.yaml";

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let git = current.join(".git");
        if git.exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// `tablechat.yaml` at the repository root, or in `start` outside a repository.
pub(crate) fn default_config_path_from_start(start: &Path) -> PathBuf {
    find_repo_root(start)
        .unwrap_or_else(|| start.to_path_buf())
        .join(DEFAULT_CONFIG_FILENAME)
}

/// Directory relative database paths in a config file resolve against.
pub(crate) fn config_base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
