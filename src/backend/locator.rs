//! Node.js runtime discovery

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::configuration::Configuration;

/// Finds a runtime interpreter for the bridged backend
pub trait RuntimeLocator: Send + Sync + fmt::Debug {
    /// Path to an interpreter, if one is installed
    fn locate(&self) -> Option<PathBuf>;
}

/// Default Node.js locator
///
/// Probe order:
/// 1. `node` in the configured additional paths
/// 2. nvm installs, newest version first
/// 3. volta, asdf and fnm shims
/// 4. Homebrew and system locations
/// 5. `node` on `PATH`
#[derive(Debug, Clone, Default)]
pub struct NodeLocator {
    additional_paths: Vec<PathBuf>,
    home: Option<PathBuf>,
}

impl NodeLocator {
    /// Locator probing `additional_paths` and the current user's home
    #[must_use]
    pub fn new(additional_paths: Vec<PathBuf>) -> Self {
        Self {
            additional_paths,
            home: std::env::var_os("HOME").map(PathBuf::from),
        }
    }

    /// Locator for a configuration snapshot
    #[must_use]
    pub fn for_configuration(config: &Configuration) -> Self {
        Self::new(config.additional_paths.clone())
    }

    /// Use `home` instead of `$HOME` for version manager directories
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Every candidate location, in probe order
    #[must_use]
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self
            .additional_paths
            .iter()
            .map(|dir| dir.join("node"))
            .collect();

        if let Some(ref home) = self.home {
            candidates.extend(nvm_installs(home));
            candidates.push(home.join(".volta/bin/node"));
            candidates.push(home.join(".asdf/shims/node"));
            candidates.push(home.join(".local/share/fnm/aliases/default/bin/node"));
        }

        candidates.extend(
            ["/opt/homebrew/bin/node", "/usr/local/bin/node", "/usr/bin/node"]
                .into_iter()
                .map(PathBuf::from),
        );
        candidates
    }
}

impl RuntimeLocator for NodeLocator {
    fn locate(&self) -> Option<PathBuf> {
        self.candidates()
            .into_iter()
            .find(|candidate| is_executable(candidate))
            .or_else(|| which::which("node").ok())
    }
}

/// `~/.nvm/versions/node/*/bin/node`, highest version first
fn nvm_installs(home: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(home.join(".nvm/versions/node")) else {
        return Vec::new();
    };

    let mut versions: Vec<(Vec<u64>, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let version = name
                .trim_start_matches('v')
                .split('.')
                .map(|part| part.parse::<u64>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some((version, entry.path().join("bin").join("node")))
        })
        .collect();
    versions.sort_by(|a, b| b.0.cmp(&a.0));
    versions.into_iter().map(|(_, path)| path).collect()
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
