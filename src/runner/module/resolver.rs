//! Module search path and identifier resolution.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::runner::plugin::config::ConfigError;

/// Environment variable holding the module search path.
pub const SEARCH_PATH_ENV: &str = "CPR_PATH";

#[cfg(target_os = "macos")]
const RESOURCES_DIR: &str = "Resources";
#[cfg(not(target_os = "macos"))]
const RESOURCES_DIR: &str = "resources";

lazy_static! {
    static ref EXEC_DIR: Option<PathBuf> = env::current_exe()
        .ok()
        .and_then(|exe| exe.canonicalize().ok())
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
}

/// Directory containing the running executable, computed once per process.
pub fn executable_dir() -> Option<&'static Path> {
    EXEC_DIR.as_deref()
}

/// Ordered, non-empty list of directories searched for module identifiers.
/// Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPathList {
    dirs: Vec<PathBuf>,
}

impl SearchPathList {
    pub fn new(dirs: Vec<PathBuf>) -> Result<Self, ConfigError> {
        if dirs.is_empty() {
            return Err(ConfigError::EmptySearchPath);
        }
        Ok(SearchPathList { dirs })
    }

    /// Parses a path-list string using the platform delimiter. Empty
    /// segments are skipped.
    pub fn from_env_value(value: &OsStr) -> Result<Self, ConfigError> {
        let dirs = env::split_paths(value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        Self::new(dirs)
    }

    /// `[dir, dir/../resources]` (`Resources` on macOS).
    pub fn from_exec_dir(dir: &Path) -> Self {
        SearchPathList {
            dirs: vec![dir.to_path_buf(), dir.join("..").join(RESOURCES_DIR)],
        }
    }

    /// `CPR_PATH` if set and non-empty, otherwise the executable directory pair.
    pub fn from_environment() -> Result<Self, ConfigError> {
        if let Some(value) = env::var_os(SEARCH_PATH_ENV) {
            match Self::from_env_value(&value) {
                Ok(list) => return Ok(list),
                Err(_) => warn!("{} is set but names no directory, falling back to executable path", SEARCH_PATH_ENV),
            }
        }
        executable_dir()
            .map(Self::from_exec_dir)
            .ok_or(ConfigError::ExecutablePathUnavailable)
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Finds the file an identifier names.
    ///
    /// Absolute identifiers are checked as-is. Relative ones are joined onto
    /// each search directory in order and the first existing file wins. A miss
    /// is `None`; the caller decides what kind of error it is.
    pub fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        let id = Path::new(identifier);
        if id.is_absolute() {
            return if id.is_file() {
                debug!("resolved absolute module path {}", id.display());
                Some(id.to_path_buf())
            } else {
                debug!("absolute module path {} does not exist", id.display());
                None
            };
        }
        for dir in &self.dirs {
            let candidate = dir.join(id);
            if candidate.is_file() {
                debug!("resolved '{}' to {}", identifier, candidate.display());
                return Some(candidate);
            }
            debug!("'{}' not found in {}", identifier, dir.display());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_list_is_an_error() {
        assert!(matches!(SearchPathList::new(vec![]), Err(ConfigError::EmptySearchPath)));
    }

    #[test]
    fn test_env_value_skips_empty_segments() {
        let joined = env::join_paths(vec![PathBuf::from("/a"), PathBuf::new(), PathBuf::from("/b")]).unwrap();
        let list = SearchPathList::from_env_value(&joined).unwrap();
        assert_eq!(list.dirs(), &[PathBuf::from("/a"), PathBuf::from("/b")][..]);
        assert!(SearchPathList::from_env_value(OsStr::new("")).is_err());
    }

    #[test]
    fn test_exec_dir_pair() {
        let list = SearchPathList::from_exec_dir(Path::new("/opt/app/bin"));
        assert_eq!(list.dirs().len(), 2);
        assert_eq!(list.dirs()[0], PathBuf::from("/opt/app/bin"));
        assert_eq!(list.dirs()[1], Path::new("/opt/app/bin").join("..").join(RESOURCES_DIR));
    }

    #[test]
    fn test_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("util.js"), "second").unwrap();
        let list = SearchPathList::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();
        assert_eq!(list.resolve("util.js"), Some(second.path().join("util.js")));

        fs::write(first.path().join("util.js"), "first").unwrap();
        assert_eq!(list.resolve("util.js"), Some(first.path().join("util.js")));
        assert_eq!(list.resolve("util.js"), list.resolve("util.js"));
    }

    #[test]
    fn test_directories_are_not_modules() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        let list = SearchPathList::new(vec![dir.path().to_path_buf()]).unwrap();
        assert_eq!(list.resolve("lib"), None);
    }
}
