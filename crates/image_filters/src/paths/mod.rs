pub mod placement;
pub mod resolver;

pub use placement::*;
pub use resolver::*;

use std::path::{Path, PathBuf};

/// The caller's home directory, if `HOME` is set
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~` component against `home`
pub fn expand_home(path: &Path, home: Option<&Path>) -> std::result::Result<PathBuf, String> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = home.ok_or_else(|| "cannot expand '~': HOME is not set".to_string())?;
    if rest.as_os_str().is_empty() {
        Ok(home.to_path_buf())
    } else {
        Ok(home.join(rest))
    }
}

/// Create `dir` if needed and check that a file can be created inside it
pub fn is_writable_dir(dir: &Path) -> bool {
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::debug!("Directory {} cannot be created: {}", dir.display(), e);
        return false;
    }
    match tempfile::Builder::new().prefix(".write_probe").tempfile_in(dir) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Directory {} is not writable: {}", dir.display(), e);
            false
        }
    }
}
