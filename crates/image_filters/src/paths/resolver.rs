use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    config::Strictness,
    environment::FilterEnvironment,
    error::{FilterError, Result},
    paths::expand_home,
    traits::ResolveStep,
};

/// Rejects paths that only exist inside a caller's sandbox
#[derive(Debug, Clone)]
pub struct RejectSandboxPaths {
    pub prefixes: Vec<String>,
}

impl ResolveStep for RejectSandboxPaths {
    fn name(&self) -> &'static str {
        "sandbox_prefix"
    }

    fn resolve(&self, candidate: PathBuf) -> std::result::Result<PathBuf, String> {
        let rejection = {
            let raw = candidate.to_string_lossy();
            self.prefixes
                .iter()
                .find(|prefix| !prefix.is_empty() && raw.starts_with(prefix.as_str()))
                .map(|prefix| {
                    format!("'{raw}' is a sandboxed path (prefix '{prefix}') that is not readable locally")
                })
        };
        match rejection {
            Some(reason) => Err(reason),
            None => Ok(candidate),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpandHome {
    pub home: Option<PathBuf>,
}

impl ResolveStep for ExpandHome {
    fn name(&self) -> &'static str {
        "expand_home"
    }

    fn resolve(&self, candidate: PathBuf) -> std::result::Result<PathBuf, String> {
        expand_home(&candidate, self.home.as_deref())
    }
}

/// Anchors relative paths to `base`, or to the current directory when unset
#[derive(Debug, Clone, Default)]
pub struct AnchorRelative {
    pub base: Option<PathBuf>,
}

impl ResolveStep for AnchorRelative {
    fn name(&self) -> &'static str {
        "anchor_relative"
    }

    fn resolve(&self, candidate: PathBuf) -> std::result::Result<PathBuf, String> {
        if candidate.is_absolute() {
            return Ok(candidate);
        }
        let base = match &self.base {
            Some(base) => base.clone(),
            None => std::env::current_dir()
                .map_err(|e| format!("current directory unavailable: {e}"))?,
        };
        Ok(base.join(candidate))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequireExistingFile;

impl ResolveStep for RequireExistingFile {
    fn name(&self) -> &'static str {
        "require_existing"
    }

    fn resolve(&self, candidate: PathBuf) -> std::result::Result<PathBuf, String> {
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => Ok(candidate),
            Ok(_) => Err(format!("{} is not a regular file", candidate.display())),
            Err(e) => Err(format!("{} is not accessible: {e}", candidate.display())),
        }
    }
}

/// Where the resolved input came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOrigin {
    Caller,
    TestImage { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub origin: InputOrigin,
}

impl ResolvedInput {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, InputOrigin::TestImage { .. })
    }
}

/// Maps a caller-supplied path to a readable file through an ordered chain of steps
pub struct PathResolver {
    steps: Vec<Box<dyn ResolveStep>>,
    environment: FilterEnvironment,
}

impl PathResolver {
    /// Sandbox check, home expansion, cwd anchoring, existence check
    pub fn new(environment: FilterEnvironment) -> Self {
        let steps: Vec<Box<dyn ResolveStep>> = vec![
            Box::new(RejectSandboxPaths {
                prefixes: environment.sandbox_prefixes().to_vec(),
            }),
            Box::new(ExpandHome {
                home: environment.home().map(Path::to_path_buf),
            }),
            Box::new(AnchorRelative::default()),
            Box::new(RequireExistingFile),
        ];
        Self::with_steps(environment, steps)
    }

    pub fn with_steps(environment: FilterEnvironment, steps: Vec<Box<dyn ResolveStep>>) -> Self {
        Self { steps, environment }
    }

    /// Run every step in order; the first rejection stops the chain
    pub fn normalize(&self, raw: &str) -> std::result::Result<PathBuf, String> {
        let mut candidate = PathBuf::from(raw);
        for step in &self.steps {
            candidate = step
                .resolve(candidate)
                .map_err(|reason| format!("{}: {}", step.name(), reason))?;
            debug!("{} -> {}", step.name(), candidate.display());
        }
        Ok(candidate)
    }

    pub fn resolve(&self, raw: &str) -> Result<ResolvedInput> {
        let reason = match self.normalize(raw) {
            Ok(path) => {
                info!("Resolved input '{}' to {}", raw, path.display());
                return Ok(ResolvedInput { path, origin: InputOrigin::Caller });
            }
            Err(reason) => reason,
        };

        if self.environment.strictness() == Strictness::Strict {
            return Err(FilterError::InputResolution { path: raw.to_string(), reason });
        }

        let path = match self.environment.ensure_test_image() {
            Ok(path) => path,
            Err(e) => {
                warn!("Test image unavailable: {}", e);
                self.environment.test_image_path().to_path_buf()
            }
        };
        warn!("Input '{}' rejected ({}), using test image {}", raw, reason, path.display());
        Ok(ResolvedInput { path, origin: InputOrigin::TestImage { reason } })
    }
}
