//! Detection of the optional native acceleration library used by the accelerated columnar
//! factory. The outcome is computed once per `Capability` and reused.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Platform file stem of the acceleration library, without prefix or suffix.
pub const DEFAULT_NATIVE_LIBRARY: &str = "gandiva_jni";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Library absent. Expected on most hosts; the generic factory is used.
    Unavailable,
    Available,
    /// Library present but unusable for another reason. Not recoverable by falling back.
    Indeterminate(String),
}

pub trait CapabilityProbe: Send + Sync {
    fn probe(&self) -> ProbeOutcome;
}

/// Looks for the platform library file (`lib<name>.so`, `lib<name>.dylib`, `<name>.dll`) in
/// extra directories first, then in the loader search path variables.
#[derive(Debug, Clone)]
pub struct SharedLibraryProbe {
    library: String,
    extra_dirs: Vec<PathBuf>,
    search_env: bool,
}

impl Default for SharedLibraryProbe {
    fn default() -> Self { Self::new(DEFAULT_NATIVE_LIBRARY) }
}

impl SharedLibraryProbe {
    pub fn new(library: impl Into<String>) -> Self {
        Self { library: library.into(), extra_dirs: Vec::new(), search_env: true }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_dirs.push(dir.into());
        self
    }

    /// Restrict the search to the explicit directories.
    pub fn without_env_search(mut self) -> Self {
        self.search_env = false;
        self
    }

    pub fn file_name(&self) -> String {
        format!("{}{}{}", env::consts::DLL_PREFIX, self.library, env::consts::DLL_SUFFIX)
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.extra_dirs.clone();
        if self.search_env {
            for var in ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH", "PATH"] {
                if let Some(v) = env::var_os(var) {
                    dirs.extend(env::split_paths(&v));
                }
            }
        }
        dirs
    }
}

impl CapabilityProbe for SharedLibraryProbe {
    fn probe(&self) -> ProbeOutcome {
        let file = self.file_name();
        for dir in self.search_dirs() {
            let candidate = dir.join(&file);
            match fs::metadata(&candidate) {
                Ok(meta) if meta.is_file() => {
                    debug!(target: "filedriver::capability", path = %candidate.display(), "native library found");
                    return ProbeOutcome::Available;
                }
                Ok(_) => return ProbeOutcome::Indeterminate(format!("{} exists but is not a regular file", candidate.display())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return ProbeOutcome::Indeterminate(format!("cannot inspect {}: {}", candidate.display(), e)),
            }
        }
        ProbeOutcome::Unavailable
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticProbe(pub ProbeOutcome);

impl CapabilityProbe for StaticProbe {
    fn probe(&self) -> ProbeOutcome { self.0.clone() }
}

/// Cached probe result.
pub struct Capability {
    probe: Arc<dyn CapabilityProbe>,
    outcome: OnceCell<ProbeOutcome>,
}

impl Capability {
    pub fn new(probe: Arc<dyn CapabilityProbe>) -> Self { Self { probe, outcome: OnceCell::new() } }

    pub fn outcome(&self) -> &ProbeOutcome {
        self.outcome.get_or_init(|| {
            let outcome = self.probe.probe();
            match &outcome {
                ProbeOutcome::Available => info!(target: "filedriver::capability", "native acceleration available"),
                ProbeOutcome::Unavailable => debug!(target: "filedriver::capability", "native acceleration not present; generic factory will be used"),
                ProbeOutcome::Indeterminate(why) => warn!(target: "filedriver::capability", reason = %why, "native acceleration probe inconclusive"),
            }
            outcome
        })
    }

    pub fn is_probed(&self) -> bool { self.outcome.get().is_some() }
}

impl Default for Capability {
    fn default() -> Self { Self::new(Arc::new(SharedLibraryProbe::default())) }
}
