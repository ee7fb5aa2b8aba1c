use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::MigrationError;

const MIGRATION_EXTENSION: &str = ".sql";

/// Relative locations probed when no directory is configured, kept for
/// deployments that start the binary from the repository root or a crate dir.
const FALLBACK_DIRS: &[&str] = &[
    "migrations",
    "crates/contacts-db/migrations",
    "../contacts-db/migrations",
    "../../crates/contacts-db/migrations",
];

/// A single migration file. The file name doubles as the version identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: String,
    pub path: PathBuf,
}

/// A resolved directory holding `*.sql` migration files.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    dir: PathBuf,
}

impl MigrationSource {
    /// Use `dir` as-is, without checking that it exists.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Pick the migrations directory.
    ///
    /// An explicitly configured directory must exist; there is no fallback
    /// from it. Without one, the legacy candidates from [`fallback_candidates`]
    /// are probed in order.
    pub fn resolve(configured: Option<&Path>) -> Result<Self, MigrationError> {
        if let Some(dir) = configured {
            if dir.is_dir() {
                return Ok(Self::new(dir));
            }
            return Err(MigrationError::Configuration(format!(
                "configured migrations directory {} does not exist",
                dir.display()
            )));
        }
        Self::resolve_from(&fallback_candidates())
    }

    /// First existing directory among `candidates`.
    pub fn resolve_from(candidates: &[PathBuf]) -> Result<Self, MigrationError> {
        for candidate in candidates {
            if candidate.is_dir() {
                debug!("resolved migrations directory {}", candidate.display());
                return Ok(Self::new(candidate.clone()));
            }
        }

        let probed = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(MigrationError::Configuration(format!(
            "no migrations directory found (tried: {probed})"
        )))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List `*.sql` files directly inside the directory, in directory order.
    /// Sorting is left to the runner.
    pub fn list(&self) -> Result<Vec<MigrationFile>, MigrationError> {
        if !self.dir.is_dir() {
            return Err(MigrationError::DirectoryNotFound(self.dir.clone()));
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|source| MigrationError::ListFiles {
            path: self.dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| MigrationError::ListFiles {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!("skipping migration with non UTF-8 name: {}", path.display());
                continue;
            };
            if name.ends_with(MIGRATION_EXTENSION) {
                files.push(MigrationFile {
                    version: name,
                    path,
                });
            }
        }

        Ok(files)
    }
}

/// The legacy search list: working-directory relative paths, then a
/// `migrations` directory next to the running executable, then the
/// directory bundled with this crate at build time.
pub fn fallback_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = FALLBACK_DIRS.iter().map(PathBuf::from).collect();

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join("migrations"));
    }

    candidates.push(bundled_dir());
    candidates
}

/// The `migrations/` directory shipped in this crate's source tree.
pub fn bundled_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
}
