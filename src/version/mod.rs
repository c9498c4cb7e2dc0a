//! Asset version oracle.
//!
//! # Data Flow
//! ```text
//! VersionStrategy (from config)
//!     → compute(): static string, or SHA-256 of the template bytes
//!     → cached in ArcSwap<String>
//!     → read on every request (is_stale)
//!
//! On template change:
//!     watcher.rs detects modify/create
//!     → refresh() recomputes and swaps the cached value
//! ```
//!
//! # Design Decisions
//! - A single explicitly configured template; no per-module resolution
//! - Unreadable template at startup is fatal; on refresh the old value stays
//! - An absent client version is never stale

pub mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use watcher::VersionWatcher;

/// Failure to compute the asset version.
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("asset version source `{path}` is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("static asset version must not be empty")]
    EmptyStatic,
}

/// How the asset version is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStrategy {
    /// A fixed string, e.g. a release tag or a build manifest hash.
    Static(String),
    /// SHA-256 (hex) over the bytes of the root template.
    TemplateHash(PathBuf),
}

impl VersionStrategy {
    pub fn compute(&self) -> Result<String, VersionError> {
        match self {
            VersionStrategy::Static(v) if v.is_empty() => Err(VersionError::EmptyStatic),
            VersionStrategy::Static(v) => Ok(v.clone()),
            VersionStrategy::TemplateHash(path) => hash_file(path),
        }
    }
}

/// SHA-256 hex digest of arbitrary bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn hash_file(path: &Path) -> Result<String, VersionError> {
    let bytes = std::fs::read(path).map_err(|source| VersionError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hash_bytes(&bytes))
}

/// True when the client reported a version and it differs from ours.
pub fn is_stale(requested: Option<&str>, current: &str) -> bool {
    matches!(requested, Some(v) if v != current)
}

/// The current asset version, computed once and refreshed on demand.
#[derive(Debug)]
pub struct AssetVersion {
    strategy: VersionStrategy,
    current: ArcSwap<String>,
}

impl AssetVersion {
    /// Compute the initial version, failing fast if the source is missing.
    pub fn new(strategy: VersionStrategy) -> Result<Self, VersionError> {
        let initial = strategy.compute()?;
        tracing::info!(version = %initial, strategy = ?strategy, "Asset version computed");
        Ok(Self {
            strategy,
            current: ArcSwap::from_pointee(initial),
        })
    }

    pub fn current(&self) -> Arc<String> {
        self.current.load_full()
    }

    pub fn is_stale(&self, requested: Option<&str>) -> bool {
        is_stale(requested, &self.current.load())
    }

    /// Recompute from the source. Returns whether the version changed.
    pub fn refresh(&self) -> Result<bool, VersionError> {
        let next = self.strategy.compute()?;
        let changed = **self.current.load() != next;
        if changed {
            tracing::info!(version = %next, "Asset version changed");
            self.current.store(Arc::new(next));
        }
        Ok(changed)
    }

    pub fn strategy(&self) -> &VersionStrategy {
        &self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_stale() {
        assert!(!is_stale(None, "abc"));
        assert!(!is_stale(Some("abc"), "abc"));
        assert!(is_stale(Some("old"), "abc"));
        assert!(is_stale(Some(""), "abc"));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_bytes(b"<html></html>"), hash_bytes(b"<html></html>"));
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"b"));
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_static_strategy() {
        let version = AssetVersion::new(VersionStrategy::Static("v42".into())).unwrap();
        assert_eq!(version.current().as_str(), "v42");
        assert!(!version.refresh().unwrap());
        assert!(version.is_stale(Some("v41")));
        assert!(!version.is_stale(None));
    }

    #[test]
    fn test_empty_static_rejected() {
        let err = AssetVersion::new(VersionStrategy::Static(String::new())).unwrap_err();
        assert!(matches!(err, VersionError::EmptyStatic));
    }

    #[test]
    fn test_missing_template_fails_fast() {
        let strategy = VersionStrategy::TemplateHash("/definitely/not/here.html".into());
        let err = AssetVersion::new(strategy).unwrap_err();
        assert!(matches!(err, VersionError::Unreadable { .. }));
    }

    #[test]
    fn test_template_hash_tracks_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html>@inertia</html>").unwrap();

        let version = AssetVersion::new(VersionStrategy::TemplateHash(file.path().into())).unwrap();
        let first = version.current();
        assert_eq!(version.current(), first);
        assert!(!version.refresh().unwrap());

        write!(file, "<!-- v2 -->").unwrap();
        file.flush().unwrap();
        assert!(version.refresh().unwrap());
        assert_ne!(version.current(), first);
        assert!(version.is_stale(Some(first.as_str())));
    }
}
