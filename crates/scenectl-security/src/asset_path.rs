//! `AssetPathGuard`: sandboxed resolution of caller-supplied asset paths
//! against a set of configured search directories (§4.14).

use std::path::{Path, PathBuf};

use scenectl_core::CoreError;

#[derive(Debug, Clone)]
pub struct AssetPathConfig {
    pub search_paths: Vec<PathBuf>,
    pub allowed_extensions: Option<Vec<String>>,
    pub allow_absolute_paths: bool,
    pub max_file_size_mb: u64,
}

impl Default for AssetPathConfig {
    fn default() -> Self {
        Self { search_paths: Vec::new(), allowed_extensions: None, allow_absolute_paths: false, max_file_size_mb: 100 }
    }
}

/// Resolves and validates asset paths against a sandbox of search
/// directories. Constructed once at startup; each configured directory is
/// canonicalized and must exist, or it is dropped with a warning rather than
/// failing startup.
pub struct AssetPathGuard {
    config: AssetPathConfig,
    search_paths: Vec<PathBuf>,
}

impl AssetPathGuard {
    pub fn new(config: AssetPathConfig) -> Self {
        let mut search_paths = Vec::new();
        for path in &config.search_paths {
            match path.canonicalize() {
                Ok(canonical) if canonical.is_dir() => search_paths.push(canonical),
                Ok(_) => tracing::warn!(path = %path.display(), "asset search path is not a directory"),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "asset search path does not exist"),
            }
        }
        if search_paths.is_empty() {
            tracing::warn!("no asset search paths configured - asset access will be limited");
        }
        Self { config, search_paths }
    }

    /// Syntactic validation only: no `..`, no NUL bytes, extension
    /// allow-list, absolute-path policy. Does not touch the filesystem.
    pub fn validate_asset_path(&self, asset_path: &str) -> Result<String, CoreError> {
        if asset_path.contains("..") {
            return Err(CoreError::PathTraversal { path: asset_path.to_string() });
        }
        if asset_path.contains('\0') {
            return Err(CoreError::invalid_parameter("asset_path", "NUL byte is not allowed"));
        }

        let is_windows_drive = asset_path.len() >= 2 && asset_path.as_bytes()[1] == b':';
        let is_absolute = Path::new(asset_path).is_absolute() || asset_path.starts_with('/') || is_windows_drive;
        if is_absolute && !self.config.allow_absolute_paths {
            return Err(CoreError::invalid_parameter("asset_path", "absolute paths are not allowed"));
        }

        if let Some(allowed) = &self.config.allowed_extensions {
            let ext = Path::new(asset_path).extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
            if !allowed.iter().any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&ext)) {
                return Err(CoreError::invalid_parameter("asset_path", format!("extension `.{ext}` is not allowed")));
            }
        }

        Ok(asset_path.to_string())
    }

    /// Resolves `asset_path` against each configured search directory in
    /// order, defending against symlink escapes by requiring the canonical
    /// resolved path to sit strictly under the canonical search directory.
    pub fn resolve(&self, asset_path: &str) -> Result<PathBuf, CoreError> {
        let validated = self.validate_asset_path(asset_path)?;

        if Path::new(&validated).is_absolute() {
            if !self.config.allow_absolute_paths {
                return Err(CoreError::PathTraversal { path: validated });
            }
            let candidate = PathBuf::from(&validated);
            return self.check_file_validity(&candidate).then_some(candidate).ok_or_else(|| {
                CoreError::NotFound { what: format!("asset `{validated}`") }
            });
        }

        for search_dir in &self.search_paths {
            let candidate = search_dir.join(&validated);
            let Ok(real) = candidate.canonicalize() else { continue };
            if !real.starts_with(search_dir) {
                tracing::warn!(asset_path, search_dir = %search_dir.display(), "resolved path escapes search directory");
                continue;
            }
            if self.check_file_validity(&real) {
                return Ok(real);
            }
        }

        Err(CoreError::NotFound { what: format!("asset `{asset_path}`") })
    }

    pub fn asset_exists(&self, asset_path: &str) -> bool {
        self.resolve(asset_path).is_ok()
    }

    pub fn get_asset_full_path(&self, asset_path: &str) -> Option<PathBuf> {
        self.resolve(asset_path).ok()
    }

    /// Walks every search directory, returning a sorted, deduplicated list
    /// of relative asset paths passing the same validity checks `resolve`
    /// applies.
    pub fn list_available_assets(&self, prefix: &str) -> Vec<String> {
        let mut assets = std::collections::BTreeSet::new();
        for search_dir in &self.search_paths {
            let root = if prefix.is_empty() { search_dir.clone() } else { search_dir.join(prefix) };
            if !root.is_dir() {
                continue;
            }
            for entry in walk(&root) {
                if self.check_file_validity(&entry) {
                    if let Ok(rel) = entry.strip_prefix(search_dir) {
                        assets.insert(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }
        assets.into_iter().collect()
    }

    fn check_file_validity(&self, path: &Path) -> bool {
        let Ok(metadata) = std::fs::metadata(path) else { return false };
        if !metadata.is_file() {
            return false;
        }
        if self.config.max_file_size_mb > 0 && metadata.len() > self.config.max_file_size_mb * 1024 * 1024 {
            tracing::warn!(path = %path.display(), "asset exceeds configured size limit");
            return false;
        }
        true
    }
}

fn walk(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else { return out };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}
