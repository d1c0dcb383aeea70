//! Locating and reading source files for unresolved symbols and includes.
//!
//! The engine never touches the filesystem directly: class autoloading and
//! `include`/`require` targets go through a [`Loader`]. [`FsLoader`] is
//! configured from `phplint.toml`; [`MemoryLoader`] serves virtual files.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::LintConfig;
use crate::error::LoadError;

/// File resolution collaborator used by an analysis session.
pub trait Loader: fmt::Debug {
    /// File expected to declare the fully qualified class `name`
    fn resolve_qualified_name_to_file(&self, name: &str) -> Option<PathBuf>;

    fn read_source(&self, path: &Path) -> Result<String, LoadError>;

    fn exists(&self, path: &Path) -> bool;

    /// Directories searched for relative include targets
    fn include_path(&self) -> &[PathBuf] {
        &[]
    }

    /// Resolve an `include` target the way PHP does: absolute and
    /// `./`-relative paths are taken as they are, other relative paths are
    /// tried against the include path and then the including file's
    /// directory.
    fn resolve_include(&self, target: &str, current_dir: &Path) -> Option<PathBuf> {
        let path = Path::new(target);
        if path.is_absolute() {
            let path = normalize_path(path);
            return self.exists(&path).then_some(path);
        }
        if target.starts_with("./") || target.starts_with("../") {
            let path = normalize_path(&current_dir.join(path));
            return self.exists(&path).then_some(path);
        }
        self.include_path()
            .iter()
            .map(|dir| normalize_path(&dir.join(path)))
            .chain(std::iter::once(normalize_path(&current_dir.join(path))))
            .find(|candidate| self.exists(candidate))
    }
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

// =========================================================================
// Filesystem
// =========================================================================

/// Loader backed by the filesystem.
///
/// Class names are resolved through the explicit classmap first, then the
/// PSR-4 prefix with the longest match.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    /// Namespace prefix (with trailing `\`) to base directories
    psr4: Vec<(String, Vec<PathBuf>)>,
    /// Lowercased class name to file
    classmap: HashMap<String, PathBuf>,
    include_path: Vec<PathBuf>,
}

impl FsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LintConfig) -> Self {
        let mut loader = FsLoader::new();
        for (prefix, dirs) in &config.autoload.psr4 {
            let dirs = dirs.iter().map(|d| config.resolve(d)).collect();
            loader = loader.with_psr4(prefix, dirs);
        }
        for (class, file) in &config.autoload.classmap {
            loader = loader.with_class(class, config.resolve(file));
        }
        for dir in &config.autoload.include_path {
            loader.include_path.push(config.resolve(dir));
        }
        loader
    }

    pub fn with_psr4(mut self, prefix: &str, dirs: Vec<PathBuf>) -> Self {
        let mut prefix = prefix.trim_start_matches('\\').to_string();
        if !prefix.is_empty() && !prefix.ends_with('\\') {
            prefix.push('\\');
        }
        self.psr4.push((prefix, dirs));
        // Longest prefix first
        self.psr4.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    pub fn with_class(mut self, class: &str, file: PathBuf) -> Self {
        self.classmap
            .insert(class.trim_start_matches('\\').to_ascii_lowercase(), file);
        self
    }

    pub fn with_include_dir(mut self, dir: PathBuf) -> Self {
        self.include_path.push(dir);
        self
    }

    fn psr4_candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for (prefix, dirs) in &self.psr4 {
            let Some(relative) = strip_prefix_ignore_case(name, prefix) else {
                continue;
            };
            let relative = format!("{}.php", relative.replace('\\', "/"));
            candidates.extend(dirs.iter().map(|dir| dir.join(&relative)));
        }
        candidates
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    if name.len() < prefix.len() || !name.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = name.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}

impl Loader for FsLoader {
    fn resolve_qualified_name_to_file(&self, name: &str) -> Option<PathBuf> {
        let name = name.trim_start_matches('\\');
        if let Some(file) = self.classmap.get(&name.to_ascii_lowercase()) {
            return Some(file.clone());
        }
        self.psr4_candidates(name)
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    fn read_source(&self, path: &Path) -> Result<String, LoadError> {
        fs::read_to_string(path).map_err(|e| LoadError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn include_path(&self) -> &[PathBuf] {
        &self.include_path
    }
}

// =========================================================================
// In-memory
// =========================================================================

/// Loader over a fixed set of virtual files.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
    classes: HashMap<String, PathBuf>,
    include_path: Vec<PathBuf>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    pub fn with_file(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.files
            .insert(normalize_path(&path.into()), source.into());
        self
    }

    /// Add a file and register it as the declaration site of `class`
    pub fn with_class_file(
        mut self,
        class: &str,
        path: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> Self {
        let path = normalize_path(&path.into());
        self.classes
            .insert(class.trim_start_matches('\\').to_ascii_lowercase(), path.clone());
        self.with_file(path, source)
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_path.push(dir.into());
        self
    }
}

impl Loader for MemoryLoader {
    fn resolve_qualified_name_to_file(&self, name: &str) -> Option<PathBuf> {
        self.classes
            .get(&name.trim_start_matches('\\').to_ascii_lowercase())
            .cloned()
    }

    fn read_source(&self, path: &Path) -> Result<String, LoadError> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    fn include_path(&self) -> &[PathBuf] {
        &self.include_path
    }
}

/// Loader that resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl Loader for NullLoader {
    fn resolve_qualified_name_to_file(&self, _name: &str) -> Option<PathBuf> {
        None
    }

    fn read_source(&self, path: &Path) -> Result<String, LoadError> {
        Err(LoadError::NotFound {
            path: path.to_path_buf(),
        })
    }

    fn exists(&self, _path: &Path) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d.php")),
            PathBuf::from("/a/c/d.php")
        );
        assert_eq!(normalize_path(Path::new("../x.php")), PathBuf::from("../x.php"));
    }

    #[test]
    fn test_psr4_longest_prefix_first() {
        let loader = FsLoader::new()
            .with_psr4("App\\", vec![PathBuf::from("/src")])
            .with_psr4("App\\Models", vec![PathBuf::from("/models")]);
        let candidates = loader.psr4_candidates("App\\Models\\User");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/models/User.php"),
                PathBuf::from("/src/Models/User.php"),
            ]
        );
        assert!(loader.psr4_candidates("Other\\Thing").is_empty());
    }

    #[test]
    fn test_classmap_is_case_insensitive() {
        let loader = FsLoader::new().with_class("Legacy_Thing", PathBuf::from("/lib/legacy.php"));
        assert_eq!(
            loader.resolve_qualified_name_to_file("\\legacy_thing"),
            Some(PathBuf::from("/lib/legacy.php"))
        );
    }

    #[test]
    fn test_memory_loader_include_resolution() {
        let loader = MemoryLoader::new()
            .with_file("/project/lib/helpers.php", "<?php")
            .with_file("/project/src/local.php", "<?php")
            .with_include_dir("/project/lib");
        let dir = Path::new("/project/src");
        assert_eq!(
            loader.resolve_include("helpers.php", dir),
            Some(PathBuf::from("/project/lib/helpers.php"))
        );
        assert_eq!(
            loader.resolve_include("local.php", dir),
            Some(PathBuf::from("/project/src/local.php"))
        );
        assert_eq!(
            loader.resolve_include("./../lib/helpers.php", dir),
            Some(PathBuf::from("/project/lib/helpers.php"))
        );
        assert_eq!(loader.resolve_include("missing.php", dir), None);
    }

    #[test]
    fn test_null_loader() {
        let loader = NullLoader;
        assert!(loader.resolve_qualified_name_to_file("Foo").is_none());
        assert!(matches!(
            loader.read_source(Path::new("a.php")),
            Err(LoadError::NotFound { .. })
        ));
    }
}
