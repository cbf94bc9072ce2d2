use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    constants::{INDEX_FILES, NODE_MODULES, RESOLVE_EXTENSIONS},
    error::{Error, Result},
};

/// Node.js style module resolution.
///
/// Relative specifiers are resolved against the containing directory with
/// extension inference and directory index fallback; bare specifiers are
/// looked up in `node_modules` directories from the containing directory up
/// to the filesystem root. Results are memoized per `(directory, specifier)`
/// and the cache may be shared by worker threads.
#[derive(Debug, Default)]
pub struct NodeResolver {
    cache: DashMap<(PathBuf, String), PathBuf>,
}

impl NodeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized resolutions.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolves `request` as written in a file that lives in `from_dir`.
    pub fn resolve(&self, request: &str, from_dir: &Path) -> Result<PathBuf> {
        let key = (from_dir.to_path_buf(), request.to_string());
        if let Some(v) = self.cache.get(&key) {
            trace!("Cache hit for resolve: '{}' from {}", request, from_dir.display());
            return Ok(v.clone());
        }
        trace!("Resolving: '{}' from {}", request, from_dir.display());

        let resolved = if is_relative(request) {
            trace!("Resolving as relative import: '{}'", request);
            let p = clean(from_dir.join(request));
            resolve_file(&p).or_else(|| resolve_directory(&p))
        } else {
            trace!("Resolving as node_modules package: '{}'", request);
            resolve_node_module_from_dir(from_dir, request)
        };

        let Some(resolved) = resolved else {
            debug!("Failed to resolve '{}' from {}", request, from_dir.display());
            return Err(Error::Resolution {
                specifier: request.to_string(),
                from: from_dir.to_path_buf(),
            });
        };

        let resolved =
            resolved.canonicalize().map_err(|e| Error::io("canonicalize", &resolved, e))?;
        debug!("Resolved '{}' from {} to {}", request, from_dir.display(), resolved.display());
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Resolves every request in order, failing on the first one that has no file.
    pub fn resolve_specifiers<S>(&self, from_dir: &Path, requests: &[S]) -> Result<Vec<PathBuf>>
    where
        S: AsRef<str>,
    {
        requests.iter().map(|r| self.resolve(r.as_ref(), from_dir)).collect()
    }
}

fn is_relative(request: &str) -> bool {
    request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../")
        || request.starts_with('/')
}

fn resolve_file(p: &Path) -> Option<PathBuf> {
    // Try exact path first
    if p.is_file() {
        return Some(p.to_path_buf());
    }

    // Try adding extensions
    for ext in RESOLVE_EXTENSIONS {
        let mut candidate = p.as_os_str().to_owned();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if candidate.is_file() {
            trace!("Inferred extension: {}", candidate.display());
            return Some(candidate);
        }
    }

    None
}

fn resolve_directory(dir: &Path) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    if let Some(main) = package_entry(dir) {
        return Some(main);
    }

    resolve_index(dir)
}

fn resolve_index(dir: &Path) -> Option<PathBuf> {
    INDEX_FILES.iter().map(|index_file| dir.join(index_file)).find(|candidate| candidate.is_file())
}

fn resolve_node_module_from_dir(start_dir: &Path, request: &str) -> Option<PathBuf> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, request);
    // Walk up the directory tree looking for node_modules
    let mut current_dir = Some(start_dir);

    while let Some(dir) = current_dir {
        // node_modules/node_modules is never a lookup location
        if dir.file_name().is_none_or(|n| n != NODE_MODULES)
            && let Some(result) = resolve_node_module(dir, request)
        {
            return Some(result);
        }
        current_dir = dir.parent();
    }

    None
}

fn resolve_node_module(root: &Path, request: &str) -> Option<PathBuf> {
    let candidate = root.join(NODE_MODULES).join(request);
    let (pkg_name, subpath) = split_package_request(request);
    let pkg_dir = root.join(NODE_MODULES).join(pkg_name);
    if !pkg_dir.exists() {
        trace!("node_modules path does not exist: {:?}", pkg_dir);
        return None;
    }
    trace!("Checking node_modules at: {:?}", pkg_dir);

    if subpath.is_some() {
        // pkg/sub/file resolves like a relative file inside the package
        return resolve_file(&candidate).or_else(|| resolve_directory(&candidate));
    }

    resolve_directory(&pkg_dir)
}

/// Splits `@scope/name/sub` or `name/sub` into the package name and the subpath.
fn split_package_request(request: &str) -> (&str, Option<&str>) {
    let name_len = if request.starts_with('@') {
        match request.match_indices('/').nth(1) {
            Some((idx, _)) => idx,
            None => request.len(),
        }
    } else {
        request.find('/').unwrap_or(request.len())
    };

    let (name, rest) = request.split_at(name_len);
    let rest = rest.trim_start_matches('/');
    (name, if rest.is_empty() { None } else { Some(rest) })
}

/// Entry point declared by `dir/package.json`, if any.
fn package_entry(dir: &Path) -> Option<PathBuf> {
    let pkg_json = dir.join("package.json");
    let txt = fs::read_to_string(&pkg_json).ok()?;
    let v = match serde_json::from_str::<serde_json::Value>(&txt) {
        Ok(v) => v,
        Err(e) => {
            debug!("Ignoring unparsable {}: {}", pkg_json.display(), e);
            return None;
        }
    };

    let resolve_target = |target: &str| {
        let p = clean(dir.join(target));
        resolve_file(&p).or_else(|| resolve_index(&p))
    };

    // Try exports field first (modern packages)
    if let Some(exports) = v.get("exports") {
        let dot_export = match exports.as_object() {
            Some(obj) if obj.keys().any(|k| k.starts_with('.')) => obj.get("."),
            _ => Some(exports),
        };
        if let Some(target) = dot_export.and_then(export_target)
            && let Some(resolved) = resolve_target(target)
        {
            trace!("Resolved package exports of {:?} to {:?}", dir, resolved);
            return Some(resolved);
        }
    }

    // Try main field
    if let Some(s) = v.get("main").and_then(|x| x.as_str())
        && let Some(resolved) = resolve_target(s)
    {
        trace!("Resolved package main of {:?} to {:?}", dir, resolved);
        return Some(resolved);
    }

    None
}

/// Picks the target of an export entry: a plain string, or the first
/// matching condition of a conditional export.
fn export_target(entry: &serde_json::Value) -> Option<&str> {
    if let Some(s) = entry.as_str() {
        return Some(s);
    }
    let conditions = entry.as_object()?;
    for key in ["node", "require", "default", "import"] {
        if let Some(target) = conditions.get(key).and_then(export_target) {
            return Some(target);
        }
    }
    None
}
