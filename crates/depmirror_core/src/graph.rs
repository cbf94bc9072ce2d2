use log::{debug, info, trace};
use rayon::prelude::*;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{
    builtins::BuiltinSet,
    error::{Error, Result},
    parser::extract_specifiers_from_file,
    resolver::NodeResolver,
};

/// Discovers every file reachable from an entry point.
///
/// The walk is breadth-first over levels of the graph. The files of one
/// level are parsed and resolved in parallel on the rayon pool, then merged
/// on the calling thread in level order, so the visited set is only ever
/// touched by one thread and the result order is deterministic: entry
/// first, then each newly discovered file in the order its first importer
/// listed it.
#[derive(Debug, Default)]
pub struct DependencyWalker {
    builtins: BuiltinSet,
    resolver: NodeResolver,
}

impl DependencyWalker {
    pub fn new(builtins: BuiltinSet) -> Self {
        Self { builtins, resolver: NodeResolver::new() }
    }

    /// The resolved, non-builtin dependencies of a single file.
    pub fn direct_dependencies(&self, file: &Path) -> Result<Vec<PathBuf>> {
        let file = canonical_file(file)?;
        self.dependencies_of(&file)
    }

    /// Returns `entry` followed by every file it transitively imports, each once.
    ///
    /// Fails on the first file that cannot be read or parsed and on the first
    /// specifier that cannot be resolved; no partial list is returned. When
    /// several files of one level fail, the error of the earliest discovered
    /// one is reported.
    pub fn walk(&self, entry: &Path) -> Result<Vec<PathBuf>> {
        let entry = canonical_file(entry)?;
        info!("Walking dependencies of {}", entry.display());

        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut discovered: Vec<PathBuf> = Vec::new();

        visited.insert(entry.clone());
        discovered.push(entry.clone());
        let mut frontier = vec![entry];
        let mut level = 0;

        while !frontier.is_empty() {
            trace!("Level {}: {} modules to scan", level, frontier.len());
            let results: Vec<Result<Vec<PathBuf>>> =
                frontier.par_iter().map(|m| self.dependencies_of(m)).collect();
            // first failure in frontier order, not the first one a worker hit
            let deps = results.into_iter().collect::<Result<Vec<_>>>()?;

            let mut next = Vec::new();
            for path in deps.into_iter().flatten() {
                if visited.insert(path.clone()) {
                    trace!("Discovered: {}", path.display());
                    discovered.push(path.clone());
                    next.push(path);
                }
            }
            frontier = next;
            level += 1;
        }

        debug!(
            "Discovered {} modules in {} levels ({} cached resolutions)",
            discovered.len(),
            level,
            self.resolver.cached()
        );
        Ok(discovered)
    }

    fn dependencies_of(&self, file: &Path) -> Result<Vec<PathBuf>> {
        let specs = extract_specifiers_from_file(file)?;
        let specs = self.builtins.remove_builtins(&specs);
        let dir = file.parent().unwrap_or(file);
        let deps = self.resolver.resolve_specifiers(dir, &specs)?;
        trace!("{} has {} dependencies", file.display(), deps.len());
        Ok(deps)
    }
}

/// [`DependencyWalker::walk`] with the default Node.js + Electron builtins.
pub fn walk_dependencies(entry: &Path) -> Result<Vec<PathBuf>> {
    DependencyWalker::default().walk(entry)
}

fn canonical_file(path: &Path) -> Result<PathBuf> {
    let canonical = path.canonicalize().map_err(|e| Error::io("canonicalize", path, e))?;
    if !canonical.is_file() {
        return Err(Error::NotFound { path: canonical });
    }
    Ok(canonical)
}
