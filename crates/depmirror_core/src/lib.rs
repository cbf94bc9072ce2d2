//! Core of depmirror: finding every file a JavaScript/TypeScript entry point needs.
//!
//! This crate provides:
//! - Extracting import/require specifiers from JS/TS sources
//! - Filtering out Node.js and Electron builtin modules
//! - Resolving specifiers to files (relative paths, node_modules, package.json)
//! - Walking the dependency graph from an entry point, cycles included
//!
//! # Examples
//!
//! ```no_run
//! use depmirror_core::walk_dependencies;
//! use std::path::Path;
//!
//! # fn main() -> depmirror_core::Result<()> {
//! for file in walk_dependencies(Path::new("src/main.js"))? {
//!     println!("{}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

mod builtins;
mod constants;
mod error;
mod graph;
mod parser;
mod resolver;
mod types;

// Re-export public API
pub use builtins::{BuiltinSet, remove_builtins};
pub use constants::{
    ELECTRON_BUILTINS, INDEX_FILES, JS_TS_EXTENSIONS, NODE_BUILTINS, RESOLVE_EXTENSIONS,
};
pub use error::{Error, Result};
pub use graph::{DependencyWalker, walk_dependencies};
pub use parser::{extract_specifiers, extract_specifiers_from_file};
pub use resolver::NodeResolver;
pub use types::{SpecKind, Specifier};
