//! Incremental mirroring of the files a JavaScript/TypeScript program needs.
//!
//! Starting from an entry point, every transitively imported file is copied
//! into an output folder that mirrors the input folder's layout. Copies that
//! are already up to date (not older than their source) are skipped, and
//! optional transform stages can rewrite contents on the way.
//!
//! # Examples
//!
//! ```no_run
//! use depmirror_sync::{SyncOptions, sync};
//! use std::path::Path;
//!
//! # fn main() -> depmirror_sync::Result<()> {
//! let options = SyncOptions::new()
//!     .output_folder("build/app")
//!     .callback(|record| println!("{}: {}", record.path.display(), record.state));
//!
//! let records = sync(Path::new("src/main.js"), &options)?;
//! println!("{} files mirrored", records.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod reporter;
mod sync;
mod transform;
mod types;

// Re-export public API
pub use config::{Callback, Config, DEFAULT_OUTPUT_FOLDER, SyncOptions};
pub use reporter::{print_discovered, print_records, print_summary};
pub use sync::{sync, sync_files};
pub use transform::{ContentTransformer, Pipeline, Stream, Transformer};
pub use types::{SyncRecord, SyncState, SyncSummary};

pub use depmirror_core::{
    BuiltinSet, DependencyWalker, Error, NodeResolver, Result, SpecKind, Specifier,
    extract_specifiers, extract_specifiers_from_file, remove_builtins, walk_dependencies,
};
