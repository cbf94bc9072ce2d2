use clap::Parser;
use depmirror_core::{BuiltinSet, Error, Result};
use log::{debug, info};
use std::{
    env, fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    transform::{Pipeline, Transformer},
    types::SyncRecord,
};

/// Output folder used when none is given, relative to the current directory
pub const DEFAULT_OUTPUT_FOLDER: &str = "dist";

pub type Callback = Arc<dyn Fn(&SyncRecord) + Send + Sync>;

#[derive(Debug, Clone, Parser)]
#[command(name = "sync")]
#[command(about = "Copy the files reachable from an entry point into a mirrored folder")]
pub struct Config {
    /// Entry point of the program
    pub entry: PathBuf,

    /// Root of the mirrored output tree (defaults to ./dist)
    #[arg(long, short = 'o')]
    pub out_dir: Option<PathBuf>,

    /// Folder the output paths are relative to (defaults to the entry's folder)
    #[arg(long, short = 'i')]
    pub input_dir: Option<PathBuf>,

    /// Print the sync records as JSON
    #[arg(long)]
    pub json: bool,
}

impl Config {
    /// Resolve relative paths against the current directory and fill in the output default.
    pub fn initialize(&mut self) -> Result<()> {
        let cwd = env::current_dir()
            .map_err(|e| Error::io("read current directory", Path::new("."), e))?;
        debug!("Resolving paths against {}", cwd.display());

        self.entry = cwd.join(&self.entry);
        let out_dir = self.out_dir.take().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FOLDER));
        self.out_dir = Some(cwd.join(out_dir));
        self.input_dir = self.input_dir.take().map(|d| cwd.join(d));

        info!(
            "Syncing {} into {}",
            self.entry.display(),
            self.out_dir.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT_FOLDER)).display()
        );
        Ok(())
    }

    pub fn to_options(&self) -> SyncOptions {
        let mut options = SyncOptions::new();
        if let Some(out_dir) = &self.out_dir {
            options = options.output_folder(out_dir);
        }
        if let Some(input_dir) = &self.input_dir {
            options = options.input_folder(input_dir);
        }
        options
    }
}

/// Options of a [`sync`](fn@crate::sync) run.
///
/// ```
/// use depmirror_sync::{ContentTransformer, SyncOptions};
///
/// let options = SyncOptions::new()
///     .output_folder("build/app")
///     .transformer(ContentTransformer::new(|_path: &std::path::Path, bytes: Vec<u8>| Ok(bytes)))
///     .callback(|record| println!("{}: {}", record.path.display(), record.state));
/// assert_eq!(options.pipeline().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct SyncOptions {
    output_folder: Option<PathBuf>,
    input_folder: Option<PathBuf>,
    pipeline: Pipeline,
    callback: Option<Callback>,
    builtins: BuiltinSet,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_folder = Some(dir.into());
        self
    }

    pub fn input_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_folder = Some(dir.into());
        self
    }

    /// Appends a transform stage; stages run in the order they were added.
    pub fn transformer(mut self, stage: impl Transformer + 'static) -> Self {
        self.pipeline.push(Arc::new(stage));
        self
    }

    /// Called once per file as soon as it is synced, possibly from several threads.
    pub fn callback(mut self, callback: impl Fn(&SyncRecord) + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn builtins(mut self, builtins: BuiltinSet) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn builtin_set(&self) -> &BuiltinSet {
        &self.builtins
    }

    pub(crate) fn input_folder_path(&self) -> Option<&Path> {
        self.input_folder.as_deref()
    }

    /// The output folder as an absolute path.
    pub fn output_folder_path(&self) -> Result<PathBuf> {
        let out =
            self.output_folder.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FOLDER));
        if out.is_absolute() {
            return Ok(out);
        }
        let cwd = env::current_dir().map_err(|e| Error::io("read current directory", &out, e))?;
        Ok(cwd.join(out))
    }

    pub(crate) fn notify(&self, record: &SyncRecord) {
        if let Some(callback) = &self.callback {
            callback(record);
        }
    }
}

impl fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("output_folder", &self.output_folder)
            .field("input_folder", &self.input_folder)
            .field("pipeline", &self.pipeline)
            .field("callback", &self.callback.is_some())
            .field("builtins", &self.builtins.len())
            .finish()
    }
}
