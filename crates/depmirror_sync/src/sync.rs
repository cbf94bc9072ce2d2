use depmirror_core::{DependencyWalker, Error, Result};
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    thread,
    time::SystemTime,
};

use crate::{
    config::SyncOptions,
    transform::{Pipeline, Stream},
    types::{SyncRecord, SyncState, SyncSummary},
};

/// Copies `entry` and every file it transitively imports into the output folder.
///
/// Each file keeps its path relative to the input folder (by default the
/// entry's folder). A copy is only rewritten when it is missing or older than
/// its source. Records come back in discovery order, entry first; the
/// callback of `options` sees each record as soon as its file is done.
///
/// The output folder is checked before any source is read: if it exists and
/// is not a directory the run fails with [`Error::NotADirectory`]. A failure
/// of one file does not stop the others, but the first failure (in discovery
/// order) is returned once every file has been attempted.
pub fn sync(entry: &Path, options: &SyncOptions) -> Result<Vec<SyncRecord>> {
    info!("Starting sync of {}", entry.display());
    let output_root = prepare_output_root(&options.output_folder_path()?)?;

    let walker = DependencyWalker::new(options.builtin_set().clone());
    let files = walker.walk(entry)?;
    info!("Found {} files reachable from {}", files.len(), entry.display());

    let input_root = match options.input_folder_path() {
        Some(dir) => canonical_dir(dir)?,
        // the entry is always first and canonical
        None => files.first().and_then(|f| f.parent()).map(Path::to_path_buf).unwrap_or_default(),
    };

    sync_prepared(&files, &input_root, &output_root, options)
}

/// Mirrors an already discovered list of absolute, canonical file paths.
///
/// `input_root` is the folder the output paths are made relative to.
pub fn sync_files(
    files: &[PathBuf],
    input_root: &Path,
    options: &SyncOptions,
) -> Result<Vec<SyncRecord>> {
    let output_root = prepare_output_root(&options.output_folder_path()?)?;
    let input_root = canonical_dir(input_root)?;
    sync_prepared(files, &input_root, &output_root, options)
}

fn sync_prepared(
    files: &[PathBuf],
    input_root: &Path,
    output_root: &Path,
    options: &SyncOptions,
) -> Result<Vec<SyncRecord>> {
    debug!(
        "Mirroring {} files from {} to {}",
        files.len(),
        input_root.display(),
        output_root.display()
    );
    let pipeline = options.pipeline();

    let results: Vec<Result<SyncRecord>> = files
        .par_iter()
        .map(|file| {
            trace!("Thread {:?} syncing: {}", thread::current().id(), file.display());
            let result = sync_file(file, input_root, output_root, pipeline);
            match &result {
                Ok(record) => {
                    debug!("{}: {}", record.path.display(), record.state);
                    options.notify(record);
                }
                Err(e) => warn!("Failed to sync {}: {}", file.display(), e),
            }
            result
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    let mut records = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }

    if let Some(e) = first_error {
        warn!("{} of {} files failed to sync", failed, files.len());
        return Err(e);
    }

    let summary = SyncSummary::from_records(&records);
    info!(
        "Sync complete: {} new, {} changed, {} skipped",
        summary.new, summary.changed, summary.skipped
    );
    Ok(records)
}

fn sync_file(
    file: &Path,
    input_root: &Path,
    output_root: &Path,
    pipeline: &Pipeline,
) -> Result<SyncRecord> {
    let relative = file.strip_prefix(input_root).map_err(|_| Error::OutsideInputRoot {
        path: file.to_path_buf(),
        root: input_root.to_path_buf(),
    })?;
    let output = output_root.join(relative);

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    }

    let source_mtime = modified(file)?;
    let state = match fs::metadata(&output) {
        Ok(meta) => {
            let output_mtime = meta.modified().map_err(|e| Error::io("stat", &output, e))?;
            if output_mtime < source_mtime { SyncState::Changed } else { SyncState::Skipped }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => SyncState::New,
        Err(e) => return Err(Error::io("stat", &output, e)),
    };

    if state != SyncState::Skipped {
        trace!("Writing {} -> {}", file.display(), output.display());
        copy_through(file, &output, pipeline)?;
    }

    Ok(SyncRecord::new(relative, state))
}

/// Streams `source` through the pipeline into `output`.
///
/// The output is left untouched until every stage has accepted the source.
/// Once it has been truncated, a failure removes it: a partial copy would
/// look up to date on the next run.
fn copy_through(source: &Path, output: &Path, pipeline: &Pipeline) -> Result<()> {
    let input = File::open(source).map_err(|e| Error::io("read", source, e))?;
    let mut stream = pipeline
        .apply(source, Box::new(BufReader::new(input)))
        .map_err(|e| Error::io("transform", source, e))?;

    let file = File::create(output).map_err(|e| Error::io("write", output, e))?;
    let written = write_stream(&mut stream, file, source, output);
    if written.is_err()
        && let Err(rm) = fs::remove_file(output)
    {
        trace!("Could not remove partial copy {}: {}", output.display(), rm);
    }
    written
}

fn write_stream(stream: &mut Stream, file: File, source: &Path, output: &Path) -> Result<()> {
    let mut writer = BufWriter::new(file);
    io::copy(stream, &mut writer).map_err(|e| Error::io("transform", source, e))?;
    writer.flush().map_err(|e| Error::io("write", output, e))?;
    Ok(())
}

fn modified(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| Error::io("stat", path, e))
}

/// Makes sure the output folder exists and is a directory.
fn prepare_output_root(dir: &Path) -> Result<PathBuf> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(Error::NotADirectory { path: dir.to_path_buf() }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Creating output folder {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| Error::io("create directory", dir, e))?;
        }
        Err(e) => return Err(Error::io("stat", dir, e)),
    }
    Ok(dir.to_path_buf())
}

fn canonical_dir(dir: &Path) -> Result<PathBuf> {
    dir.canonicalize().map_err(|e| Error::io("canonicalize", dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ContentTransformer;
    use depmirror_core::BuiltinSet;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn fixtures(root: &Path) -> PathBuf {
        create_test_file(root, "fixtures/file2.js", "module.exports = 'two';");
        create_test_file(root, "fixtures/node_modules/file3/index.js", "module.exports = 'three';");
        create_test_file(
            root,
            "fixtures/test2.js",
            "const two = require('./file2');\nconst three = require('file3');\nconst fs = require('fs');",
        );
        create_test_file(
            root,
            "fixtures/test3.js",
            "import './test2';\nimport { app } from 'electron';",
        )
    }

    fn touch(path: &Path) {
        let later = SystemTime::now() + Duration::from_secs(60);
        File::options().write(true).open(path).unwrap().set_modified(later).unwrap();
    }

    fn records(pairs: &[(&str, SyncState)]) -> Vec<SyncRecord> {
        pairs.iter().map(|(p, s)| SyncRecord::new(*p, *s)).collect()
    }

    #[test]
    fn test_copy_all_files_to_target_folder() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = fixtures(root);
        let out = root.join("dist/test1");

        let result = sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap();
        assert_eq!(
            result,
            records(&[
                ("test3.js", SyncState::New),
                ("test2.js", SyncState::New),
                ("file2.js", SyncState::New),
                ("node_modules/file3/index.js", SyncState::New),
            ])
        );
        assert_eq!(
            fs::read_to_string(out.join("node_modules/file3/index.js")).unwrap(),
            "module.exports = 'three';"
        );
    }

    #[test]
    fn test_second_run_skips_unchanged_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = fixtures(root);
        let options = SyncOptions::new().output_folder(root.join("dist/test2"));

        sync(&entry, &options).unwrap();
        let result = sync(&entry, &options).unwrap();
        assert!(result.iter().all(|r| r.state == SyncState::Skipped), "{:?}", result);
    }

    #[test]
    fn test_touched_file_is_changed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = fixtures(root);
        let out = root.join("dist/test2");
        let options = SyncOptions::new().output_folder(&out);

        sync(&entry, &options).unwrap();
        fs::write(&entry, "import './test2';\n// edited").unwrap();
        touch(&entry);

        let result = sync(&entry, &options).unwrap();
        assert_eq!(
            result,
            records(&[
                ("test3.js", SyncState::Changed),
                ("test2.js", SyncState::Skipped),
                ("file2.js", SyncState::Skipped),
                ("node_modules/file3/index.js", SyncState::Skipped),
            ])
        );
        assert_eq!(
            fs::read_to_string(out.join("test3.js")).unwrap(),
            "import './test2';\n// edited"
        );
    }

    #[test]
    fn test_callback_per_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = fixtures(root);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let options = SyncOptions::new()
            .output_folder(root.join("dist/test3"))
            .callback(move |record| sink.lock().unwrap().push(record.clone()));
        sync(&entry, &options).unwrap();

        let mut events = events.lock().unwrap().clone();
        events.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            events,
            records(&[
                ("file2.js", SyncState::New),
                ("node_modules/file3/index.js", SyncState::New),
                ("test2.js", SyncState::New),
                ("test3.js", SyncState::New),
            ])
        );
    }

    #[test]
    fn test_transform_applied_and_tree_mirrored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = fixtures(root);
        let out = root.join("dist/upper");

        let options = SyncOptions::new().output_folder(&out).transformer(ContentTransformer::new(
            |_: &Path, bytes: Vec<u8>| Ok(bytes.to_ascii_uppercase()),
        ));
        sync(&entry, &options).unwrap();

        for rel in ["test3.js", "test2.js", "file2.js", "node_modules/file3/index.js"] {
            let source = fs::read(root.join("fixtures").join(rel)).unwrap();
            let copy = fs::read(out.join(rel)).unwrap();
            assert_eq!(copy, source.to_ascii_uppercase(), "{}", rel);
        }
    }

    #[test]
    fn test_failing_transform_only_fails_its_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = fixtures(root);
        let out = root.join("dist/failing");

        let synced = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&synced);
        let options = SyncOptions::new()
            .output_folder(&out)
            .transformer(ContentTransformer::new(|path: &Path, bytes: Vec<u8>| {
                if path.ends_with("file2.js") {
                    Err(io::Error::new(io::ErrorKind::InvalidData, "cannot rewrite"))
                } else {
                    Ok(bytes)
                }
            }))
            .callback(move |record| sink.lock().unwrap().push(record.path.clone()));

        let err = sync(&entry, &options).unwrap_err();
        assert!(matches!(err, Error::Io { op: "transform", .. }), "{}", err);
        assert!(err.path().ends_with("file2.js"));

        assert!(!out.join("file2.js").exists());
        assert!(out.join("test3.js").exists());
        assert!(out.join("node_modules/file3/index.js").exists());
        assert_eq!(synced.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_output_folder_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = fixtures(root);
        let out = create_test_file(root, "dist", "not a folder");

        let called = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&called);
        let options = SyncOptions::new()
            .output_folder(&out)
            .callback(move |_| *counter.lock().unwrap() += 1);

        let err = sync(&entry, &options).unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
        assert_eq!(fs::read_to_string(&out).unwrap(), "not a folder");
        assert_eq!(*called.lock().unwrap(), 0);
    }

    #[test]
    fn test_output_folder_created_recursively() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "app/main.js", "");
        let out = root.join("a/b/c");

        let result = sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap();
        assert_eq!(result, records(&[("main.js", SyncState::New)]));
        assert!(out.join("main.js").is_file());
    }

    #[test]
    fn test_input_folder_sets_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "project/src/index.js", "require('../lib/util');");
        create_test_file(root, "project/lib/util.js", "");
        let out = root.join("out");

        let options = SyncOptions::new().output_folder(&out).input_folder(root.join("project"));
        let result = sync(&entry, &options).unwrap();
        assert_eq!(
            result,
            records(&[("src/index.js", SyncState::New), ("lib/util.js", SyncState::New)])
        );
        assert!(out.join("lib/util.js").is_file());
    }

    #[test]
    fn test_file_outside_input_folder_fails_alone() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "project/src/index.js", "require('../lib/util');");
        create_test_file(root, "project/lib/util.js", "");
        let out = root.join("out");

        let err = sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap_err();
        assert!(matches!(err, Error::OutsideInputRoot { .. }));
        assert!(out.join("index.js").is_file());
    }

    #[test]
    fn test_missing_input_folder() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "index.js", "");

        let options =
            SyncOptions::new().output_folder(root.join("out")).input_folder(root.join("nope"));
        assert!(matches!(sync(&entry, &options).unwrap_err(), Error::NotFound { .. }));
    }

    #[test]
    fn test_unresolved_dependency_copies_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/index.js", "require('./missing');");
        let out = root.join("out");

        let err = sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
        assert!(!out.join("index.js").exists());
    }

    #[test]
    fn test_newer_copy_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/index.js", "original");
        let out = root.join("out");
        let copy = create_test_file(&out, "index.js", "hand edited");
        touch(&copy);

        let result = sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap();
        assert_eq!(result, records(&[("index.js", SyncState::Skipped)]));
        assert_eq!(fs::read_to_string(&copy).unwrap(), "hand edited");
    }

    #[test]
    fn test_sync_files_with_explicit_list() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let a = create_test_file(root, "src/a.js", "a").canonicalize().unwrap();
        let b = create_test_file(root, "src/nested/b.txt", "b").canonicalize().unwrap();
        let out = root.join("out");

        let result =
            sync_files(&[a, b], &root.join("src"), &SyncOptions::new().output_folder(&out))
                .unwrap();
        assert_eq!(
            result,
            records(&[("a.js", SyncState::New), ("nested/b.txt", SyncState::New)])
        );
        assert_eq!(fs::read_to_string(out.join("nested/b.txt")).unwrap(), "b");
    }

    #[test]
    fn test_failing_transform_keeps_previous_copy() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/index.js", "module.exports = 1;");
        let out = root.join("out");

        sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap();
        fs::write(&entry, "module.exports = 2;").unwrap();
        touch(&entry);

        let options = SyncOptions::new().output_folder(&out).transformer(ContentTransformer::new(
            |_: &Path, _: Vec<u8>| Err(io::Error::other("rewrite failed")),
        ));
        let err = sync(&entry, &options).unwrap_err();
        assert!(matches!(err, Error::Io { op: "transform", .. }), "{}", err);
        assert_eq!(fs::read_to_string(out.join("index.js")).unwrap(), "module.exports = 1;");
    }

    #[test]
    fn test_typescript_import_equals_is_copied() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/index.ts", "import util = require('./util');");
        create_test_file(root, "src/util.ts", "export const x = 1;");
        let out = root.join("out");

        let result = sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap();
        assert_eq!(
            result,
            records(&[("index.ts", SyncState::New), ("util.ts", SyncState::New)])
        );
        assert!(out.join("util.ts").is_file());
    }

    #[test]
    fn test_custom_builtins_are_not_copied() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry =
            create_test_file(root, "src/index.js", "require('vendored');\nrequire('./a');");
        create_test_file(root, "src/a.js", "");
        let out = root.join("out");

        let options =
            SyncOptions::new().output_folder(&out).builtins(BuiltinSet::new(["vendored"]));
        let result = sync(&entry, &options).unwrap();
        assert_eq!(
            result,
            records(&[("index.js", SyncState::New), ("a.js", SyncState::New)])
        );

        // the default set does not know the name, so it must resolve
        let err = sync(&entry, &SyncOptions::new().output_folder(&out)).unwrap_err();
        assert!(matches!(err, Error::Resolution { ref specifier, .. } if specifier == "vendored"));
    }
}
