use std::{
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::types::{SyncRecord, SyncState, SyncSummary};

/// Relativize an absolute path to the current working directory for clickable links
fn relativize_to_cwd(path: &Path) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return path.display().to_string();
        }
    };

    match make_relative(path, &cwd) {
        Some(rel_path) => {
            let result = rel_path.to_string_lossy().to_string();
            trace!("Relativized '{}' to '{}'", path.display(), result);
            result
        }
        None => path.display().to_string(),
    }
}

/// Create a relative path from `base` to `target`
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let mut target_components = target.components().peekable();
    let mut base_components = base.components().peekable();

    // Paths on different roots (or a relative and an absolute one) cannot be related
    if target_components.peek() != base_components.peek() {
        return None;
    }

    // Skip the common prefix
    while let (Some(t), Some(b)) = (target_components.peek(), base_components.peek()) {
        if t != b {
            break;
        }
        target_components.next();
        base_components.next();
    }

    // "../" for each remaining base component, then the rest of the target
    let mut result = PathBuf::new();
    for _ in base_components {
        result.push("..");
    }
    for component in target_components {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

fn colored_state(state: SyncState) -> colored::ColoredString {
    let label = format!("{:<8}", state.as_str());
    match state {
        SyncState::New => label.green().bold(),
        SyncState::Changed => label.yellow().bold(),
        SyncState::Skipped => label.dimmed(),
    }
}

/// One line per record, in the order given.
pub fn print_records<W: Write>(writer: &mut W, records: &[SyncRecord]) -> io::Result<()> {
    debug!("Printing {} sync records", records.len());
    for record in records {
        writeln!(writer, "  {} {}", colored_state(record.state), record.path.display())?;
    }
    Ok(())
}

pub fn print_summary<W: Write>(
    writer: &mut W,
    summary: &SyncSummary,
    output_folder: &Path,
) -> io::Result<()> {
    if summary.written() == 0 {
        writeln!(
            writer,
            "\n{} {} is up to date ({} files).",
            "✓".green().bold(),
            relativize_to_cwd(output_folder).blue(),
            summary.skipped.to_string().cyan()
        )?;
    } else {
        writeln!(
            writer,
            "\n{} Synced into {}: {} new, {} changed, {} skipped.",
            "✓".green().bold(),
            relativize_to_cwd(output_folder).blue(),
            summary.new.to_string().green(),
            summary.changed.to_string().yellow(),
            summary.skipped.to_string().dimmed()
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Lists discovered files, entry first, relative to the current directory.
pub fn print_discovered<W: Write>(writer: &mut W, files: &[PathBuf]) -> io::Result<()> {
    debug!("Printing {} discovered files", files.len());
    for (idx, file) in files.iter().enumerate() {
        let display_path = relativize_to_cwd(file);
        if idx == 0 {
            writeln!(writer, "{} {}", "●".bright_blue(), display_path.bright_white().bold())?;
        } else {
            let prefix = if idx == files.len() - 1 { "└──" } else { "├──" };
            writeln!(writer, "{}  {}", prefix.dimmed(), display_path)?;
        }
    }
    writer.flush()?;
    Ok(())
}
