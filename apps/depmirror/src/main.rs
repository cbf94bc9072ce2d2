use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use depmirror_sync::{Config, SyncSummary};
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "depmirror")]
#[command(about = "Copy only the files a JavaScript program actually imports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Mirror the entry point and everything it imports into an output folder
    Sync(Config),
    /// List the files reachable from an entry point
    Deps(DepsArgs),
}

#[derive(Debug, Args)]
struct DepsArgs {
    /// Entry point of the program
    entry: PathBuf,

    /// Print the file list as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Sync(mut cfg) => {
            cfg.initialize()?;
            let num_threads = rayon::current_num_threads();
            info!("Running sync (using {} threads)", num_threads);
            debug!(
                "Config: entry={:?}, out_dir={:?}, input_dir={:?}",
                cfg.entry, cfg.out_dir, cfg.input_dir
            );

            let options = cfg.to_options();
            let records = depmirror_sync::sync(&cfg.entry, &options)?;
            let elapsed_ms = start.elapsed().as_millis();

            if cfg.json {
                serde_json::to_writer_pretty(&mut stdout, &records)?;
                writeln!(stdout)?;
                stdout.flush()?;
                return Ok(());
            }

            depmirror_sync::print_records(&mut stdout, &records)?;
            let summary = SyncSummary::from_records(&records);
            depmirror_sync::print_summary(&mut stdout, &summary, &options.output_folder_path()?)?;
            writeln!(
                stdout,
                "{} Finished in {}ms on {} files (using {} threads).",
                "●".bright_blue(),
                elapsed_ms.to_string().cyan(),
                records.len().to_string().cyan(),
                num_threads.to_string().cyan()
            )?;
            stdout.flush()?;
            Ok(())
        }
        Commands::Deps(args) => {
            let files = depmirror_core::walk_dependencies(&args.entry)?;
            debug!("Discovered {} files", files.len());

            if args.json {
                serde_json::to_writer_pretty(&mut stdout, &files)?;
                writeln!(stdout)?;
            } else {
                depmirror_sync::print_discovered(&mut stdout, &files)?;
                writeln!(
                    stdout,
                    "\n{} {} files reachable in {}ms.",
                    "●".bright_blue(),
                    files.len().to_string().cyan(),
                    start.elapsed().as_millis().to_string().cyan()
                )?;
            }
            stdout.flush()?;
            Ok(())
        }
    }
}
