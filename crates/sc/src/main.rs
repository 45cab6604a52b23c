//! sc - scribe CLI
//!
//! Record a stream of browser interaction events into a live Playwright test,
//! and recompile saved event journals.
//!
//! `sc record` reads one JSON event per line on stdin, as emitted by the
//! browser-side instrumentation:
//!
//! ```text
//! {"type":"navigation","url":"https://example.com"}
//! {"type":"mouseDown","x":10,"y":10,"locator":"#go"}
//! {"type":"mouseUp","x":10,"y":10,"locator":"#go"}
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{unbounded, RecvTimeoutError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use scribe::error::Error;
use scribe::prelude::*;
use scribe::recorder::Formatter;

#[derive(Parser)]
#[command(name = "sc")]
#[command(about = "scribe - record interaction events and compile them into Playwright tests")]
#[command(version)]
struct Cli {
    /// Directory holding scripts, snapshots and journals (default ~/.scribe)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record events from stdin into a live script
    Record {
        /// Test name, also used for the file names
        #[arg(short, long, default_value = "recorded")]
        name: String,
        /// Quiet period in ms before the script is rewritten
        #[arg(long, default_value = "250")]
        debounce: u64,
        /// Spaces per indent level
        #[arg(long, default_value = "2")]
        indent: usize,
        /// Formatter run on the script after each write, e.g. "npx prettier --write"
        #[arg(long)]
        format: Option<String>,
        /// Do not save the raw event journal
        #[arg(long)]
        no_journal: bool,
    },
    /// Recompile a saved event journal
    Compile {
        file: String,
        /// Write here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Test name (defaults to the journal's)
        #[arg(short, long)]
        name: Option<String>,
        /// Emit only the test body
        #[arg(long)]
        bare: bool,
    },
    /// List saved scripts and journals
    List,
    /// Show a script, or a summary of a journal
    Show {
        file: String,
        /// Print every journal event
        #[arg(long)]
        all: bool,
    },
    /// Delete a script (with its snapshots) or a journal
    Delete { file: String },
}

#[derive(Serialize)]
struct Output<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Error>,
}

impl<T: Serialize> Output<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }
    fn err(e: Error) -> Output<()> {
        Output { success: false, data: None, error: Some(e) }
    }
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

fn init_logging() {
    let debug_enabled = std::env::var("SCRIBE_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = storage(cli.dir.as_deref()).and_then(|storage| match cli.command {
        Commands::Record { name, debounce, indent, format, no_journal } => {
            let config = RecorderConfig {
                test_name: name,
                debounce_ms: debounce,
                indent,
                formatter: format.as_deref().and_then(Formatter::parse),
                journal: !no_journal,
                ..Default::default()
            };
            record(storage, config)
        }
        Commands::Compile { file, out, name, bare } => {
            compile_journal(&storage, &file, out.as_deref(), name.as_deref(), bare)
        }
        Commands::List => list(&storage),
        Commands::Show { file, all } => show(&storage, &file, all),
        Commands::Delete { file } => delete(&storage, &file),
    });

    if let Err(e) = result {
        if let Some(err) = e.downcast_ref::<Error>() {
            let _ = print_json(&Output::<()>::err(err.clone()));
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn storage(dir: Option<&Path>) -> Result<ScriptStorage> {
    match dir {
        Some(d) => ScriptStorage::with_dir(d),
        None => ScriptStorage::new(),
    }
}

fn record(storage: ScriptStorage, config: RecorderConfig) -> Result<()> {
    let mut recorder = Recorder::new(config, storage);
    let script = recorder.start()?;
    eprintln!("Recording to {} (Ctrl+C or EOF to stop)", script.display());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    // stdin reader: one event per line, malformed lines are skipped
    let (tx, rx) = unbounded::<RawEvent>();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for (i, line) in stdin.lock().lines().enumerate() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEvent>(&line) {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let err = Error::invalid_event(i + 1, &e.to_string());
                    warn!(error = %err, "skipping line");
                }
            }
        }
    });

    let mut accepted = 0usize;
    let mut shown = 0usize;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => {
                debug!(event = event.kind(), "received");
                if recorder.handle_event(event).is_accepted() {
                    accepted += 1;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if accepted != shown {
            shown = accepted;
            eprint!("\r{} events", shown);
            io::stderr().flush()?;
        }
    }

    let summary = recorder.stop()?;
    eprintln!();
    print_json(&Output::ok(summary))
}

fn compile_journal(
    storage: &ScriptStorage,
    file: &str,
    out: Option<&Path>,
    name: Option<&str>,
    bare: bool,
) -> Result<()> {
    let journal = storage.load_journal(file)?;

    let mut state = SessionState::armed();
    for event in &journal.events {
        state.apply(event);
    }

    let template = if bare {
        ScriptTemplate::bare()
    } else {
        ScriptTemplate::playwright(name.unwrap_or(&journal.name))
    };
    let text = compile(state.log(), state.open_steps(), &template);

    match out {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} entries -> {}", state.log().len(), path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn list(storage: &ScriptStorage) -> Result<()> {
    let files = storage.list()?;

    if files.is_empty() {
        println!("No scripts saved in {}.", storage.path().display());
    } else {
        for f in files {
            println!("{}", f);
        }
    }

    Ok(())
}

fn show(storage: &ScriptStorage, file: &str, all: bool) -> Result<()> {
    if !file.ends_with(scribe::recorder::storage::JOURNAL_EXT) {
        let path = storage.path().join(file);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        print!("{}", text);
        return Ok(());
    }

    let journal = storage.load_journal(file)?;
    println!("Name: {}", journal.name);
    println!("Recorded: {}", journal.recorded_at.to_rfc3339());
    println!("Events: {}", journal.events.len());

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for e in &journal.events {
        *counts.entry(e.kind()).or_default() += 1;
    }
    for (kind, n) in &counts {
        println!("  {:<18} {}", kind, n);
    }

    if all {
        println!();
        for e in &journal.events {
            println!("{}", serde_json::to_string(e)?);
        }
    }

    Ok(())
}

fn delete(storage: &ScriptStorage, file: &str) -> Result<()> {
    storage.delete(file)?;
    println!("Deleted: {}", file);
    Ok(())
}
