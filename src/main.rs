use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use zview::kernel::services::adapters::{ensure_settings_file, load_explicit_settings, load_settings};
use zview::kernel::services::ports::{
    FileError, FileSearchResult, PatternError, SearchError, Settings, WatchError,
};
use zview::kernel::services::{HostEvent, SearchQuery, ViewerHost};
use zview::kernel::FileInfo;

mod logging;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const HIGHLIGHT_OPEN: &str = "\x1b[1;33m";
const HIGHLIGHT_CLOSE: &str = "\x1b[0m";

#[derive(Parser, Debug)]
#[command(name = "zview", version, about = "Search, view and watch text files")]
struct Cli {
    /// Settings file (defaults to <cache dir>/.zview/settings.json)
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Also write logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search every text file under a directory
    Search(SearchArgs),
    /// Print a file with line numbers
    Open {
        file: PathBuf,
        /// Only print this line (1-based)
        #[arg(short, long)]
        line: Option<i64>,
    },
    /// Highlight every match of a term inside one file
    Find {
        file: PathBuf,
        term: String,
        #[command(flatten)]
        mode: MatchMode,
        /// Emit highlighted lines as HTML
        #[arg(long)]
        html: bool,
    },
    /// Reload and report a file whenever it settles after a change
    Watch { file: PathBuf },
}

#[derive(Args, Debug)]
struct SearchArgs {
    root: PathBuf,
    pattern: String,
    #[command(flatten)]
    mode: MatchMode,
    /// Only search files with these extensions (repeatable, e.g. -t rs -t .md)
    #[arg(short = 't', long = "type", value_name = "EXT")]
    file_types: Vec<String>,
    /// One JSON object per matching file
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone, Copy)]
struct MatchMode {
    #[arg(short = 'c', long)]
    case_sensitive: bool,
    #[arg(short = 'r', long = "regex")]
    use_regex: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Watch(#[from] WatchError),
    #[error("{0}")]
    SearchFailed(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _logging = logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = resolve_settings(cli.config.as_deref());
    let mut host = ViewerHost::new(&settings);

    match cli.command {
        Command::Search(args) => run_search(&mut host, args),
        Command::Open { file, line } => run_open(&mut host, &file, line),
        Command::Find {
            file,
            term,
            mode,
            html,
        } => run_find(&mut host, &file, &term, mode, html),
        Command::Watch { file } => run_watch(&mut host, &file),
    }
}

fn resolve_settings(config: Option<&Path>) -> Settings {
    if let Some(path) = config {
        return load_explicit_settings(path);
    }
    if let Err(err) = ensure_settings_file() {
        tracing::warn!(error = %err, "cannot create default settings file");
    }
    load_settings().unwrap_or_default()
}

fn run_search(host: &mut ViewerHost, args: SearchArgs) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let signals = install_termination_signals()?;

    host.open_folder(&args.root)?;
    let query = SearchQuery::new(args.pattern)
        .case_sensitive(args.mode.case_sensitive)
        .use_regex(args.mode.use_regex)
        .file_types(&args.file_types);

    let started = Instant::now();
    host.start_folder_search(runtime.handle(), query)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut printed = 0usize;
    loop {
        host.poll_search();
        for result in &host.search_state().files[printed..] {
            print_search_result(&mut out, result, args.json)?;
        }
        printed = host.search_state().files.len();

        if !host.is_searching() {
            break;
        }
        match signals.try_recv() {
            Ok(_) => host.cancel_search(),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    out.flush()?;

    let state = host.search_state();
    if let Some(message) = state.last_error.clone() {
        return Err(CliError::SearchFailed(message));
    }
    eprintln!(
        "{} matches in {} files ({} files searched, {:.2?})",
        state.total_matches,
        state.file_count(),
        state.files_searched,
        started.elapsed()
    );
    Ok(())
}

fn print_search_result(
    out: &mut impl Write,
    result: &FileSearchResult,
    json: bool,
) -> Result<(), CliError> {
    if json {
        serde_json::to_writer(&mut *out, result)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} ({})", result.path.display(), result.total_matches)?;
    for line in &result.line_matches {
        writeln!(out, "{:>6}: {}", line.line_number, line.line_text.trim_end())?;
    }
    Ok(())
}

fn run_open(host: &mut ViewerHost, file: &Path, line: Option<i64>) -> Result<(), CliError> {
    host.open_file(file)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(info) = host.viewer().file_info() {
        print_file_info(&mut out, &info)?;
    }

    let viewer = host.viewer_mut();
    if let Some(line) = line {
        if !viewer.go_to_line(line) {
            eprintln!("line {line} is out of range (1..={})", viewer.line_count());
            return Ok(());
        }
    }

    let Some(loaded) = viewer.file() else {
        return Ok(());
    };
    match viewer.current_line() {
        Some(n) => {
            if let Some(text) = loaded.line(n) {
                writeln!(out, "{n:>6}: {}", text.trim_end())?;
            }
        }
        None => {
            for (index, text) in loaded.lines().enumerate() {
                writeln!(out, "{:>6}: {}", index + 1, text.trim_end())?;
            }
        }
    }
    Ok(())
}

fn run_find(
    host: &mut ViewerHost,
    file: &Path,
    term: &str,
    mode: MatchMode,
    html: bool,
) -> Result<(), CliError> {
    host.open_file(file)?;
    let viewer = host.viewer_mut();
    let count = viewer.find(term, mode.case_sensitive, mode.use_regex)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (index, line) in viewer.lines().iter().enumerate() {
        if !line.is_highlighted() {
            continue;
        }
        let rendered = if html {
            line.to_html()
        } else {
            line.render_with(HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE, |text| {
                text.trim_end_matches('\r').to_string()
            })
        };
        writeln!(out, "{:>6}: {}", index + 1, rendered)?;
    }
    out.flush()?;
    eprintln!("{count} matches");
    Ok(())
}

fn run_watch(host: &mut ViewerHost, file: &Path) -> Result<(), CliError> {
    let signals = install_termination_signals()?;
    host.open_file(file)?;
    let handle = host.watch_current_file()?;
    if let Some(info) = host.viewer().file_info() {
        print_file_info(&mut io::stdout().lock(), &info)?;
    }
    if let Some(handle) = handle {
        eprintln!("watching {} (Ctrl-C to stop)", handle.path().display());
    }

    let poll = host.watches().timing().poll_interval;
    loop {
        match signals.recv_timeout(poll) {
            Ok(_) => break,
            Err(RecvTimeoutError::Timeout) => {}
            // 没有信号源（非 unix 平台）
            Err(RecvTimeoutError::Disconnected) => std::thread::sleep(poll),
        }

        for event in host.process_watch_events() {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match event {
                HostEvent::FileRefreshed { info, .. } => print_file_info(&mut out, &info)?,
                HostEvent::FileChanged(path) => writeln!(out, "changed: {}", path.display())?,
                HostEvent::FileRemoved(path) => writeln!(out, "removed: {}", path.display())?,
                HostEvent::RefreshFailed { path, error } => {
                    eprintln!("cannot reload {}: {error}", path.display())
                }
            }
        }
    }

    host.shutdown();
    Ok(())
}

fn print_file_info(out: &mut impl Write, info: &FileInfo) -> io::Result<()> {
    writeln!(
        out,
        "{} | {} | {} lines",
        info.name,
        info.size_display(),
        info.line_count
    )
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(not(unix), allow(dead_code))]
enum TerminationSignal {
    SigInt,
    SigTerm,
}

/// SIGINT / SIGTERM 转发到 channel，由主循环决定如何收尾
#[cfg(unix)]
fn install_termination_signals() -> io::Result<Receiver<TerminationSignal>> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let (tx, rx) = mpsc::channel();
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        for sig in signals.forever() {
            let signal = match sig {
                SIGINT => TerminationSignal::SigInt,
                SIGTERM => TerminationSignal::SigTerm,
                _ => continue,
            };
            tracing::info!(?signal, "termination signal received");
            if tx.send(signal).is_err() {
                break;
            }
        }
    });
    Ok(rx)
}

#[cfg(not(unix))]
fn install_termination_signals() -> io::Result<Receiver<TerminationSignal>> {
    let (_tx, rx) = mpsc::channel();
    Ok(rx)
}
