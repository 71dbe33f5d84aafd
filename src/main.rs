use anyhow::Context;
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use loghook::alerts::HttpWebhook;
use loghook::config::Settings;
use loghook::{Config, LogMonitor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on a single webhook request
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Command-line arguments for the log watcher
#[derive(Parser, Debug, Default)]
#[command(
    name = "loghook",
    version,
    about = "Monitor log files and send new entries to a chat webhook",
    long_about = "Follows one or more growing log files, groups appended lines into \
                  log entries using begin/end patterns, line limits and an idle timeout, \
                  and posts each entry to a Mattermost/Slack compatible incoming webhook."
)]
struct Cli {
    /// TOML file with the same settings; flags given here take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to a log file to watch
    #[arg(short, long = "file", value_name = "PATH")]
    files: Vec<String>,

    /// Glob pattern of log files to watch
    #[arg(short, long = "glob", value_name = "PATTERN")]
    globs: Vec<String>,

    /// Reopen the file if it is rotated or recreated (tail -F)
    #[arg(short = 'F', long)]
    reopen: bool,

    /// Start tailing at the end of the file
    #[arg(long, visible_alias = "se")]
    start_at_end: bool,

    /// Regex marking the first line of a log entry
    #[arg(short, long, value_name = "REGEX")]
    begin: Option<String>,

    /// Regex marking the last line of a log entry
    #[arg(short, long, value_name = "REGEX")]
    end: Option<String>,

    /// Regex excluding any entry with a matching line
    #[arg(short = 'x', long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// Maximum lines per entry; -1 means no limit
    #[arg(long = "maxlines", visible_alias = "max", allow_negative_numbers = true)]
    max_lines: Option<i64>,

    /// Minimum lines buffered before the timeout may flush an entry
    #[arg(long = "minlines", visible_alias = "min", allow_negative_numbers = true)]
    min_lines: Option<i64>,

    /// Milliseconds without new lines before buffered lines are sent; 0 sends each chunk immediately
    #[arg(short, long = "timeout", value_name = "MS", allow_negative_numbers = true)]
    timeout_ms: Option<i64>,

    /// Milliseconds between checks for new data at end of file
    #[arg(long = "poll-interval", value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Incoming webhook URL
    #[arg(long)]
    url: Option<String>,

    /// Username to post as
    #[arg(short, long)]
    username: Option<String>,

    /// Attachment sidebar color
    #[arg(long)]
    color: Option<String>,

    /// Prefix for messages
    #[arg(short, long)]
    prefix: Option<String>,

    /// Syntax highlighting tag for plain-text posts
    #[arg(long)]
    syntax: Option<String>,

    /// Post logs as text instead of an attachment
    #[arg(long)]
    no_attach: bool,
}

impl Cli {
    /// Start from the config file (or defaults) and apply command-line flags
    ///
    /// Repeatable flags add to the file's lists; scalar flags replace file
    /// values; boolean flags can only switch a setting on.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Config::load_settings(path)?
            }
            None => Settings::default(),
        };
        self.apply(&mut settings);
        Ok(settings)
    }

    fn apply(&self, settings: &mut Settings) {
        settings.files.extend(self.files.iter().cloned());
        settings.globs.extend(self.globs.iter().cloned());
        settings.exclude.extend(self.exclude.iter().cloned());

        if let Some(begin) = &self.begin {
            settings.begin = Some(begin.clone());
        }
        if let Some(end) = &self.end {
            settings.end = Some(end.clone());
        }
        if let Some(url) = &self.url {
            settings.url = Some(url.clone());
        }
        if let Some(v) = self.max_lines {
            settings.max_lines = v;
        }
        if let Some(v) = self.min_lines {
            settings.min_lines = v;
        }
        if let Some(v) = self.timeout_ms {
            settings.timeout_ms = v;
        }
        if let Some(v) = self.poll_interval_ms {
            settings.poll_interval_ms = v;
        }
        if let Some(v) = &self.username {
            settings.username = v.clone();
        }
        if let Some(v) = &self.color {
            settings.color = v.clone();
        }
        if let Some(v) = &self.prefix {
            settings.prefix = v.clone();
        }
        if let Some(v) = &self.syntax {
            settings.syntax = v.clone();
        }

        settings.reopen |= self.reopen;
        settings.start_at_end |= self.start_at_end;
        settings.no_attach |= self.no_attach;
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings()?;
    let config = Arc::new(Config::from_settings(settings).context("Invalid configuration")?);

    let sink = HttpWebhook::new(WEBHOOK_TIMEOUT).context("Failed to create HTTP client")?;
    let mut monitor = LogMonitor::new(config, Arc::new(sink));
    if monitor.start() == 0 {
        warn!("No files matched the given paths or globs");
    }

    let (shutdown_sender, mut shutdown_receiver) = tokio::sync::mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        if let Err(e) = shutdown_sender.send(()) {
            error!("Failed to send shutdown signal: {}", e);
        }
    })
    .context("Error setting signal handler")?;

    info!("loghook is running. Press Ctrl+C to stop.");
    shutdown_receiver.recv().await;
    info!("Signal received, stopping");

    monitor.stop();
    Ok(())
}

/// Logger honouring RUST_LOG, raised to debug level by `-d`
fn logger(debug: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logger(cli.debug).init();
    if cli.debug {
        info!("Debug logging enabled");
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
