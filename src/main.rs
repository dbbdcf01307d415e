use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use feedback_review::app::{App, Command, run_command};
use feedback_review::config::Config;
use feedback_review::logging::init_logging;
use feedback_review::prompt::Prompter;
use feedback_review::store::FeedbackStore;

/// Collect course feedback and report average ratings.
#[derive(Parser, Debug)]
#[command(name = "feedback")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a config file, defaults to ~/.config/feedback-review/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Feedback store to use instead of the configured one
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            Config::from_file(path).context(format!("Reading config {}", path.display()))?
        }
        None => Config::load_or_write_default(None)?,
    };
    let store_path = args.store.clone().unwrap_or_else(|| config.store.path.clone());
    debug!("Store path: {}", store_path.display());
    let store = FeedbackStore::new(store_path);

    let stdout = io::stdout();
    match args.command {
        None => {
            let prompter = Prompter::new(io::stdin().lock(), stdout.lock());
            let mut app = App::new(&config, store, prompter);
            app.run()?;
        }
        Some(command) => run_command(command, &config, &store, &mut stdout.lock())?,
    }
    Ok(())
}
