use clap::Parser;
use tracing::Level;
use userstore::config::SessionConfig;
use userstore::error::Result;
use userstore::model::FormatKind;
use userstore::session::{self, SessionOutcome};
use userstore::store::json::JsonStore;
use userstore::store::xml::XmlStore;
use userstore::terminal::ConsoleTerminal;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install logger: {}", e);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = SessionConfig::load(&cli.dir)?;
    let mut terminal = if cli.no_pause {
        ConsoleTerminal::new().without_pause()
    } else {
        ConsoleTerminal::new()
    };

    let formats: &[FormatKind] = match cli.command.unwrap_or(Commands::All) {
        Commands::Json => &[FormatKind::Json],
        Commands::Xml => &[FormatKind::Xml],
        Commands::All => &[FormatKind::Json, FormatKind::Xml],
    };

    let plan = config.plan();
    for &kind in formats {
        let paths = config.paths(&cli.dir, kind);
        let outcome: SessionOutcome = match kind {
            FormatKind::Json => session::run(&JsonStore::new(), &paths, &plan, &mut terminal),
            FormatKind::Xml => session::run(&XmlStore::new(), &paths, &plan, &mut terminal),
        };
        // An aborted session is reported on the console and still exits 0.
        tracing::debug!(%kind, state = ?outcome.state, "session ended");
    }

    Ok(())
}
