use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "userstore", version)]
#[command(about = "Edit a small list of users kept as JSON or XML", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the data files and userstore.json
    #[arg(short, long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Do not wait for a keypress between listings
    #[arg(long, global = true)]
    pub no_pause: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the session on the JSON files
    Json,

    /// Run the session on the XML files
    Xml,

    /// Run the JSON session, then the XML one (default)
    All,
}
