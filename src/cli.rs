mod data;
mod serve;
mod summary;

use clap::{Parser, Subcommand};

use crate::cli::{serve::ServeArgs, summary::SummaryArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// Verbose logging.
    #[clap(long, env = "DEBUG", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: load the prices and serve the map.
    #[clap(name = "serve")]
    Serve(Box<ServeArgs>),

    /// Print the yearly and monthly means of a year.
    #[clap(name = "summary")]
    Summary(Box<SummaryArgs>),
}
