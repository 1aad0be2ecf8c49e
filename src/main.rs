#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod cli;
mod core;
mod prelude;
mod quantity;
mod render;
mod server;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    prelude::*,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(if args.debug { Level::DEBUG } else { Level::INFO })
        .init();
    info!(version = crate_version!(), "starting…");

    match args.command {
        Command::Serve(args) => args.run().await?,
        Command::Summary(args) => args.run()?,
    }

    info!("done!");
    Ok(())
}
