//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Control CLI for inspecting OpenADR 3.0 documents."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use oadr_common::{init_tracing, AppConfig};

mod document;
mod enums;

const CONFIG_CANDIDATES: [&str; 2] = ["oadr.toml", "configs/oadr.toml"];

#[derive(Debug, Parser)]
#[command(author, version, about = "OpenADR 3.0 document utility", long_about = None)]
struct Cli {
    /// Configuration file (defaults to OADR_CONFIG, then ./oadr.toml, then ./configs/oadr.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decode a document and print its kind and identity.
    Decode(document::DecodeCommand),
    /// Decode a document and print its canonical encoding.
    Normalize(document::NormalizeCommand),
    /// Decode two documents and report whether they are equal.
    Compare(document::CompareCommand),
    /// List the registered values of an open enumeration.
    Enums(enums::EnumsCommand),
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_path(path),
        None => AppConfig::load(&CONFIG_CANDIDATES),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing("oadrctl", &config.logging)?;
    let options = config.decode_options();
    match cli.command {
        Commands::Decode(cmd) => cmd.execute(&options),
        Commands::Normalize(cmd) => cmd.execute(&options),
        Commands::Compare(cmd) => cmd.execute(&options),
        Commands::Enums(cmd) => cmd.execute(),
    }
}
