//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Control CLI for inspecting OpenADR 3.0 documents."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use oadr_model::{decode_value_str, encode_string, DecodeOptions, Notification, OpenAdrObject};
use tracing::debug;

/// Top-level document accepted by the CLI.
#[derive(Debug, PartialEq)]
enum Document {
    Object(OpenAdrObject),
    Notification(Notification),
}

impl Document {
    fn summary(&self) -> String {
        match self {
            Document::Object(object) => describe(object),
            Document::Notification(notification) => {
                format!("{} {}", notification.operation(), describe(notification.object()))
            }
        }
    }

    fn encode(&self, pretty: bool) -> String {
        match self {
            Document::Object(object) => encode_string(object, pretty),
            Document::Notification(notification) => encode_string(notification, pretty),
        }
    }
}

fn describe(object: &OpenAdrObject) -> String {
    let id = object.id().map(|id| id.as_str().to_owned());
    format!("{}\t{}", object.object_type(), id.as_deref().unwrap_or("-"))
}

#[derive(Debug, Args)]
pub struct Source {
    /// JSON file to read, or `-` for stdin.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Treat the document as a notification envelope.
    #[arg(long)]
    notification: bool,
}

impl Source {
    fn read(&self, options: &DecodeOptions) -> Result<Document> {
        read_document(&self.file, self.notification, options)
    }
}

fn read_text(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("unable to read document from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("unable to read {}", path.display()))
}

fn read_document(path: &Path, notification: bool, options: &DecodeOptions) -> Result<Document> {
    let text = read_text(path)?;
    debug!(path = %path.display(), notification, "decoding document");
    let document = if notification {
        decode_value_str::<Notification>(&text, options).map(Document::Notification)
    } else {
        decode_value_str::<OpenAdrObject>(&text, options).map(Document::Object)
    };
    document.with_context(|| format!("failed to decode {}", path.display()))
}

#[derive(Debug, Args)]
pub struct DecodeCommand {
    #[command(flatten)]
    source: Source,
}

impl DecodeCommand {
    pub fn execute(self, options: &DecodeOptions) -> Result<ExitCode> {
        let document = self.source.read(options)?;
        println!("{}", document.summary());
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Debug, Args)]
pub struct NormalizeCommand {
    #[command(flatten)]
    source: Source,
    /// Indent the output.
    #[arg(long)]
    pretty: bool,
}

impl NormalizeCommand {
    pub fn execute(self, options: &DecodeOptions) -> Result<ExitCode> {
        let document = self.source.read(options)?;
        println!("{}", document.encode(self.pretty));
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Debug, Args)]
pub struct CompareCommand {
    /// First JSON file.
    #[arg(value_name = "LEFT")]
    left: PathBuf,
    /// Second JSON file.
    #[arg(value_name = "RIGHT")]
    right: PathBuf,
    /// Treat both documents as notification envelopes.
    #[arg(long)]
    notification: bool,
}

impl CompareCommand {
    /// Prints `equal` and succeeds, or prints `different` and exits with 1.
    pub fn execute(self, options: &DecodeOptions) -> Result<ExitCode> {
        let left = read_document(&self.left, self.notification, options)?;
        let right = read_document(&self.right, self.notification, options)?;
        if left == right {
            println!("equal");
            Ok(ExitCode::SUCCESS)
        } else {
            println!("different");
            Ok(ExitCode::from(1))
        }
    }
}
