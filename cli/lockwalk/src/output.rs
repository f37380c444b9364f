//! Printing walk events.
//!
//! Chains and JSON lines stream as the walk goes; the tree needs every
//! emission first and is written by [`Printer::finish`]. Notices and fatal
//! errors always go to the diagnostic stream.

use std::io::{self, Write};

use lockwalk_core::{chain_line, format_tree, EventSink, Notice, PackageNode, Recorder, WalkError};
use serde::{Deserialize, Serialize};

/// How emitted packages are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One ancestor chain per line
    #[default]
    Chains,
    /// ASCII tree under the project root
    Tree,
    /// One JSON object per line
    Json,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    path: Vec<String>,
    #[serde(flatten)]
    node: &'a PackageNode,
}

/// An [`EventSink`] writing to an output and a diagnostic stream.
pub struct Printer<W, D> {
    out: W,
    diag: D,
    format: OutputFormat,
    recorder: Recorder,
    error: Option<io::Error>,
    failures: usize,
}

impl<W: Write, D: Write> Printer<W, D> {
    pub fn new(out: W, diag: D, format: OutputFormat) -> Self {
        Printer {
            out,
            diag,
            format,
            recorder: Recorder::new(),
            error: None,
            failures: 0,
        }
    }

    /// Number of fatal errors reported so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Write anything still buffered and surface the first write error.
    pub fn finish(mut self, root_name: &str, root_version: &str) -> io::Result<()> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if self.format == OutputFormat::Tree {
            self.out
                .write_all(format_tree(root_name, root_version, &self.recorder).as_bytes())?;
        }
        self.out.flush()?;
        self.diag.flush()
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(error) = result {
            self.error.get_or_insert(error);
        }
    }

    fn write_package(&mut self, ancestors: &[PackageNode], node: &PackageNode) -> io::Result<()> {
        match self.format {
            OutputFormat::Chains => writeln!(self.out, "{}", chain_line(ancestors, node)),
            OutputFormat::Json => {
                let record = JsonRecord {
                    path: ancestors.iter().map(PackageNode::id).collect(),
                    node,
                };
                serde_json::to_writer(&mut self.out, &record)?;
                writeln!(self.out)
            }
            OutputFormat::Tree => {
                self.recorder.on_package(ancestors, node);
                Ok(())
            }
        }
    }
}

impl<W: Write, D: Write> EventSink for Printer<W, D> {
    fn on_package(&mut self, ancestors: &[PackageNode], node: &PackageNode) {
        let result = self.write_package(ancestors, node);
        self.record(result);
    }

    fn on_error(&mut self, error: &WalkError) {
        self.failures += 1;
        let result = writeln!(self.diag, "error: failed to resolve dependency: {error}");
        self.record(result);
    }

    fn on_info(&mut self, notice: &Notice) {
        let result = writeln!(self.diag, "info: {notice}");
        self.record(result);
    }
}
