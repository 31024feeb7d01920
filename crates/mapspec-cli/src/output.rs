//! Output formatting and writing utilities
//!
//! This module formats command results as human-readable text, JSON or
//! YAML, and renders failures as `{"error": {"kind", "message"}}` in the
//! machine formats.

use crate::cli::OutputFormat;
use crate::error::{self, Error, Result};
use crate::logging::redaction;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Trait for formatting serializable values
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Documents read best as indented JSON
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message (human format only)
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format.is_machine() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message (human format only)
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format.is_machine() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning (human format only; machine formats log it instead)
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format.is_machine() {
            tracing::warn!("{}", message);
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message (human format only)
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format.is_machine() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header (human format only)
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format.is_machine() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut logged = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut logged);
        trace!(data = %logged, "Outputting data");

        let formatted = self.format.format(value)?;
        if formatted.ends_with('\n') {
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }

    /// Report a failed command
    ///
    /// Machine formats get a JSON or YAML error document on the output
    /// stream; the human format gets a message on stderr.
    pub fn failure(&mut self, err: &Error) -> Result<()> {
        if self.format.is_machine() {
            let report = json!({
                "error": {
                    "kind": err.kind(),
                    "message": err.to_string(),
                }
            });
            self.data(&report)
        } else {
            eprintln!("{}", error::format_error(err, self.use_color));
            Ok(())
        }
    }

    /// Write a table (human format only)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || self.format.is_machine() {
            return Ok(());
        }

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let header_row = headers
            .iter()
            .zip(&widths)
            .map(|(h, width)| format!("{:width$}", h, width = width))
            .collect::<Vec<_>>()
            .join(" │ ");

        if self.use_color {
            self.writeln(header_row.trim_end().bold().to_string().as_str())?;
        } else {
            self.writeln(header_row.trim_end())?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => format!("{:width$}", cell, width = width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }
}
