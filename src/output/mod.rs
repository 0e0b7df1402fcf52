//! Output formatting for CLI results

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod display;
pub mod json;
pub mod table;

/// Types that can be rendered in every [`OutputFormat`]
pub trait Formattable {
    /// Render for the given format, tagging JSON with the snapshot generation.
    fn format(&self, format: OutputFormat, generation: u64) -> Result<String>;

    /// Format and print to stdout.
    fn print(&self, format: OutputFormat, generation: u64) -> Result<()> {
        println!("{}", self.format(format, generation)?);
        Ok(())
    }
}

impl<T: Tabled + Serialize> Formattable for Vec<T> {
    fn format(&self, format: OutputFormat, generation: u64) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(table::format_table(self)),
            OutputFormat::Json => Ok(json::format_json(self, generation)?),
        }
    }
}
