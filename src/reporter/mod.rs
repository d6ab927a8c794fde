mod json;
mod text;

pub use json::*;
pub use text::*;

use crate::error::Result;
use crate::types::SolveOutcome;
use std::fs;
use std::path::Path;

/// Supported report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    /// Parse a comma-separated format list; "all" selects everything
    pub fn parse_list(list: &str) -> Vec<OutputFormat> {
        if list == "all" {
            return vec![OutputFormat::Json, OutputFormat::Text];
        }
        list.split(',')
            .filter_map(|f| match f.trim().to_lowercase().as_str() {
                "json" => Some(OutputFormat::Json),
                "text" | "txt" => Some(OutputFormat::Text),
                _ => None,
            })
            .collect()
    }
}

/// Write the solve outcome to the output directory in the chosen formats
pub fn generate_reports(
    outcome: &SolveOutcome,
    output: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output)?;
    for format in formats {
        match format {
            OutputFormat::Json => {
                fs::write(output.join("placements.json"), generate_json_report(outcome)?)?;
            }
            OutputFormat::Text => {
                fs::write(output.join("report.txt"), summary_text(outcome))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_format_lists() {
        assert_eq!(
            OutputFormat::parse_list("all"),
            vec![OutputFormat::Json, OutputFormat::Text]
        );
        assert_eq!(
            OutputFormat::parse_list("json, txt"),
            vec![OutputFormat::Json, OutputFormat::Text]
        );
        assert_eq!(OutputFormat::parse_list("csv"), Vec::new());
    }
}
