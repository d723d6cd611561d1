//! Output formatting utilities

use std::io::{self, IsTerminal};

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::table::TableRow;
use crate::cli::OutputFormat;
use crate::core::pagination::Paged;

/// Resolve `auto` against whether stdout is a terminal
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if io::stdout().is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Json
            }
        }
        other => other,
    }
}

pub fn render_table<T: TableRow>(rows: &[T]) -> String {
    let mut builder = Builder::default();
    builder.push_record(T::headers().into_iter().map(String::from));
    for row in rows {
        builder.push_record(row.cells());
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn render_csv<T: TableRow>(rows: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(T::headers()).into_diagnostic()?;
    for row in rows {
        writer.write_record(row.cells()).into_diagnostic()?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| miette::miette!("Failed to write CSV: {}", e.error()))?;
    String::from_utf8(bytes).into_diagnostic()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

/// Print one page of a list
pub fn print_page<T: TableRow + Serialize>(page: &Paged<T>, format: OutputFormat) -> Result<()> {
    match effective_format(format) {
        OutputFormat::Json => print_json(page),
        OutputFormat::Csv => {
            print!("{}", render_csv(&page.result)?);
            Ok(())
        }
        _ => {
            if page.result.is_empty() {
                println!("{}", style("No results.").yellow());
            } else {
                println!("{}", render_table(&page.result));
            }
            println!(
                "{} page {} of {} ({} results)",
                style("·").dim(),
                page.page,
                page.total_pages.max(1),
                style(page.total_results).cyan()
            );
            Ok(())
        }
    }
}

/// Print an unpaged list
pub fn print_rows<T: TableRow + Serialize>(rows: &[T], format: OutputFormat) -> Result<()> {
    match effective_format(format) {
        OutputFormat::Json => print_json(rows),
        OutputFormat::Csv => {
            print!("{}", render_csv(rows)?);
            Ok(())
        }
        _ => {
            if rows.is_empty() {
                println!("{}", style("No results.").yellow());
            } else {
                println!("{}", render_table(rows));
            }
            Ok(())
        }
    }
}

/// Print a single record, with an optional confirmation line in table mode
pub fn print_record<T: TableRow + Serialize>(
    record: &T,
    message: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    match effective_format(format) {
        OutputFormat::Json => print_json(record),
        OutputFormat::Csv => {
            print!("{}", render_csv(std::slice::from_ref(record))?);
            Ok(())
        }
        _ => {
            if let Some(message) = message {
                println!("{} {}", style("✓").green(), message);
            }
            println!("{}", render_table(std::slice::from_ref(record)));
            Ok(())
        }
    }
}

/// Print a bare confirmation, or `{"ok": true, ...}` as JSON
pub fn print_done(message: &str, format: OutputFormat) -> Result<()> {
    match effective_format(format) {
        OutputFormat::Json => print_json(&serde_json::json!({ "ok": true, "message": message })),
        _ => {
            println!("{} {}", style("✓").green(), message);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UsState;

    fn states() -> Vec<UsState> {
        vec![
            UsState {
                id: 16,
                name: "Iowa".to_string(),
                code: "IA".to_string(),
            },
            UsState {
                id: 28,
                name: "Nebraska, The".to_string(),
                code: "NE".to_string(),
            },
        ]
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = render_csv(&states()).unwrap();
        assert_eq!(csv, "ID,CODE,NAME\n16,IA,Iowa\n28,NE,\"Nebraska, The\"\n");
    }

    #[test]
    fn test_table_has_headers_and_rows() {
        let table = render_table(&states());
        assert!(table.contains("CODE"));
        assert!(table.contains("Iowa"));
        assert!(table.contains("NE"));
    }

    #[test]
    fn test_explicit_format_is_kept() {
        assert_eq!(effective_format(OutputFormat::Csv), OutputFormat::Csv);
    }
}
