use std::io::{self, Write};

use bullion_core::Envelope;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Ndjson => write_ndjson(&mut out, envelope)?,
        OutputFormat::Table => write_table(&mut out, envelope)?,
    }
    Ok(())
}

/// `{"meta": ..}` first, then one line per data row, then one per error.
fn write_ndjson<W: Write>(out: &mut W, envelope: &Envelope<Value>) -> Result<(), CliError> {
    writeln!(out, "{}", serde_json::json!({ "meta": envelope.meta }))?;
    match &envelope.data {
        Value::Array(rows) => {
            for row in rows {
                writeln!(out, "{}", serde_json::to_string(row)?)?;
            }
        }
        other => writeln!(out, "{}", serde_json::to_string(other)?)?,
    }
    for error in &envelope.errors {
        writeln!(out, "{}", serde_json::json!({ "error": error }))?;
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, envelope: &Envelope<Value>) -> Result<(), CliError> {
    writeln!(out, "request_id  : {}", envelope.meta.request_id)?;
    writeln!(out, "generated_at: {}", envelope.meta.generated_at)?;
    if let Some(provider) = envelope.meta.provider {
        writeln!(out, "provider    : {provider}")?;
    }
    writeln!(out, "latency_ms  : {}", envelope.meta.latency_ms)?;

    if !envelope.meta.warnings.is_empty() {
        writeln!(out, "warnings:")?;
        for warning in &envelope.meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }

    writeln!(out)?;
    match &envelope.data {
        Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
            for line in table_lines(rows) {
                writeln!(out, "{line}")?;
            }
        }
        Value::Array(rows) if rows.is_empty() => writeln!(out, "(no rows)")?,
        Value::Object(fields) => {
            let width = fields.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in fields {
                writeln!(out, "{key:<width$}  {}", cell(value))?;
            }
        }
        other => writeln!(out, "{}", serde_json::to_string_pretty(other)?)?,
    }

    if !envelope.errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "errors:")?;
        for error in &envelope.errors {
            writeln!(out, "  - {}: {}", error.code, error.message)?;
        }
    }
    Ok(())
}

/// Columns are the keys of the first row.
fn table_lines(rows: &[Value]) -> Vec<String> {
    let empty = Map::new();
    let object = |row: &Value| row.as_object().unwrap_or(&empty).clone();
    let headers: Vec<String> = object(&rows[0]).keys().cloned().collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let fields = object(row);
            headers
                .iter()
                .map(|header| fields.get(header).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain([header.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(format_row(&headers));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    lines.extend(cells.iter().map(|row| format_row(row)));
    lines
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
