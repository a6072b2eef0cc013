//! Report rendering for terminal, markdown and JSON output

use clap::ValueEnum;
use colored::Colorize;
use schemadrift_core::{InventoryReport, PresenceMatrix, ReportRow, UnavailableHost, OBJECT_NAME_FIELD};

const OBJECT_HEADER: &str = OBJECT_NAME_FIELD;
const BASELINE_MARK: &str = " (baseline)";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Aligned text table
    #[default]
    Table,
    /// GitHub-flavoured markdown
    Markdown,
    /// report.json v1
    Json,
}

/// Presentation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Only show rows whose presence differs across hosts
    pub drift_only: bool,

    /// Emit ANSI colours
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            drift_only: false,
            color: true,
        }
    }
}

/// Render a report in the requested format
pub fn render(report: &InventoryReport, format: Format, options: &RenderOptions) -> anyhow::Result<String> {
    match format {
        Format::Table => {
            let mut out = render_table(&report.matrix, options);
            out.push_str(&render_footer(report, options));
            Ok(out)
        }
        Format::Markdown => Ok(render_markdown(report, options)),
        Format::Json => Ok(report.to_json()? + "\n"),
    }
}

fn visible_rows<'a>(matrix: &'a PresenceMatrix, options: &RenderOptions) -> Vec<&'a ReportRow> {
    matrix
        .rows
        .iter()
        .filter(|row| !options.drift_only || row.is_drift())
        .collect()
}

fn host_header(matrix: &PresenceMatrix, index: usize) -> String {
    let host = &matrix.hosts[index];
    if *host == matrix.baseline {
        format!("{}{}", host, BASELINE_MARK)
    } else {
        host.to_string()
    }
}

/// Render the presence matrix as an aligned table
///
/// Cells are padded before colouring so ANSI codes never skew alignment.
pub fn render_table(matrix: &PresenceMatrix, options: &RenderOptions) -> String {
    let rows = visible_rows(matrix, options);
    let headers: Vec<String> = (0..matrix.hosts.len()).map(|i| host_header(matrix, i)).collect();

    let name_width = rows
        .iter()
        .map(|row| row.object_name.as_str().chars().count())
        .chain(std::iter::once(OBJECT_HEADER.len()))
        .max()
        .unwrap_or(OBJECT_HEADER.len());
    let widths: Vec<usize> = headers
        .iter()
        .map(|h| h.chars().count().max("false".len()))
        .collect();

    let mut out = String::new();

    let mut header_line = format!("{:<width$}", OBJECT_HEADER, width = name_width);
    for (header, width) in headers.iter().zip(&widths) {
        header_line.push_str("  ");
        header_line.push_str(&format!("{:<width$}", header, width = *width));
    }
    let header_line = header_line.trim_end().to_string();
    if options.color {
        out.push_str(&header_line.bold().to_string());
    } else {
        out.push_str(&header_line);
    }
    out.push('\n');

    let rule_width = name_width + widths.iter().map(|w| w + 2).sum::<usize>();
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');

    for row in rows {
        let mut line = format!("{:<width$}", row.object_name.as_str(), width = name_width);

        for (host, width) in matrix.hosts.iter().zip(&widths) {
            line.push_str("  ");
            let cell = match row.get(host) {
                Some(true) => "true",
                Some(false) => "false",
                None => "-",
            };
            let padded = format!("{:<width$}", cell, width = *width);

            if options.color {
                let painted = match row.get(host) {
                    Some(true) => padded.green(),
                    Some(false) => padded.red().bold(),
                    None => padded.dimmed(),
                };
                line.push_str(&painted.to_string());
            } else {
                line.push_str(&padded);
            }
        }

        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn render_footer(report: &InventoryReport, options: &RenderOptions) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!(
        "{} objects, {} drifted, {} hosts surveyed\n",
        summary.objects, summary.drifted, summary.hosts_surveyed
    ));

    if options.drift_only && summary.drifted == 0 {
        let line = "✓ No drift detected!";
        if options.color {
            out.push_str(&line.green().bold().to_string());
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    out.push_str(&render_unavailable(&report.unavailable, options));
    out
}

/// List hosts that are absent from the matrix
pub fn render_unavailable(unavailable: &[UnavailableHost], options: &RenderOptions) -> String {
    if unavailable.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let title = "Unavailable hosts (not compared):";
    if options.color {
        out.push_str(&title.yellow().bold().to_string());
    } else {
        out.push_str(title);
    }
    out.push('\n');

    for host in unavailable {
        out.push_str(&format!("  - {}: {}\n", host.host, host.reason));
    }

    out
}

fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Render the report as markdown
pub fn render_markdown(report: &InventoryReport, options: &RenderOptions) -> String {
    let matrix = &report.matrix;
    let mut md = String::new();

    md.push_str("# Schema Inventory Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));
    md.push_str(&format!("**Baseline:** {}\n\n", markdown_cell(matrix.baseline.as_str())));
    md.push_str(&format!("**Granularity:** {}\n\n", report.granularity));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Objects: {}\n", report.summary.objects));
    md.push_str(&format!("- Drifted: {}\n", report.summary.drifted));
    md.push_str(&format!("- Hosts surveyed: {}\n", report.summary.hosts_surveyed));
    md.push_str(&format!("- Hosts unavailable: {}\n", report.summary.hosts_unavailable));
    md.push('\n');

    let rows = visible_rows(matrix, options);

    if rows.is_empty() {
        if options.drift_only {
            md.push_str("✅ **No drift detected!**\n\n");
        } else {
            md.push_str("_No objects found._\n\n");
        }
    } else {
        md.push_str("## Presence\n\n");

        md.push_str("| ");
        md.push_str(OBJECT_HEADER);
        for i in 0..matrix.hosts.len() {
            md.push_str(&format!(" | {}", markdown_cell(&host_header(matrix, i))));
        }
        md.push_str(" |\n");

        md.push_str("|---");
        for _ in &matrix.hosts {
            md.push_str("|:---:");
        }
        md.push_str("|\n");

        for row in rows {
            md.push_str(&format!("| {}", markdown_cell(row.object_name.as_str())));
            for host in &matrix.hosts {
                let cell = match row.get(host) {
                    Some(true) => "✅",
                    Some(false) => "❌",
                    None => "-",
                };
                md.push_str(&format!(" | {}", cell));
            }
            md.push_str(" |\n");
        }
        md.push('\n');
    }

    if !report.unavailable.is_empty() {
        md.push_str("## Unavailable Hosts\n\n");
        for host in &report.unavailable {
            md.push_str(&format!(
                "- ⚠️ **{}**: {}\n",
                markdown_cell(host.host.as_str()),
                host.reason
            ));
        }
        md.push('\n');
    }

    md
}
