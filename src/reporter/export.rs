use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use tera::{Context as TeraContext, Tera};

use crate::models::{ProbeResult, ScanMetrics};
use crate::tree::{SnapshotNode, TreeSnapshot};

pub struct JsonExporter;

#[derive(serde::Serialize, serde::Deserialize)]
struct ExportData {
    scan_time: String,
    metrics: ScanMetrics,
    results: Vec<ProbeResult>,
}

impl JsonExporter {
    pub fn export(results: &[ProbeResult], metrics: ScanMetrics, path: &str) -> Result<()> {
        let output = ExportData {
            scan_time: Utc::now().to_rfc3339(),
            metrics,
            results: results.to_vec(),
        };
        let json = serde_json::to_string_pretty(&output)?;
        fs::write(path, json).with_context(|| format!("Failed to write to {}", path))?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<Vec<ProbeResult>> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let data: ExportData = serde_json::from_str(&content)?;
        Ok(data.results)
    }
}

/// Plain-text dump of the filtered result set, one block per entry.
pub struct TextExporter;

impl TextExporter {
    pub fn export(results: &[ProbeResult], path: &str) -> Result<()> {
        let mut file =
            fs::File::create(path).with_context(|| format!("Failed to write to {}", path))?;
        for entry in results {
            writeln!(file, "URL: {}", entry.url)?;
            writeln!(file, "Status: {}", entry.status)?;
            writeln!(file, "Payload: {}", entry.payload)?;
            writeln!(file, "Length: {}", entry.length)?;
            writeln!(file, "Error: {}", entry.error)?;
            writeln!(file, "{}", "-".repeat(40))?;
        }
        Ok(())
    }
}

pub struct HtmlExporter;

impl HtmlExporter {
    pub fn export(snapshot: &TreeSnapshot, path: &str) -> Result<()> {
        let mut tera = Tera::default();
        tera.add_raw_template("tree", Self::template())?;
        // Recursive tera macros are awkward; flatten up front instead.
        let mut visible_rows = Vec::new();
        for node in &snapshot.visible {
            Self::flatten(node, 0, &mut visible_rows);
        }
        let mut hidden_rows = Vec::new();
        for node in &snapshot.hidden {
            Self::flatten(node, 0, &mut hidden_rows);
        }

        let mut context = TeraContext::new();
        context.insert(
            "generated",
            &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        context.insert("visible_rows", &visible_rows);
        context.insert("hidden_rows", &hidden_rows);

        let html = tera.render("tree", &context)?;
        fs::write(path, html).with_context(|| format!("Failed to write to {}", path))?;
        Ok(())
    }

    fn flatten(node: &SnapshotNode, depth: usize, rows: &mut Vec<HtmlRow>) {
        rows.push(HtmlRow {
            indent_px: depth * 20,
            path: node.path.clone(),
            severity: node.severity.to_string(),
            status: node
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            url: node.url.clone().unwrap_or_default(),
        });
        for child in &node.children {
            Self::flatten(child, depth + 1, rows);
        }
    }

    fn template() -> &'static str {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>webrecon Site Map</title>
    <style>
        body { font-family: -apple-system, 'Segoe UI', sans-serif; background: #0d1117; color: #c9d1d9; padding: 2rem; }
        h1 { color: #58a6ff; }
        h2 { color: #8b949e; margin-top: 2rem; }
        .row { padding: 0.25rem 0; border-bottom: 1px solid #21262d; }
        .path { font-family: monospace; }
        .sev { padding: 0.1rem 0.4rem; border-radius: 4px; font-size: 0.75rem; margin-left: 0.5rem; }
        .sev.high { background: #f8514933; color: #f85149; }
        .sev.medium { background: #d2992233; color: #d29922; }
        .sev.low { background: #58a6ff33; color: #58a6ff; }
        .sev.unknown { background: #8b949e33; color: #8b949e; }
        .status { color: #8b949e; font-size: 0.75rem; margin-left: 0.5rem; }
    </style>
</head>
<body>
    <h1>webrecon Site Map</h1>
    <p>Generated: {{ generated }}</p>
    <h2>Visible</h2>
    {% for row in visible_rows %}
    <div class="row" style="padding-left: {{ row.indent_px }}px">
        <span class="path">{{ row.path }}</span><span class="sev {{ row.severity }}">{{ row.severity }}</span><span class="status">{{ row.status }}</span>
    </div>
    {% endfor %}
    <h2>Hidden</h2>
    {% for row in hidden_rows %}
    <div class="row" style="padding-left: {{ row.indent_px }}px">
        <span class="path">{{ row.path }}</span><span class="sev {{ row.severity }}">{{ row.severity }}</span><span class="status">{{ row.status }}</span>
    </div>
    {% endfor %}
</body>
</html>"#
    }
}

#[derive(serde::Serialize)]
struct HtmlRow {
    indent_px: usize,
    path: String,
    severity: String,
    status: String,
    url: String,
}
