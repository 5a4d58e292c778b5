use colored::Colorize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::models::{ProbeResult, ScanMetrics};
use crate::tree::{SnapshotNode, TreeSnapshot};

pub struct ConsoleReporter;

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    id: usize,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Length")]
    length: usize,
    #[tabled(rename = "Payload")]
    payload: String,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn print_results(&self, results: &[ProbeResult]) {
        let rows: Vec<ResultRow> = results
            .iter()
            .map(|r| ResultRow {
                id: r.id,
                url: r.url.clone(),
                status: Self::colorize_status(r),
                length: r.length,
                payload: r.payload.clone(),
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        println!("{}", table);
    }

    pub fn print_metrics(&self, metrics: &ScanMetrics) {
        println!(
            "\n{} {:.2}s | {} {} | {} {} | {} {:.1}/s",
            "elapsed:".bold(),
            metrics.running_time_secs,
            "processed:".bold(),
            metrics.processed_requests,
            "filtered:".bold(),
            metrics.filtered_requests,
            "rate:".bold(),
            metrics.requests_per_second,
        );
    }

    pub fn print_snapshot(&self, snapshot: &TreeSnapshot) {
        if !snapshot.visible.is_empty() {
            println!("{}", "Site tree".bold());
            for root in &snapshot.visible {
                Self::print_node(root, 0);
            }
        }
        if !snapshot.hidden.is_empty() {
            println!("{}", "Hidden".bold().magenta());
            for root in &snapshot.hidden {
                for child in &root.children {
                    Self::print_node(child, 1);
                }
            }
        }
    }

    fn print_node(node: &SnapshotNode, depth: usize) {
        let severity = match node.severity {
            crate::models::Severity::High => "high".red().to_string(),
            crate::models::Severity::Medium => "medium".yellow().to_string(),
            crate::models::Severity::Low => "low".blue().to_string(),
            crate::models::Severity::Unknown => "unknown".dimmed().to_string(),
        };
        let status = node
            .status
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();
        println!("{}{} ({}){}", "  ".repeat(depth), node.path, severity, status);
        for child in &node.children {
            Self::print_node(child, depth + 1);
        }
    }

    fn colorize_status(result: &ProbeResult) -> String {
        if result.error {
            return "ERR".red().bold().to_string();
        }
        let text = result.status.to_string();
        match result.status {
            200..=299 => text.green().to_string(),
            301 | 302 => text.yellow().to_string(),
            401 | 403 => text.cyan().to_string(),
            500..=599 => text.red().to_string(),
            _ => text.dimmed().to_string(),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
