use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use webrecon::cli::{Cli, Commands};
use webrecon::http::HttpGateway;
use webrecon::models::{FilterConfig, Observation, ProbeResult, ScanConfig, ScanMetrics};
use webrecon::reporter::{ConsoleReporter, HtmlExporter, JsonExporter, TextExporter};
use webrecon::scanner::{BruteForcer, Crawler, ScanControl};
use webrecon::tree::{SnapshotStore, TreeService};
use webrecon::{BruteConfig, CrawlConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            url,
            depth,
            limit,
            delay,
            exclude,
            proxy,
            user_agent,
            timeout,
            tree_dir,
            output,
            html,
        } => {
            let mut scan = ScanConfig::new(&url)?
                .with_delay(Duration::from_millis(delay))
                .with_headers(default_headers(&user_agent));
            if let Some(proxy) = proxy {
                scan = scan.with_proxy(proxy);
            }
            let gateway = HttpGateway::new(&scan.target_url, timeout, scan.proxy.as_deref())?;
            let mut config = CrawlConfig::new(scan, depth, limit);
            if let Some(patterns) = exclude {
                config = config.with_exclusions(&split_list(&patterns))?;
            }

            let mut crawler = Crawler::new(config, gateway);
            stop_on_ctrl_c(crawler.control());

            let pb = spinner();
            let progress = pb.clone();
            crawler.set_result_callback(Box::new(move |result: &ProbeResult| {
                progress.inc(1);
                progress.set_message(result.url.clone());
            }));

            crawler.run().await;
            pb.finish_and_clear();

            let reporter = ConsoleReporter::new();
            reporter.print_results(crawler.results());
            reporter.print_metrics(&crawler.metrics());

            let snapshot = update_tree(&tree_dir, &url, crawler.filtered_results()).await?;
            reporter.print_snapshot(&snapshot);

            if let Some(path) = output {
                JsonExporter::export(crawler.results(), crawler.metrics(), &path)?;
            }
            if let Some(path) = html {
                HtmlExporter::export(&snapshot, &path)?;
            }
        }

        Commands::Brute {
            url,
            wordlist,
            prefix,
            allow,
            deny,
            min_length,
            delay,
            proxy,
            timeout,
            tree_dir,
            output,
            txt,
        } => {
            let words = load_wordlist(&wordlist)?;
            let mut scan = ScanConfig::new(&url)?
                .with_delay(Duration::from_millis(delay))
                .with_headers(default_headers("webrecon/1.0"));
            if let Some(proxy) = proxy {
                scan = scan.with_proxy(proxy);
            }
            let gateway = HttpGateway::new(&scan.target_url, timeout, scan.proxy.as_deref())?;

            let filter = FilterConfig {
                allow_status: parse_status_list(allow.as_deref())?,
                deny_status: parse_status_list(deny.as_deref())?,
                min_length,
            };
            let mut config = BruteConfig::new(scan, words)?.with_filter(filter);
            if let Some(prefix) = prefix {
                config = config.with_prefix(prefix);
            }

            let total = config.wordlist.len() as u64;
            let mut scanner = BruteForcer::new(config, gateway);
            stop_on_ctrl_c(scanner.control());

            let pb = progress_bar(total);
            let progress = pb.clone();
            scanner.set_result_callback(Box::new(move |result: &ProbeResult| {
                progress.inc(1);
                progress.set_message(format!("{} [{}]", result.url, result.status));
            }));

            scanner.run().await;
            pb.finish_and_clear();

            let filtered = scanner.filtered_results();
            let reporter = ConsoleReporter::new();
            reporter.print_results(&filtered);
            reporter.print_metrics(&scanner.metrics());

            let snapshot = update_tree(&tree_dir, &url, filtered.clone()).await?;
            reporter.print_snapshot(&snapshot);

            if let Some(path) = output {
                JsonExporter::export(scanner.results(), scanner.metrics(), &path)?;
            }
            if let Some(path) = txt {
                TextExporter::export(&filtered, &path)?;
            }
        }

        Commands::Report { input } => {
            let results = JsonExporter::load(&input)?;
            let reporter = ConsoleReporter::new();
            reporter.print_results(&results);
            reporter.print_metrics(&ScanMetrics::new(0.0, results.len(), results.len()));
        }
    }

    Ok(())
}

/// Feeds the filtered results into the site tree and persists both snapshot
/// documents under `tree_dir`.
async fn update_tree(
    tree_dir: &str,
    target_url: &str,
    filtered: Vec<ProbeResult>,
) -> Result<webrecon::tree::TreeSnapshot> {
    std::fs::create_dir_all(tree_dir)
        .with_context(|| format!("Failed to create {}", tree_dir))?;
    let service = TreeService::new(Some(SnapshotStore::in_dir(tree_dir)));

    let ip = resolve_ip(target_url).await;
    let observations: Vec<Observation> = filtered
        .iter()
        .map(|r| Observation::from_probe(r, ip.as_deref()))
        .collect();

    let (snapshot, report) = service.update(&observations).await?;
    if !report.skipped.is_empty() {
        eprintln!("skipped {} malformed observation(s)", report.skipped.len());
    }
    Ok(snapshot)
}

async fn resolve_ip(target_url: &str) -> Option<String> {
    let host = url::Url::parse(target_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))?;
    let mut addrs = tokio::net::lookup_host(format!("{}:80", host)).await.ok()?;
    addrs.next().map(|addr| addr.ip().to_string())
}

fn stop_on_ctrl_c(control: ScanControl) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            control.stop();
        }
    });
}

fn default_headers(user_agent: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), user_agent.to_string());
    headers
}

fn load_wordlist(path: &str) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read wordlist {}", path))?;
    Ok(content.lines().map(|line| line.trim().to_string()).collect())
}

fn parse_status_list(input: Option<&str>) -> Result<Vec<u16>> {
    let Some(input) = input else {
        return Ok(Vec::new());
    };
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .with_context(|| format!("Invalid status code '{}'", s))
        })
        .collect()
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {pos} pages {msg}")
            .expect("Invalid progress bar template"),
    );
    pb
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb
}
