use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "webrecon")]
#[command(version, about = "Web application discovery and site-mapping toolkit")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl a target, following same-host links depth-first
    Crawl {
        #[arg(short, long)]
        url: String,

        #[arg(short, long, default_value = "3")]
        depth: usize,

        /// Maximum number of pages to visit
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Delay between requests, in milliseconds
        #[arg(long, default_value = "0")]
        delay: u64,

        /// Comma-separated exclusion patterns (regex)
        #[arg(short, long)]
        exclude: Option<String>,

        #[arg(long)]
        proxy: Option<String>,

        #[arg(long, default_value = "webrecon/1.0")]
        user_agent: String,

        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Directory for the visible/hidden tree snapshots
        #[arg(long, default_value = ".")]
        tree_dir: String,

        /// Write raw results as JSON
        #[arg(short, long)]
        output: Option<String>,

        /// Write the site map as a standalone HTML report
        #[arg(long)]
        html: Option<String>,
    },

    /// Enumerate paths from a wordlist against a target
    Brute {
        #[arg(short, long)]
        url: String,

        #[arg(short, long)]
        wordlist: String,

        /// Path prefix prepended to every candidate
        #[arg(short, long)]
        prefix: Option<String>,

        /// Comma-separated status allow-list
        #[arg(long)]
        allow: Option<String>,

        /// Comma-separated status deny-list
        #[arg(long)]
        deny: Option<String>,

        /// Drop responses whose body length is at or below this
        #[arg(long)]
        min_length: Option<usize>,

        /// Delay between requests, in milliseconds
        #[arg(long, default_value = "0")]
        delay: u64,

        #[arg(long)]
        proxy: Option<String>,

        #[arg(short, long, default_value = "10")]
        timeout: u64,

        #[arg(long, default_value = ".")]
        tree_dir: String,

        #[arg(short, long)]
        output: Option<String>,

        /// Write the filtered results as plain text
        #[arg(long)]
        txt: Option<String>,
    },

    /// Re-display a previously exported result set
    Report {
        #[arg(short, long)]
        input: String,
    },
}
