use crate::browser::{BrowserLauncher, Engine};
use crate::capture::capture_screenshots;
use crate::chromium::launcher_for;
use crate::config::{CaptureOptions, Config};
use crate::devices::{default_device_labels, supported_device_labels};
use crate::link_check::{check_links, LinkCheckOptions, LinkCheckReport};
use crate::progress::{CaptureProgress, ProgressUpdater};
use crate::utils::format_duration;
use crate::CaptureError;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "plunder")]
#[command(about = "Capture screenshots of web pages at every CSS breakpoint and device")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Maximum pages open at once")]
    pub page_limit: Option<usize>,

    #[arg(long, global = true, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, global = true, help = "Serve Prometheus metrics on this address")]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture screenshots of one or more pages
    Capture {
        #[arg(required = true, help = "Page URLs to capture")]
        urls: Vec<String>,

        #[arg(short, long, help = "Directory screenshots are written to")]
        out_dir: PathBuf,

        #[arg(long, help = "Capture the width breakpoints found in the page CSS")]
        breakpoints: bool,

        #[arg(short, long = "device", help = "Capture devices whose label contains this text")]
        devices: Vec<String>,

        #[arg(long, help = "Capture the modern default devices")]
        modern_devices: bool,

        #[arg(long, default_value = "chromium", help = "Browser engine (chromium, firefox, webkit)")]
        browser: Engine,

        #[arg(long, help = "Show the browser window")]
        headed: bool,

        #[arg(short, long, help = "Follow same-origin links")]
        recursive: bool,
    },

    /// List the supported device labels
    Devices {
        #[arg(long, help = "Only list the modern default devices")]
        defaults: bool,
    },

    /// Request every link on the given pages and report the broken ones
    CheckLinks {
        #[arg(required = true, help = "Page URLs to check")]
        urls: Vec<String>,

        #[arg(short, long, help = "Write the JSON report to this file")]
        output_file: Option<PathBuf>,
    },
}

pub struct CliRunner {
    pub config: Config,
}

impl CliRunner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn launcher(&self) -> anyhow::Result<Arc<dyn BrowserLauncher>> {
        Ok(launcher_for(Engine::Chromium, &self.config)?)
    }

    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Capture {
                urls,
                out_dir,
                breakpoints,
                devices,
                modern_devices,
                browser,
                headed,
                recursive,
            } => {
                let mut options = CaptureOptions::new(urls, out_dir);
                options.breakpoints = breakpoints;
                options.device_queries = (!devices.is_empty()).then_some(devices);
                options.modern_devices = modern_devices;
                options.browser = browser;
                options.headless = !headed;
                options.recursive = recursive;
                self.run_capture(options).await
            }
            Commands::Devices { defaults } => {
                self.list_devices(defaults);
                Ok(())
            }
            Commands::CheckLinks { urls, output_file } => {
                self.run_check_links(LinkCheckOptions { urls, output_file }).await
            }
        }
    }

    pub async fn run_capture(&self, options: CaptureOptions) -> anyhow::Result<()> {
        info!("Capturing {} into {}", options.urls.join(", "), options.out_dir.display());
        let started = Instant::now();
        let updater = ProgressUpdater::new(print_progress);

        let pages = capture_screenshots(&options, &self.config, self.launcher()?, &updater, None)
            .await
            .map_err(|e| anyhow::anyhow!(render_error(&e)))?;

        println!("Captured {} pages in {}:", pages.len(), format_duration(started.elapsed()));
        for page in pages {
            println!("  {} -> {}", page.url, options.out_dir.join(&page.dir).display());
        }
        Ok(())
    }

    pub fn list_devices(&self, defaults_only: bool) {
        if defaults_only {
            for label in default_device_labels() {
                println!("{label}");
            }
            return;
        }
        for device in supported_device_labels() {
            if device.default {
                println!("{} (default)", device.label);
            } else {
                println!("{}", device.label);
            }
        }
    }

    pub async fn run_check_links(&self, options: LinkCheckOptions) -> anyhow::Result<()> {
        let report = check_links(&options, &self.config, self.launcher()?)
            .await
            .map_err(|e| anyhow::anyhow!(render_error(&e)))?;
        print_link_report(&report);
        if !report.good {
            anyhow::bail!("Found broken links");
        }
        Ok(())
    }
}

/// One-line error with its kind, plus a usage hint for configuration errors.
pub fn render_error(err: &CaptureError) -> String {
    let mut rendered = format!("[{}] {}", err.kind(), err);
    if err.is_configuration() {
        rendered.push_str("\nRun `plunder --help` for usage, `plunder devices` for device labels");
    }
    rendered
}

fn print_progress(progress: CaptureProgress) {
    match progress {
        CaptureProgress::Starting => println!("Starting"),
        CaptureProgress::Parsing { pages } => {
            println!("Parsing: {}/{} pages", pages.completed, pages.total)
        }
        CaptureProgress::Capturing { pages, screenshots } => println!(
            "Capturing: {}/{} screenshots of {} pages",
            screenshots.completed, screenshots.total, pages.total
        ),
        CaptureProgress::Completed => println!("Completed"),
    }
}

fn print_link_report(report: &LinkCheckReport) {
    for page in &report.pages {
        if page.good {
            println!("{}: all {} links good", page.url, page.hrefs.len());
            continue;
        }
        let bad = page.bad_hrefs();
        println!("{}: {} of {} links broken", page.url, bad.len(), page.hrefs.len());
        for href in bad {
            let status = serde_json::to_string(&href.status).unwrap_or_default();
            println!("  {} {}", status, href.href);
        }
    }
}

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
