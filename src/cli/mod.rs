//! CLI command implementations for nxdash.
//!
//! Provides subcommand handlers for:
//! - `nxdash watch` — live dashboard, refreshed every poll round
//! - `nxdash status` — a single poll round
//! - `nxdash led on|off` — drive the green LED
//! - `nxdash info` — network info, thread counters, packet pool
//! - `nxdash sidebar` — exercise the sidebar toggle on a fresh page
//! - `nxdash history` — aggregate the sample log
//! - `nxdash simulate` — serve a simulated device
//! - `nxdash health` — config, device reachability, sample log
//! - `nxdash config show|init|set|reset` — configuration management

use std::sync::Arc;
use std::sync::mpsc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger::{SampleLog, SampleLogEntry};
use crate::analytics::reporter::{self, HistorySummary};
use crate::config::{self, DashConfig};
use crate::device::http::{DeviceError, SharedClient, UreqClient};
use crate::device::stats::LedState;
use crate::device::{self, NX_DATA, TX_DATA};
use crate::schedule::ThreadScheduler;
use crate::ui::dashboard::{ClickOutcome, Dashboard, DashboardIds, DashboardView};
use crate::ui::led::{LedIds, LedToggle};
use crate::ui::poller::{POLL_INTERVAL, PollObserver, PollReport};
use crate::web;

/// Output format for report commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn client_from(cfg: &DashConfig) -> SharedClient {
    Arc::new(UreqClient::new(&cfg.device.base_url, cfg.device.timeout()))
}

/// Error lines for the failed halves of a poll round.
fn report_errors(report: &PollReport) -> Vec<String> {
    let mut errors = Vec::new();
    if let Err(e) = &report.tx {
        errors.push(format!("{TX_DATA}: {e}"));
    }
    if let Err(e) = &report.nx {
        errors.push(format!("{NX_DATA}: {e}"));
    }
    errors
}

// ---------------------------------------------------------------------------
// nxdash watch
// ---------------------------------------------------------------------------

/// Run the live dashboard until interrupted (or for `rounds` rounds).
pub fn run_watch(cfg: &DashConfig, rounds: Option<u32>) -> Result<()> {
    let log = SampleLog::from_config(cfg);
    let device_url = cfg.device.base_url.clone();
    let (round_tx, round_rx) = mpsc::channel::<Vec<String>>();

    let observer: PollObserver = Arc::new(move |report: &PollReport| {
        if let (Some(log), Some((tx, nx))) = (&log, report.sample()) {
            log.record(&device_url, tx, nx);
        }
        let _ = round_tx.send(report_errors(report));
    });

    let mut dash =
        Dashboard::new(client_from(cfg), DashboardIds::default()).with_observer(observer);
    dash.start(&ThreadScheduler);
    tracing::info!(device = %cfg.device.base_url, "polling started");

    let mut completed = 0u32;
    while let Ok(errors) = round_rx.recv() {
        completed += 1;
        // Clear screen and home the cursor before each frame.
        print!("\x1B[2J\x1B[H");
        print_frame(&cfg.device.base_url, &dash.view(), &errors, completed);

        if rounds.is_some_and(|limit| completed >= limit) {
            break;
        }
    }

    dash.stop();
    Ok(())
}

fn print_frame(device: &str, view: &DashboardView, errors: &[String], round: u32) {
    println!("{}", "Device Dashboard".bold().cyan());
    println!(
        "{}",
        format!(
            "{device} · round {round} · every {}s",
            POLL_INTERVAL.as_secs()
        )
        .dimmed()
    );
    println!("{}", "=".repeat(50));
    print_view(view);

    for error in errors {
        println!("  {} {}", "!".yellow().bold(), error.yellow());
    }
}

fn print_view(view: &DashboardView) {
    println!();
    println!("{}", "Scheduler".bold().cyan());
    for (_, text) in &view.stats[..4.min(view.stats.len())] {
        print_stat(text);
    }
    println!();
    println!("{}", "Network".bold().cyan());
    for (_, text) in view.stats.iter().skip(4) {
        print_stat(text);
    }
    println!();
    let led = if view.led_label.is_empty() {
        "—".dimmed()
    } else if view.led_checked {
        view.led_label.green().bold()
    } else {
        view.led_label.normal()
    };
    println!("  {} {}", "Green LED:".bold(), led);
}

fn print_stat(text: &str) {
    if text.is_empty() {
        println!("  {}", "(no data yet)".dimmed());
    } else {
        println!("  {text}");
    }
}

// ---------------------------------------------------------------------------
// nxdash status
// ---------------------------------------------------------------------------

/// Run one poll round and print the resulting page.
pub fn run_status(cfg: &DashConfig, format: OutputFormat) -> Result<()> {
    let dash = Dashboard::new(client_from(cfg), DashboardIds::default());
    let report = dash.load_data();

    if let (Err(tx), Err(_)) = (&report.tx, &report.nx) {
        anyhow::bail!("device at {} did not answer: {tx}", cfg.device.base_url);
    }

    if let (Some(log), Some((tx, nx))) = (SampleLog::from_config(cfg), report.sample()) {
        log.record(&cfg.device.base_url, tx, nx);
    }

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            let value = serde_json::json!({
                "device": cfg.device.base_url,
                "tx": report.tx.as_ref().ok(),
                "nx": report.nx.as_ref().ok(),
                "errors": report_errors(&report),
                "page": dash.view(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            print_frame(&cfg.device.base_url, &dash.view(), &report_errors(&report), 1);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// nxdash led
// ---------------------------------------------------------------------------

/// Send an LED command and confirm the device accepted it.
pub fn run_led(cfg: &DashConfig, state: LedState) -> Result<()> {
    let led = LedToggle::new(client_from(cfg), LedIds::default());
    led.send(state)
        .with_context(|| format!("failed to switch LED {state}"))?;
    let label = match state {
        LedState::On => state.label().green().bold(),
        LedState::Off => state.label().normal(),
    };
    println!("{} Green LED {}", "✓".green().bold(), label);
    Ok(())
}

// ---------------------------------------------------------------------------
// nxdash info
// ---------------------------------------------------------------------------

/// Query the auxiliary device endpoints.
pub fn run_info(cfg: &DashConfig, format: OutputFormat) -> Result<()> {
    let client = client_from(cfg);
    let net = device::fetch_net_info(client.as_ref());
    let threads = device::fetch_thread_counts(client.as_ref());
    let pool = device::fetch_packet_pool(client.as_ref());

    if let (Err(e), Err(_), Err(_)) = (&net, &threads, &pool) {
        anyhow::bail!("device at {} did not answer: {e}", cfg.device.base_url);
    }

    if matches!(format, OutputFormat::Json | OutputFormat::Csv) {
        let value = serde_json::json!({
            "device": cfg.device.base_url,
            "net": net.as_ref().ok(),
            "threads": threads.as_ref().ok().map(|t| &t.0),
            "packet_pool": pool.as_ref().ok(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Device Info".bold().cyan());
    println!("{}", "=".repeat(40));

    println!("{}", "Network".bold());
    match &net {
        Ok(net) => println!("  {:<20} {}:{}", "Address", net.address, net.port),
        Err(e) => print_info_error(e),
    }

    println!("{}", "Threads".bold());
    match &threads {
        Ok(threads) => {
            for t in &threads.0 {
                println!("  {:<20} {:>10} runs", t.name, format_number(t.run_count));
            }
        }
        Err(e) => print_info_error(e),
    }

    println!("{}", "Packet pool".bold());
    match &pool {
        Ok(pool) => {
            println!("  {:<20} {}", "Available", pool.available);
            println!("  {:<20} {}", "Head packet length", pool.head_length);
        }
        Err(e) => print_info_error(e),
    }
    Ok(())
}

fn print_info_error(e: &DeviceError) {
    println!("  {} {}", "✗".red().bold(), e.to_string().dimmed());
}

// ---------------------------------------------------------------------------
// nxdash sidebar
// ---------------------------------------------------------------------------

/// Click the sidebar trigger `clicks` times on a fresh page and show the
/// resulting class state after each click.
pub fn run_sidebar(cfg: &DashConfig, clicks: u32) -> Result<()> {
    let ids = DashboardIds::default();
    let trigger = ids.sidebar.trigger.clone();
    let dash = Dashboard::new(client_from(cfg), ids);

    for n in 1..=clicks {
        if let ClickOutcome::Sidebar(active) = dash.click(&trigger) {
            let state = if active {
                "active".green()
            } else {
                "collapsed".normal()
            };
            println!("  click {n:>3}: sidebar {state}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// nxdash history
// ---------------------------------------------------------------------------

/// Summarize the sample log.
pub fn run_history(
    cfg: &DashConfig,
    minutes: Option<u32>,
    format: OutputFormat,
    last: usize,
) -> Result<()> {
    let log = SampleLog::from_config(cfg)
        .context("sample logging is disabled (set logging.enabled = true)")?;
    let entries = log.read_since_minutes(minutes);

    if entries.is_empty() {
        println!(
            "{}",
            "No samples yet. Run `nxdash watch` or `nxdash status` to record some.".yellow()
        );
        return Ok(());
    }

    let summary = reporter::summarize(&entries);
    let tail = reporter::recent(&entries, last);

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "summary": summary, "recent": tail });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_history_csv(tail),
        OutputFormat::Table => print_history_table(&summary, tail),
    }
    Ok(())
}

fn print_history_table(summary: &HistorySummary, tail: &[SampleLogEntry]) {
    println!("{}", "Sample History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!("  {} {}", "Samples:       ".bold(), summary.samples);
    println!("  {} {:.0}s", "Span:          ".bold(), summary.span_secs);
    println!(
        "  {} {} sent, {} received",
        "Bytes:         ".bold(),
        format_number(summary.bytes_sent),
        format_number(summary.bytes_received)
    );
    println!(
        "  {} {:.1} B/s out, {:.1} B/s in",
        "Throughput:    ".bold(),
        summary.send_rate,
        summary.receive_rate
    );
    println!(
        "  {} {} opened, {} closed",
        "Connections:   ".bold(),
        summary.connections,
        summary.disconnections
    );
    println!(
        "  {} {} resumptions, {} suspensions",
        "Scheduler:     ".bold(),
        format_number(summary.resumptions),
        format_number(summary.suspensions)
    );
    println!();

    println!("{}", "Recent Samples".bold().cyan());
    println!(
        "  {:<20} {:>12} {:>12} {:>12} {:>6}",
        "Time", "Resumptions", "Sent", "Received", "Conns"
    );
    println!("  {}", "-".repeat(66));
    for (i, e) in tail.iter().enumerate() {
        let line = format!(
            "  {:<20} {:>12} {:>12} {:>12} {:>6}",
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_number(e.tx.resumptions),
            format_number(e.nx.bytes_sent),
            format_number(e.nx.bytes_received),
            e.nx.connections,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_history_csv(tail: &[SampleLogEntry]) {
    println!(
        "timestamp,device,resumptions,suspensions,idle_returns,non_idle_returns,bytes_sent,bytes_received,connections,disconnections"
    );
    for e in tail {
        println!("{}", csv_row(e));
    }
}

fn csv_row(e: &SampleLogEntry) -> String {
    format!(
        "{},{},{},{}",
        e.timestamp.to_rfc3339(),
        csv_field(&e.device),
        e.tx,
        e.nx
    )
}

/// Quote a free-text CSV field when it would otherwise split the row.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// nxdash simulate
// ---------------------------------------------------------------------------

pub fn run_simulate(cfg: &DashConfig, bind: Option<&str>) -> Result<()> {
    web::serve(bind.unwrap_or(&cfg.simulator.bind))
}

// ---------------------------------------------------------------------------
// nxdash health
// ---------------------------------------------------------------------------

/// Check config files, device reachability, and the sample log.
pub fn run_health(cfg: &DashConfig) -> Result<()> {
    println!("{}", "nxdash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.nxdash/config.toml found"
        } else {
            "not found (run `nxdash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".nxdash.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = client_from(cfg);
    let reachable = device::fetch_tx(client.as_ref());
    let detail = match &reachable {
        Ok(_) => format!("answering at {}", cfg.device.base_url),
        Err(e) => format!("{} ({e})", cfg.device.base_url),
    };
    print_health_item("Device", reachable.is_ok(), &detail);

    match SampleLog::from_config(cfg) {
        Some(log) => {
            let count = log.read_all().len();
            print_health_item(
                "Sample log",
                true,
                &format!("{} ({count} samples)", log.path().display()),
            );
        }
        None => print_health_item("Sample log", false, "disabled"),
    }

    println!();
    if reachable.is_ok() {
        println!("{}", "All checks passed.".green().bold());
    } else {
        println!(
            "{}",
            "Device not reachable. Check device.base_url or run `nxdash simulate`.".yellow()
        );
    }
    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// nxdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective nxdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.nxdash/config.toml", global_exists);
    print_source(".nxdash.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "NXDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.nxdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Set device.base_url to your board's address.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a counter with thousands separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
