use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use nxdash::cli;
use nxdash::config;
use nxdash::device::stats::LedState;

#[derive(Debug, Parser)]
#[command(name = "nxdash")]
#[command(about = "Status dashboard for an RTOS demo board's HTTP server")]
struct App {
    /// Device base URL (overrides config and NXDASH_DEVICE_URL)
    #[arg(long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll the device every 3 seconds and redraw the dashboard
    Watch {
        /// Stop after N poll rounds
        #[arg(long)]
        rounds: Option<u32>,
    },
    /// Run a single poll round and print the dashboard
    Status {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Switch the green LED
    Led {
        #[arg(value_enum)]
        state: LedArg,
    },
    /// Show network info, thread run counts and the packet pool
    Info {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Click the sidebar collapse button and show the resulting state
    Sidebar {
        /// Number of clicks
        #[arg(long, default_value = "1")]
        clicks: u32,
    },
    /// Summarize recorded samples: counter deltas and throughput
    History {
        /// Only include the last N minutes of samples
        #[arg(long)]
        minutes: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Number of recent samples to list
        #[arg(long, default_value = "10")]
        last: usize,
    },
    /// Serve a simulated device over HTTP
    Simulate {
        /// Address to bind (default from config: 127.0.0.1:8080)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Check config files, device reachability and the sample log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.nxdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `device.base_url http://10.0.0.5`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LedArg {
    On,
    Off,
}

impl From<LedArg> for LedState {
    fn from(arg: LedArg) -> Self {
        match arg {
            LedArg::On => LedState::On,
            LedArg::Off => LedState::Off,
        }
    }
}

fn main() -> Result<()> {
    let app = App::parse();

    let mut cfg = config::load();
    if let Some(device) = app.device {
        cfg.device.base_url = device;
    }
    nxdash::init_tracing(&cfg.logging.level);

    match app.command {
        Commands::Watch { rounds } => cli::run_watch(&cfg, rounds),
        Commands::Status { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_status(&cfg, fmt)
        }
        Commands::Led { state } => cli::run_led(&cfg, state.into()),
        Commands::Info { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_info(&cfg, fmt)
        }
        Commands::Sidebar { clicks } => cli::run_sidebar(&cfg, clicks),
        Commands::History {
            minutes,
            format,
            last,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&cfg, minutes, fmt, last)
        }
        Commands::Simulate { bind } => cli::run_simulate(&cfg, bind.as_deref()),
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
