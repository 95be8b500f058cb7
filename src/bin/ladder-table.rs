//! Print the expected voltage table for a configuration.
//!
//! Usage:
//!   cargo run --bin ladder-table -- config.json
//!
//! Useful when choosing resistors: every combination the bridge can tell
//! apart is listed with its voltage, and entries closer than twice the
//! acceptance distance are flagged. Nothing is sampled or published.

use adc_button_bridge::config::{self, Config};
use adc_button_bridge::ladder::ButtonPanel;
use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Print the expected voltage of every button combination")]
struct Args {
    /// Configuration file (JSON)
    #[arg(env = "ADC_BUTTONS_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let path = config::resolve_config_path(args.config);
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let panel = match ButtonPanel::initialize(&config) {
        Ok(panel) => panel,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let v_acc = config.ladder.v_acc;
    for channel in panel.channels() {
        println!("Channel {}", channel.id());
        let mut rows: Vec<_> = channel.table().entries().iter().enumerate().collect();
        rows.sort_by(|a, b| a.1.millivolts.total_cmp(&b.1.millivolts));

        let mut previous: Option<f64> = None;
        for (index, entry) in rows {
            let buttons = if entry.is_idle() {
                "(none)".to_string()
            } else {
                entry
                    .down
                    .iter()
                    .map(|b| channel.buttons()[*b].id.as_str())
                    .collect::<Vec<_>>()
                    .join(" + ")
            };
            let flag = match previous {
                Some(p) if entry.millivolts - p < 2.0 * v_acc => "  <-- overlaps previous",
                _ => "",
            };
            println!(
                "  {:>3}  {:>8.1} mV  {}{}",
                index, entry.millivolts, buttons, flag
            );
            previous = Some(entry.millivolts);
        }
        println!();
    }

    for skipped in panel.skipped() {
        println!("skipped: {}", skipped);
    }

    ExitCode::SUCCESS
}
