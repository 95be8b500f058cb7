use adc_button_bridge::bridge;
use adc_button_bridge::config::{self, Config};
use adc_button_bridge::error::Result;
use adc_button_bridge::input::SysfsSampler;
use adc_button_bridge::instance_lock::InstanceLock;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Publish resistor-ladder buttons on analog inputs to MQTT.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (JSON)
    #[arg(env = "ADC_BUTTONS_CONFIG")]
    config: Option<PathBuf>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() -> ExitCode {
    // Load .env file before the runtime exists
    config::load_dotenv();
    init_logger();

    let args = Args::parse();
    info!("Starting ADC Button Bridge");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let _lock = InstanceLock::acquire()?;

    let path = config::resolve_config_path(args.config);
    info!("Reading config from {}", path.display());
    let config = Config::load(&path)?;
    info!("Configuration loaded:");
    info!("  Topic prefix: {}", config.topic_prefix);
    info!("  Buttons: {}", config.buttons.len());
    info!(
        "  R0: {} ohm, V_nom: {} V, V_acc: {} mV",
        config.ladder.r0, config.ladder.v_nom, config.ladder.v_acc
    );

    // The cycle owns all button state, a single thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let sampler = SysfsSampler::new(&config.adc);
    runtime.block_on(bridge::run(&config, sampler))
}
