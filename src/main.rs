use std::path::PathBuf;

use hotwire::app::{run_console, HotWireApp};
use hotwire::config::{load_config_from_path, HotWireConfig};

// Usage:
//   hotwire [--config path/to/settings.{json,yaml}]
//
// RUST_LOG controls log verbosity (default: info).

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config_path = args.next().map(PathBuf::from),
            other => log::warn!("ignoring unknown argument {other:?}"),
        }
    }

    let config = match &config_path {
        Some(path) => match load_config_from_path(path) {
            Ok(cfg) => {
                log::info!("loaded settings from {}", path.display());
                cfg
            }
            Err(e) => {
                log::error!("{e}; falling back to defaults");
                HotWireConfig::default()
            }
        },
        None => HotWireConfig::default(),
    };

    run_console(HotWireApp::new(config).with_config_path(config_path))
}
