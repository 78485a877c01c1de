//! `weave [config.json] [image]`
//!
//! Arguments ending in `.json` are read as configuration; anything else is
//! pressed into the fabric as an impression.

use std::path::PathBuf;
use std::process::ExitCode;

use weave::{FabricConfig, RunError};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn start() -> Result<(), RunError> {
    let mut config_path: Option<PathBuf> = None;
    let mut image_path: Option<PathBuf> = None;

    for arg in std::env::args_os().skip(1).map(PathBuf::from) {
        let is_json = arg
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            config_path = Some(arg);
        } else {
            image_path = Some(arg);
        }
    }

    let config = match &config_path {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            FabricConfig::load(path)?
        }
        None => FabricConfig::default(),
    };

    match image_path {
        Some(image) => weave::run_with_image(config, image),
        None => weave::run(config),
    }
}
