use catalog_core::config::{AppConfig, LoadOptions};

use super::CommandResult;

const EXIT_CONFIG_INVALID: u8 = 2;

pub fn run() -> CommandResult {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => CommandResult::success(
            "start",
            format!(
                "preflight passed: listening on {} with images stored in bucket `{}` at {}",
                config.server.listen_address(),
                config.storage.bucket,
                config.storage.base_url()
            ),
        ),
        Err(error) => CommandResult::failure(
            "start",
            "config_validation",
            error.to_string(),
            EXIT_CONFIG_INVALID,
        ),
    }
}
