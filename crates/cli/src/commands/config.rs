use callwatch_core::config::{AppConfig, LoadOptions, LogFormat};
use serde_json::json;

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => render(&config),
        Err(error) => json!({
            "status": "error",
            "message": format!("configuration issue: {error}"),
        })
        .to_string(),
    }
}

fn render(config: &AppConfig) -> String {
    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };

    let payload = json!({
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "server": {
            "bind_address": config.server.bind_address,
            "port": config.server.port,
        },
        "logging": {
            "level": config.logging.level,
            "format": format,
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
        json!({
            "status": "error",
            "message": format!("config serialization failed: {error}"),
        })
        .to_string()
    })
}
