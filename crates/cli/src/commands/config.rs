use std::env;
use std::fs;
use std::path::Path;

use catalog_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key_path: "server.bind_address",
            env_keys: &["CATALOG_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key_path: "server.port",
            env_keys: &["CATALOG_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key_path: "server.graceful_shutdown_secs",
            env_keys: &["CATALOG_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key_path: "storage.url",
            env_keys: &["CATALOG_STORAGE_URL", "SUPABASE_URL"],
            value: config.storage.url.clone(),
        },
        Field {
            key_path: "storage.service_role_key",
            env_keys: &["CATALOG_STORAGE_SERVICE_ROLE_KEY", "SUPABASE_SERVICE_ROLE_KEY"],
            value: redact_secret(config.storage.service_role_key.expose_secret()),
        },
        Field {
            key_path: "storage.bucket",
            env_keys: &["CATALOG_STORAGE_BUCKET"],
            value: config.storage.bucket.clone(),
        },
        Field {
            key_path: "storage.timeout_secs",
            env_keys: &["CATALOG_STORAGE_TIMEOUT_SECS"],
            value: config.storage.timeout_secs.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["CATALOG_LOGGING_LEVEL", "CATALOG_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["CATALOG_LOGGING_FORMAT", "CATALOG_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.get(..4) {
        Some(prefix) if trimmed.len() > 12 => format!("{prefix}***"),
        _ => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_keep_only_a_short_prefix() {
        assert_eq!(redact_secret(""), "<empty>");
        assert_eq!(redact_secret("short"), "<redacted>");
        assert_eq!(redact_secret("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJh***");
    }

    #[test]
    fn nested_key_paths_are_detected() {
        let doc: Value = "[storage]\nbucket = \"images\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "storage.bucket"));
        assert!(!contains_path(&doc, "storage.url"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
