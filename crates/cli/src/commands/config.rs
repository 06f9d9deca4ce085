use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use catalog_core::config::{AppConfig, LoadOptions, UserConfig};
use toml::Value;

use crate::commands::{load_config, CommandResult};

/// Renders every effective setting with the layer that supplied it. User
/// passwords are never printed.
pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let flags = if options.overrides.database_url.is_some() {
        vec![("database.url", "--database-url")]
    } else {
        Vec::new()
    };
    let sources =
        Sources { doc: config_file_doc.as_ref(), path: config_file_path.as_deref(), flags: &flags };

    CommandResult::success("config", render(&config, &sources))
}

struct Sources<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
    /// Keys set by a command-line flag, with the flag name.
    flags: &'a [(&'a str, &'a str)],
}

impl Sources<'_> {
    fn line(&self, key: &str, value: &str, env_keys: &[&str]) -> String {
        format!("- {key} = {value} (source: {})", self.source(key, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some((_, flag)) = self.flags.iter().find(|(key, _)| *key == key_path) {
            return format!("flag ({flag})");
        }

        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn render(config: &AppConfig, sources: &Sources<'_>) -> String {
    let mut lines = vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(sources.line("database.url", &config.database.url, &["CATALOG_DATABASE_URL"]));
    lines.push(sources.line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        &["CATALOG_DATABASE_MAX_CONNECTIONS"],
    ));
    lines.push(sources.line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        &["CATALOG_DATABASE_TIMEOUT_SECS"],
    ));
    lines.push(sources.line(
        "server.bind_address",
        &config.server.bind_address,
        &["CATALOG_SERVER_BIND_ADDRESS"],
    ));
    lines.push(sources.line(
        "server.port",
        &config.server.port.to_string(),
        &["CATALOG_SERVER_PORT"],
    ));
    lines.push(sources.line(
        "auth.enabled",
        &config.auth.enabled.to_string(),
        &["CATALOG_AUTH_ENABLED"],
    ));
    lines.push(sources.line(
        "auth.session_ttl_secs",
        &config.auth.session_ttl_secs.to_string(),
        &["CATALOG_AUTH_SESSION_TTL_SECS"],
    ));
    lines.push(sources.line("auth.users", &render_users(&config.auth.users), &[]));
    lines.push(sources.line(
        "logging.level",
        &config.logging.level,
        &["CATALOG_LOGGING_LEVEL", "CATALOG_LOG_LEVEL"],
    ));
    lines.push(sources.line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        &["CATALOG_LOGGING_FORMAT", "CATALOG_LOG_FORMAT"],
    ));

    lines.join("\n")
}

fn render_users(users: &[UserConfig]) -> String {
    let rendered = users
        .iter()
        .map(|user| {
            let roles = user.roles.iter().map(|role| role.as_str()).collect::<Vec<_>>();
            format!("{}[{}] password=<redacted>", user.username, roles.join("|"))
        })
        .collect::<Vec<_>>();
    if rendered.is_empty() {
        "<none>".to_string()
    } else {
        rendered.join(", ")
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("catalog.toml"), PathBuf::from("config/catalog.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
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
