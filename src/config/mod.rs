use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Default system prompt handed to every new chat session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres un asistente útil.";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub system_prompt: String,
    pub static_dir: String,
    pub index_file: String,
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
    /// Largest inbound websocket frame, and largest reassembled text message, in bytes.
    pub max_frame_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub completion: CompletionConfig,
    pub chat: ChatConfig,
    pub cors: CorsConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = defaults("development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(app_environment());

        // Plain `PORT` and `API_KEY` win over everything else
        with_legacy_overrides(builder, env::var("PORT").ok(), env::var("API_KEY").ok())?
            .build()?
            .try_deserialize()
    }

    /// Defaults plus `APP_*` variables only; no config files, no legacy variables.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        defaults("test")?
            .add_source(app_environment())
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("environment", environment)?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("completion.base_url", "https://api.deepseek.com")?
        .set_default("completion.api_key", "")?
        .set_default("completion.model", "deepseek-chat")?
        .set_default("completion.timeout_secs", 120)?
        .set_default("chat.system_prompt", DEFAULT_SYSTEM_PROMPT)?
        .set_default("chat.static_dir", "static")?
        .set_default("chat.index_file", "static/index.html")?
        .set_default("chat.heartbeat_interval_secs", 30)?
        .set_default("chat.client_timeout_secs", 90)?
        .set_default("chat.max_frame_size", 16 * 1024 * 1024)?
        .set_default("cors.enabled", false)?
        .set_default("cors.allow_any_origin", false)?
        .set_default("cors.max_age", 3600)
}

fn app_environment() -> Environment {
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn with_legacy_overrides(
    builder: ConfigBuilder<DefaultState>,
    port: Option<String>,
    api_key: Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_override_option("server.port", port)?
        .set_override_option("completion.api_key", api_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn environment_from(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        app_environment().source(Some(map))
    }

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = defaults("test")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .expect("Failed to load settings");
        assert_eq!(settings.environment, "test");
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.workers as usize, num_cpus::get());
        assert_eq!(settings.completion.base_url, "https://api.deepseek.com");
        assert_eq!(settings.completion.model, "deepseek-chat");
        assert_eq!(settings.completion.api_key, "");
        assert_eq!(settings.completion.timeout_secs, 120);
        assert_eq!(settings.chat.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(settings.chat.index_file, "static/index.html");
        assert_eq!(settings.chat.max_frame_size, 16 * 1024 * 1024);
        assert!(!settings.cors.enabled);
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_environment_override() {
        let settings: Settings = defaults("test")
            .unwrap()
            .add_source(environment_from(&[
                ("APP_SERVER__PORT", "9000"),
                ("APP_COMPLETION__MODEL", "deepseek-reasoner"),
                ("APP_CHAT__SYSTEM_PROMPT", "You are helpful."),
                ("APP_CORS__ENABLED", "true"),
                ("APP_CHAT__MAX_FRAME_SIZE", "1048576"),
            ]))
            .build()
            .expect("Failed to build config")
            .try_deserialize()
            .expect("Failed to deserialize settings");

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.completion.model, "deepseek-reasoner");
        assert_eq!(settings.chat.system_prompt, "You are helpful.");
        assert!(settings.cors.enabled);
        assert_eq!(settings.chat.max_frame_size, 1_048_576);
    }

    #[test]
    fn test_legacy_variables_take_precedence() {
        let builder = defaults("test")
            .unwrap()
            .add_source(environment_from(&[
                ("APP_SERVER__PORT", "9000"),
                ("APP_COMPLETION__API_KEY", "from-app-env"),
            ]));

        let settings: Settings = with_legacy_overrides(
            builder,
            Some("7070".to_string()),
            Some("sk-legacy".to_string()),
        )
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

        assert_eq!(settings.server.port, 7070);
        assert_eq!(settings.completion.api_key, "sk-legacy");
    }

    #[test]
    fn test_missing_legacy_variables_keep_defaults() {
        let settings: Settings = with_legacy_overrides(defaults("test").unwrap(), None, None)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.completion.api_key, "");
    }

    #[test]
    fn test_invalid_port() {
        let result = with_legacy_overrides(defaults("test").unwrap(), Some("invalid".to_string()), None)
            .unwrap()
            .build()
            .and_then(|config| config.try_deserialize::<Settings>());

        assert!(result.is_err(), "Expected error for invalid port");
    }
}
