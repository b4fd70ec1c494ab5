use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

const DEFAULT_PROMPT: &str = "> ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub env_name: String,
    /// Print the disassembly of every chunk that compiles.
    #[serde(default)]
    pub print_code: bool,
    /// Print the stack and each instruction as the VM runs.
    #[serde(default)]
    pub trace_execution: bool,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            env_name: env_name(),
            print_code: false,
            trace_execution: false,
            prompt: default_prompt(),
        }
    }
}

impl Config {
    /// Reads the config file for the current environment, falling back to
    /// defaults, then applies `LOX_PRINT_CODE` / `LOX_TRACE` overrides.
    pub fn load() -> Self {
        let config_path = Self::get_config_path();
        let mut config = match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str::<Config>(&contents) {
                Ok(config) => {
                    tracing::debug!(path = %config_path.display(), "loaded config");
                    config
                }
                Err(err) => {
                    tracing::warn!(path = %config_path.display(), %err, "ignoring malformed config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        config
    }

    pub fn save(&self) -> io::Result<()> {
        let config_path = Self::get_config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)
    }

    pub fn get_config_path() -> PathBuf {
        let home = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        PathBuf::from(env::var(home).unwrap_or_else(|_| String::from(".")))
            .join(".lox")
            .join(env_name())
            .join("config.json")
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("LOX_PRINT_CODE") {
            self.print_code = is_truthy(&value);
        }
        if let Some(value) = lookup("LOX_TRACE") {
            self.trace_execution = is_truthy(&value);
        }
    }
}

fn env_name() -> String {
    env::var("LOX_ENV").unwrap_or_else(|_| String::from("default"))
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
