//! Configuration management for typemend
//!
//! Stores settings in ~/.config/typemend/config.json. Provider keys come
//! from the environment first, then the system keychain, then a legacy
//! plaintext config field.

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const KEYRING_SERVICE: &str = "typemend";
const OPENROUTER_KEY_USER: &str = "openrouter_api_key";
const GEMINI_KEY_USER: &str = "gemini_api_key";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Legacy plaintext keys; the keychain is preferred
    pub openrouter_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Checker argv, run from the project root
    pub checker_command: Vec<String>,
    /// Hard deadline for one checker run
    pub checker_timeout_secs: u64,
    /// Hard deadline for one provider HTTP call
    pub request_timeout_secs: u64,
    /// Upper bound on files attempted per pass
    pub max_files_per_pass: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            gemini_api_key: None,
            checker_command: ["npx", "tsc", "--noEmit", "--pretty", "false"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            checker_timeout_secs: 120,
            request_timeout_secs: 90,
            max_files_per_pass: 10,
        }
    }
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("typemend"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return defaults.
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        preserve_corrupt_config(&path, &content);
                        eprintln!(
                            "  Warning: config file was corrupted ({}). A backup was saved and defaults were loaded.",
                            err
                        );
                    }
                }
            }
        }
        Self::default()
    }

    /// OpenRouter key: environment, then keychain, then legacy config field.
    pub fn openrouter_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }
        if let Some(key) = read_keyring_key(OPENROUTER_KEY_USER) {
            return Some(key);
        }
        self.openrouter_api_key.clone()
    }

    /// Gemini key: environment, then keychain, then legacy config field.
    pub fn gemini_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }
        if let Some(key) = read_keyring_key(GEMINI_KEY_USER) {
            return Some(key);
        }
        self.gemini_api_key.clone()
    }

    /// Config file location for display.
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/typemend/config.json".to_string())
    }
}

fn read_keyring_key(user: &str) -> Option<String> {
    match Entry::new(KEYRING_SERVICE, user).and_then(|entry| entry.get_password()) {
        Ok(key) => Some(key),
        Err(keyring::Error::NoEntry) => None,
        Err(err) => {
            eprintln!(
                "  Warning: failed to read {} from system keychain: {}",
                user, err
            );
            None
        }
    }
}

fn preserve_corrupt_config(path: &std::path::Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
