use std::fs;

use serde::Deserialize;
use serde_json::{json, Value};

/// Runtime configuration loaded from config.json. Every field has a default
/// so a missing or partial file still yields a usable setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service_name: String,
    pub discovery_tries: u32,
    pub discovery_delay_ms: u64,
    pub debug: bool,
    pub writes: Vec<WriteStep>,
}

/// A single parameter write: target path, raw value, pause afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteStep {
    pub path: String,
    pub value: Value,
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

fn default_pause_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        let step = |path: &str, value: Value| WriteStep {
            path: path.to_string(),
            value,
            pause_ms: default_pause_ms(),
        };
        Config {
            service_name: "VRChat".to_string(),
            discovery_tries: 5,
            discovery_delay_ms: 1000,
            debug: false,
            writes: vec![
                step("/avatar/parameters/VRCEmote", json!(20)),
                step("/avatar/parameters/VRCEmote", json!(0)),
                step("/avatar/parameters/MuteSelf", json!(1)),
                step("/avatar/parameters/MuteSelf", json!(0)),
            ],
        }
    }
}

/// Read the config from `path`, falling back to the defaults when the file
/// is absent or does not parse.
pub fn load(path: &str) -> Config {
    let mut config = match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Invalid {} ({}), using built-in defaults", path, err);
                Config::default()
            }
        },
        Err(_) => {
            println!("No {} found, using built-in defaults", path);
            Config::default()
        }
    };
    // At least one discovery attempt regardless of what the file says
    config.discovery_tries = config.discovery_tries.max(1);
    config
}
