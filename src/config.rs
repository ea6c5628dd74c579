use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// number of async worker threads, range [1, 32768), defaults to 16
    pub async_worker_thread_number: u16,
    /// capacity of the posted-trigger queue, defaults to 256
    pub trigger_queue_size: usize,
    /// environment variables exposed to handler code through the `host` binding
    pub env: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            async_worker_thread_number: 16,
            trigger_queue_size: 256,
            env: HashMap::new(),
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Self {
        let data = fs::read_to_string(path.as_ref()).expect(&format!("failed to load config file {:?}", path.as_ref()));

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Self {
        let config = toml::from_str::<Config>(toml_str).expect("failed to parse the toml str");
        config
    }
}

#[cfg(test)]
mod test {
    use crate::Config;

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        async_worker_thread_number = 10
        trigger_queue_size = 64

        [env]
        API_BASE = "http://localhost:8080"
        "#;
        let config = Config::load_from_str(toml_str);
        assert_eq!(config.async_worker_thread_number, 10);
        assert_eq!(config.trigger_queue_size, 64);
        assert_eq!(config.env.get("API_BASE").unwrap(), "http://localhost:8080");
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("");
        assert_eq!(config.async_worker_thread_number, 16);
        assert_eq!(config.trigger_queue_size, 256);
        assert!(config.env.is_empty());
    }
}
