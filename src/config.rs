//! Service configuration.
//!
//! Loaded from a JSON file when one exists, then overridden by environment
//! variables.

use std::str::FromStr;

use derive_more::Display;
use log::warn;
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumString};

use crate::notify::inbox::DEFAULT_INBOX_CAPACITY;

pub const CONFIG_PATH_VAR: &str = "SUPPORT_DESK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "support-desk.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, StrumDisplay, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    DynamoDb
}

#[derive(Debug, Display)]
pub enum ConfigError {
    #[display(fmt = "cannot read config file: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "cannot parse config file: {}", _0)]
    Parse(serde_json::Error),
    #[display(fmt = "invalid value for {}: {}", _0, _1)]
    Invalid(&'static str, String)
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub bind_address: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    /// DynamoDB table, hash key `ticket_id` (string).
    pub ticket_table: String,
    /// User ids whose replies go to the ticket owner instead of the admin channel.
    pub admin_user_ids: Vec<String>,
    pub notification_webhook_url: Option<String>,
    /// Notifications kept in memory for `GET /api/notifications`.
    pub inbox_capacity: usize
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_address: String::from("127.0.0.1"),
            port: 8080,
            store_backend: StoreBackend::Memory,
            ticket_table: String::from("ticket"),
            admin_user_ids: vec![String::from("admin")],
            notification_webhook_url: None,
            inbox_capacity: DEFAULT_INBOX_CAPACITY
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    pub fn from_env() -> Result<Settings, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| String::from(DEFAULT_CONFIG_PATH));
        let mut settings = match Settings::load(&path) {
            Ok(settings) => settings,
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("config file {} not found, using defaults", path);
                Settings::default()
            }
            Err(err) => return Err(err)
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>
    {
        if let Some(address) = lookup("BIND_ADDRESS") {
            self.bind_address = address;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::Invalid("PORT", port))?;
        }
        if let Some(backend) = lookup("STORE_BACKEND") {
            self.store_backend = StoreBackend::from_str(&backend.to_lowercase())
                .map_err(|_| ConfigError::Invalid("STORE_BACKEND", backend))?;
        }
        if let Some(table) = lookup("TICKET_TABLE") {
            self.ticket_table = table;
        }
        if let Some(ids) = lookup("ADMIN_USER_IDS") {
            self.admin_user_ids = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(capacity) = lookup("INBOX_CAPACITY") {
            self.inbox_capacity = capacity.parse().map_err(|_| ConfigError::Invalid("INBOX_CAPACITY", capacity))?;
        }
        if let Some(url) = lookup("NOTIFICATION_WEBHOOK_URL") {
            self.notification_webhook_url = if url.trim().is_empty() { None } else { Some(url) };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_use_memory_store_on_localhost() {
        let settings = Settings::default();
        assert_eq!(settings.store_backend, StoreBackend::Memory);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.ticket_table, "ticket");
        assert_eq!(settings.inbox_capacity, DEFAULT_INBOX_CAPACITY);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[
                ("PORT", "9090"),
                ("STORE_BACKEND", "DynamoDB"),
                ("ADMIN_USER_IDS", "admin-1, admin-2,,"),
                ("NOTIFICATION_WEBHOOK_URL", "https://hooks.example/notify"),
                ("INBOX_CAPACITY", "250")
            ]))
            .unwrap();

        assert_eq!(settings.port, 9090);
        assert_eq!(settings.store_backend, StoreBackend::DynamoDb);
        assert_eq!(settings.admin_user_ids, vec![String::from("admin-1"), String::from("admin-2")]);
        assert_eq!(settings.notification_webhook_url.as_deref(), Some("https://hooks.example/notify"));
        assert_eq!(settings.inbox_capacity, 250);
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut settings = Settings::default();
        let err = settings.apply_overrides(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: eighty");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"storeBackend": "dynamodb", "port": 3000}"#).unwrap();
        assert_eq!(settings.store_backend, StoreBackend::DynamoDb);
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.bind_address, "127.0.0.1");
    }
}
