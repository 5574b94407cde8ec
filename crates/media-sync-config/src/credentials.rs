use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use toml;

const RADARR_API_KEY: &str = "radarr_api_key";
const JELLYFIN_API_KEY: &str = "jellyfin_api_key";
const PROXY_URL: &str = "proxy_url";
const PROXY_USER: &str = "proxy_user";
const PROXY_PASS: &str = "proxy_pass";

/// Environment variables that take precedence over the stored values
pub const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("RADARR_API_KEY", RADARR_API_KEY),
    ("JELLYFIN_API_KEY", JELLYFIN_API_KEY),
    ("PROXY_URL", PROXY_URL),
    ("PROXY_USER", PROXY_USER),
    ("PROXY_PASS", PROXY_PASS),
];

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Overlay values from the environment (e.g. a `.env` file loaded at startup).
    /// Overrides are in-memory only and never written back by `save`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;
        for (env_var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(env_var).filter(|v| !v.is_empty()) {
                self.credentials.insert(key.to_string(), value);
                applied += 1;
            }
        }
        applied
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_radarr_api_key(&self) -> Option<&String> {
        self.get(RADARR_API_KEY)
    }

    pub fn set_radarr_api_key(&mut self, key: String) {
        self.set(RADARR_API_KEY.to_string(), key);
    }

    pub fn get_jellyfin_api_key(&self) -> Option<&String> {
        self.get(JELLYFIN_API_KEY)
    }

    pub fn set_jellyfin_api_key(&mut self, key: String) {
        self.set(JELLYFIN_API_KEY.to_string(), key);
    }

    /// Proxy address from the environment, used when the config file has none
    pub fn get_proxy_url(&self) -> Option<&String> {
        self.get(PROXY_URL)
    }

    pub fn get_proxy_user(&self) -> Option<&String> {
        self.get(PROXY_USER)
    }

    pub fn get_proxy_pass(&self) -> Option<&String> {
        self.get(PROXY_PASS)
    }

    pub fn set_proxy_auth(&mut self, user: String, pass: String) {
        self.set(PROXY_USER.to_string(), user);
        self.set(PROXY_PASS.to_string(), pass);
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.credentials.keys().cloned().collect()
    }
}
