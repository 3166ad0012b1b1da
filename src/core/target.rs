use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One deployment under verification: SSH reachability plus the handful of
/// fixed inputs the pipeline needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    pub host: String,
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub identity_file: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default = "default_fallback_project_id")]
    pub fallback_project_id: String,
    #[serde(default)]
    pub error_log_path: Option<String>,
    #[serde(default = "default_payload_path")]
    pub payload_path: String,
}

fn default_port() -> u16 {
    22
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_keyword() -> String {
    // The reference keyword the service has been exercised with since the
    // first deploy; CJK on purpose, it keeps char counting honest.
    "膝蓋痛原因".to_string()
}

fn default_fallback_project_id() -> String {
    "22e7d6b9-adab-48d5-97fb-e56205143e33".to_string()
}

fn default_payload_path() -> String {
    "/tmp/flightcheck_payload.json".to_string()
}

impl TargetConfig {
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push("host".to_string());
        }
        if self.user.is_empty() {
            missing.push("user".to_string());
        }
        missing
    }
}

pub fn load(path: &str) -> Result<TargetConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", path))))?;

    let target: TargetConfig = serde_json::from_str(&raw)
        .map_err(|e| Error::config_invalid_json(path, e))?;

    let missing = target.missing_fields();
    if !missing.is_empty() {
        return Err(Error::ssh_target_invalid(path, missing)
            .with_hint("A target file needs at least {\"host\": ..., \"user\": ...}"));
    }

    Ok(target)
}
