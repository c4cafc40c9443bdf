//! Pieces shared by the Radarr and Sonarr webhook producers

use adapter_registry::decode_params;
use contracts::{ContractError, Event, EventType, Metadata};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Instance settings for a *arr producer
///
/// `url` is the application's base URL; when set, item events link back
/// into its web UI. `api_key` is accepted for config compatibility and
/// never sent anywhere.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StarrConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "api-key")]
    pub api_key: Option<String>,
}

impl StarrConfig {
    pub fn from_params(type_name: &str, params: &Value) -> Result<Self, ContractError> {
        let mut config: Self = decode_params(type_name, params)?;
        if let Some(url) = &config.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ContractError::config_validation(
                    "url",
                    format!("expected an http(s) URL, got '{url}'"),
                ));
            }
            config.url = Some(url.trim_end_matches('/').to_string());
        }
        Ok(config)
    }

    /// `{url}/{path}` if a base URL is configured
    pub fn link(&self, path: &str) -> Option<String> {
        self.url.as_ref().map(|base| format!("{base}/{path}"))
    }
}

/// Fields every *arr payload may carry regardless of event type
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonFields {
    pub event_type: String,
    pub level: String,
    #[serde(rename = "type")]
    pub check_type: String,
    pub message: String,
    pub wiki_url: String,
    pub previous_version: String,
    pub new_version: String,
    pub is_upgrade: bool,
}

/// Release details attached to grab events
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Release {
    pub quality: String,
    pub release_group: String,
    pub release_title: String,
    pub indexer: String,
    pub size: u64,
}

/// Vendor identity stamped on every event
pub struct Vendor {
    pub label: &'static str,
    pub icon_url: &'static str,
}

impl Vendor {
    pub fn event(&self, event_type: EventType, vendor_type: &str, title: impl Into<String>) -> Event {
        Event::new(event_type, title).with_source(self.label, vendor_type, self.icon_url)
    }

    /// `HealthIssue`: "<Vendor> Health <level>: <check>"
    pub fn health(&self, event_type: EventType, common: &CommonFields) -> Event {
        let mut event = self
            .event(
                event_type,
                &common.event_type,
                format!("{} Health {}: {}", self.label, common.level, common.check_type),
            )
            .with_description(&common.message);
        if !common.wiki_url.is_empty() {
            event = event.with_link_url(&common.wiki_url);
        }
        event
    }

    /// Application update: message as title and body, versions as metadata
    pub fn application_update(&self, event_type: EventType, common: &CommonFields) -> Event {
        let mut metadata = Metadata::new();
        metadata.add("Previous Version", &common.previous_version);
        metadata.add("New Version", &common.new_version);

        self.event(event_type, &common.event_type, &common.message)
            .with_description(&common.message)
            .with_metadata(metadata)
    }
}

/// Add `name` only when `value` is non-empty
pub fn add_if_present(metadata: &mut Metadata, name: &str, value: &str, inline: bool) {
    if value.is_empty() {
        return;
    }
    if inline {
        metadata.add_inline(name, value);
    } else {
        metadata.add(name, value);
    }
}

pub fn add_release(metadata: &mut Metadata, release: &Release) {
    add_if_present(metadata, "Quality", &release.quality, false);
    add_if_present(metadata, "Release", &release.release_title, false);
    add_if_present(metadata, "Release Group", &release.release_group, false);
    add_if_present(metadata, "Indexer", &release.indexer, true);
    if release.size > 0 {
        metadata.add_inline("Size", format_size(release.size));
    }
}

/// Human readable byte count, binary units
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Decode a vendor payload, reporting failures against the source name
pub fn decode_payload<T: DeserializeOwned>(source_name: &str, body: &[u8]) -> Result<T, ContractError> {
    serde_json::from_slice(body).map_err(|e| ContractError::source_payload(source_name, e.to_string()))
}

/// Reject payloads without an `eventType`
pub fn require_event_type(source_name: &str, common: &CommonFields) -> Result<(), ContractError> {
    if common.event_type.is_empty() {
        return Err(ContractError::source_payload(source_name, "missing eventType"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_url_normalized() {
        let config = StarrConfig::from_params("radarr", &json!({"url": "http://radarr:7878/"})).unwrap();
        assert_eq!(config.link("movie/42").as_deref(), Some("http://radarr:7878/movie/42"));
    }

    #[test]
    fn test_config_accepts_legacy_api_key() {
        let config = StarrConfig::from_params("sonarr", &json!({"api-key": "secret"})).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.link("x"), None);
    }

    #[test]
    fn test_config_rejects_bad_url_and_unknown_keys() {
        assert!(StarrConfig::from_params("radarr", &json!({"url": "radarr:7878"})).is_err());
        assert!(StarrConfig::from_params("radarr", &json!({"token": "x"})).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }
}
