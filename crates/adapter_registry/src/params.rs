//! Typed decoding of opaque adapter payloads

use contracts::ContractError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode an adapter payload into its typed config
///
/// A missing payload (`null`) decodes as an empty table, so configs whose
/// fields all have defaults need no `config` section at all.
pub fn decode_params<T: DeserializeOwned>(type_name: &str, params: &Value) -> Result<T, ContractError> {
    let value = match params {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| ContractError::ConfigParse {
        message: format!("{type_name} config: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct LevelConfig {
        #[serde(default)]
        level: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct UrlConfig {
        url: String,
    }

    #[test]
    fn test_null_payload_uses_defaults() {
        let config: LevelConfig = decode_params("log", &Value::Null).unwrap();
        assert!(config.level.is_none());
    }

    #[test]
    fn test_typed_payload() {
        let config: UrlConfig = decode_params("web", &json!({"url": "http://x"})).unwrap();
        assert_eq!(config.url, "http://x");
    }

    #[test]
    fn test_missing_required_field() {
        let err = decode_params::<UrlConfig>("web", &Value::Null).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("web config"));
    }
}
