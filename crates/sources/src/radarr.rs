//! Radarr webhook producer

use contracts::{ContractError, Event, EventSource, EventType, Metadata};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::starr::{
    add_if_present, add_release, decode_payload, format_size, require_event_type, CommonFields,
    Release, StarrConfig, Vendor,
};

const VENDOR: Vendor = Vendor {
    label: "Radarr",
    icon_url: "https://raw.githubusercontent.com/Radarr/Radarr/develop/Logo/256.png",
};

/// Radarr's `eventType` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarrEventType {
    Grab,
    Download,
    Rename,
    MovieAdded,
    MovieFileDelete,
    MovieDelete,
    Health,
    ApplicationUpdate,
    Test,
    Unknown,
}

impl RadarrEventType {
    pub fn parse(value: &str) -> Self {
        match value {
            "Grab" => Self::Grab,
            "Download" => Self::Download,
            "Rename" => Self::Rename,
            "MovieAdded" => Self::MovieAdded,
            "MovieFileDelete" => Self::MovieFileDelete,
            "MovieDelete" => Self::MovieDelete,
            "Health" => Self::Health,
            "ApplicationUpdate" => Self::ApplicationUpdate,
            "Test" => Self::Test,
            _ => Self::Unknown,
        }
    }

    pub fn event_type(self) -> EventType {
        match self {
            Self::Grab | Self::Download | Self::MovieFileDelete => EventType::ObjectUpdated,
            Self::Rename => EventType::ObjectCompleted,
            Self::MovieAdded => EventType::ObjectAdded,
            Self::MovieDelete => EventType::ObjectDeleted,
            Self::Health => EventType::HealthIssue,
            Self::ApplicationUpdate => EventType::Informational,
            Self::Test => EventType::Test,
            Self::Unknown => EventType::Unknown,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Grab => "Grabbed",
            Self::Download => "Downloaded",
            Self::Rename => "Renamed",
            Self::MovieAdded => "Added",
            Self::MovieFileDelete => "File Deleted",
            Self::MovieDelete => "Deleted",
            Self::Health => "Health Issue",
            Self::ApplicationUpdate => "Application Update",
            Self::Test => "Test",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Movie {
    title: String,
    year: u32,
    release_date: String,
    tmdb_id: u64,
    imdb_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MovieFile {
    quality: String,
    release_group: String,
    scene_name: String,
    size: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Payload {
    #[serde(flatten)]
    common: CommonFields,
    movie: Option<Movie>,
    remote_movie: Option<Movie>,
    movie_file: Option<MovieFile>,
    release: Option<Release>,
    delete_reason: String,
}

/// Producer for Radarr's "Webhook" connection
pub struct Radarr {
    name: String,
    config: StarrConfig,
}

impl Radarr {
    pub const TYPE: &'static str = "radarr";

    pub fn new(name: impl Into<String>, config: StarrConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn from_params(name: &str, params: &Value) -> Result<Self, ContractError> {
        Ok(Self::new(name, StarrConfig::from_params(Self::TYPE, params)?))
    }

    fn movie_event(&self, kind: RadarrEventType, payload: &Payload) -> Event {
        let movie = payload.movie.as_ref().or(payload.remote_movie.as_ref());
        let movie_title = movie.map(|m| m.title.as_str()).unwrap_or_default();

        let mut event = VENDOR
            .event(
                kind.event_type(),
                &payload.common.event_type,
                format!("[{}] {}", kind.description(), movie_title),
            )
            .with_description(format!("Movie {}", kind.description()));

        let mut metadata = Metadata::new();
        if let Some(movie) = movie {
            if movie.year > 0 {
                metadata.add_inline("Year", movie.year.to_string());
            }
            add_if_present(&mut metadata, "Release Date", &movie.release_date, true);
            if !movie.imdb_id.is_empty() {
                metadata.add_inline("IMDb", &movie.imdb_id);
            }
            if movie.tmdb_id > 0 {
                if let Some(link) = self.config.link(&format!("movie/{}", movie.tmdb_id)) {
                    event = event.with_link_url(link);
                }
            }
        }

        if let Some(file) = &payload.movie_file {
            add_if_present(&mut metadata, "Quality", &file.quality, true);
            if file.size > 0 {
                metadata.add_inline("File Size", format_size(file.size));
            }
            add_if_present(&mut metadata, "Release", &file.scene_name, false);
            add_if_present(&mut metadata, "Release Group", &file.release_group, false);
        } else if let Some(release) = &payload.release {
            add_release(&mut metadata, release);
        }

        add_if_present(&mut metadata, "Delete Reason", &payload.delete_reason, false);
        if payload.common.is_upgrade {
            metadata.add("Quality Upgrade", "true");
        }

        event.with_metadata(metadata)
    }
}

impl EventSource for Radarr {
    fn kind(&self) -> &str {
        Self::TYPE
    }

    fn handle(&self, body: &[u8]) -> Result<Event, ContractError> {
        let payload: Payload = decode_payload(&self.name, body)?;
        require_event_type(&self.name, &payload.common)?;

        let kind = RadarrEventType::parse(&payload.common.event_type);
        debug!(source = %self.name, vendor_event = %payload.common.event_type, "Radarr payload decoded");

        let event = match kind {
            RadarrEventType::Health => VENDOR.health(kind.event_type(), &payload.common),
            RadarrEventType::ApplicationUpdate => {
                VENDOR.application_update(kind.event_type(), &payload.common)
            }
            _ => self.movie_event(kind, &payload),
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn radarr() -> Radarr {
        Radarr::new("movies", StarrConfig::default())
    }

    fn handle(source: &Radarr, payload: serde_json::Value) -> Event {
        source.handle(payload.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_health_event() {
        let event = handle(
            &radarr(),
            json!({
                "eventType": "Health",
                "level": "warning",
                "type": "IndexerRssCheck",
                "message": "No indexers available",
                "wikiUrl": "https://wiki.servarr.com/radarr/system#indexers"
            }),
        );
        assert_eq!(event.event_type, EventType::HealthIssue);
        assert_eq!(event.title, "Radarr Health warning: IndexerRssCheck");
        assert_eq!(event.description, "No indexers available");
        assert_eq!(
            event.link_url.as_deref(),
            Some("https://wiki.servarr.com/radarr/system#indexers")
        );
        assert_eq!(event.source, "Radarr");
        assert_eq!(event.source_event_type, "Health");
    }

    #[test]
    fn test_application_update() {
        let event = handle(
            &radarr(),
            json!({
                "eventType": "ApplicationUpdate",
                "message": "Radarr updated from 4.0 to 4.1",
                "previousVersion": "4.0",
                "newVersion": "4.1"
            }),
        );
        assert_eq!(event.event_type, EventType::Informational);
        assert_eq!(event.title, "Radarr updated from 4.0 to 4.1");
        assert_eq!(event.metadata.get("Previous Version"), Some("4.0"));
        assert_eq!(event.metadata.get("New Version"), Some("4.1"));
    }

    #[test]
    fn test_download_with_file() {
        let source = Radarr::new(
            "movies",
            StarrConfig {
                url: Some("http://radarr:7878".into()),
                api_key: None,
            },
        );
        let event = handle(
            &source,
            json!({
                "eventType": "Download",
                "isUpgrade": true,
                "movie": {"id": 1, "title": "Heat", "year": 1995, "tmdbId": 949},
                "movieFile": {
                    "quality": "Bluray-1080p",
                    "releaseGroup": "GRP",
                    "sceneName": "Heat.1995.1080p",
                    "size": 1073741824
                }
            }),
        );
        assert_eq!(event.event_type, EventType::ObjectUpdated);
        assert_eq!(event.title, "[Downloaded] Heat");
        assert_eq!(event.description, "Movie Downloaded");
        assert_eq!(event.link_url.as_deref(), Some("http://radarr:7878/movie/949"));
        assert_eq!(event.metadata.get("Quality"), Some("Bluray-1080p"));
        assert_eq!(event.metadata.get("File Size"), Some("1.00 GiB"));
        assert_eq!(event.metadata.get("Release Group"), Some("GRP"));
        assert_eq!(event.metadata.get("Quality Upgrade"), Some("true"));
    }

    #[test]
    fn test_grab_uses_release() {
        let event = handle(
            &radarr(),
            json!({
                "eventType": "Grab",
                "remoteMovie": {"title": "Alien", "year": 1979},
                "release": {"quality": "WEBDL-2160p", "releaseTitle": "Alien.1979", "releaseGroup": "X"}
            }),
        );
        assert_eq!(event.title, "[Grabbed] Alien");
        assert_eq!(event.metadata.get("Release"), Some("Alien.1979"));
        assert_eq!(event.link_url, None);
    }

    #[test]
    fn test_event_type_mapping() {
        let cases = [
            ("MovieAdded", EventType::ObjectAdded),
            ("MovieDelete", EventType::ObjectDeleted),
            ("MovieFileDelete", EventType::ObjectUpdated),
            ("Rename", EventType::ObjectCompleted),
            ("Test", EventType::Test),
            ("SomethingNew", EventType::Unknown),
        ];
        for (vendor, expected) in cases {
            let event = handle(
                &radarr(),
                json!({"eventType": vendor, "movie": {"title": "Test Title"}}),
            );
            assert_eq!(event.event_type, expected, "{vendor}");
            assert_eq!(event.source_event_type, vendor);
        }
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert!(radarr().handle(b"{").is_err());
        assert!(radarr().handle(br#"{"movie": {}}"#).is_err());
    }
}
