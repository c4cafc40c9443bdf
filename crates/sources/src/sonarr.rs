//! Sonarr webhook producer

use contracts::{ContractError, Event, EventSource, EventType, Metadata};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::starr::{
    add_if_present, add_release, decode_payload, format_size, require_event_type, CommonFields,
    Release, StarrConfig, Vendor,
};

const VENDOR: Vendor = Vendor {
    label: "Sonarr",
    icon_url: "https://raw.githubusercontent.com/Sonarr/Sonarr/develop/Logo/256.png",
};

/// Sonarr's `eventType` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SonarrEventType {
    Grab,
    Download,
    Rename,
    SeriesAdd,
    SeriesDelete,
    EpisodeFileDelete,
    Test,
    Health,
    HealthRestored,
    ApplicationUpdate,
    Unknown,
}

impl SonarrEventType {
    pub fn parse(value: &str) -> Self {
        match value {
            "Grab" => Self::Grab,
            "Download" => Self::Download,
            "Rename" => Self::Rename,
            "SeriesAdd" => Self::SeriesAdd,
            "SeriesDelete" => Self::SeriesDelete,
            "EpisodeFileDelete" => Self::EpisodeFileDelete,
            "Test" => Self::Test,
            "Health" => Self::Health,
            "HealthRestored" => Self::HealthRestored,
            "ApplicationUpdate" | "Upgrade" => Self::ApplicationUpdate,
            _ => Self::Unknown,
        }
    }

    pub fn event_type(self) -> EventType {
        match self {
            Self::Grab | Self::Download | Self::EpisodeFileDelete => EventType::ObjectUpdated,
            Self::Rename => EventType::ObjectCompleted,
            Self::SeriesAdd => EventType::ObjectAdded,
            Self::SeriesDelete => EventType::ObjectDeleted,
            Self::Test => EventType::Test,
            Self::Health => EventType::HealthIssue,
            Self::HealthRestored | Self::ApplicationUpdate => EventType::Informational,
            Self::Unknown => EventType::Unknown,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Grab => "Grabbed",
            Self::Download => "Downloaded",
            Self::Rename => "Renamed",
            Self::SeriesAdd => "Series Added",
            Self::SeriesDelete => "Series Deleted",
            Self::EpisodeFileDelete => "Episode File Deleted",
            Self::Test => "Test",
            Self::Health => "Health Issue",
            Self::HealthRestored => "Health Issue Restored",
            Self::ApplicationUpdate => "Application Upgraded",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Series {
    title: String,
    title_slug: String,
    year: u32,
    imdb_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Episode {
    season_number: u32,
    episode_number: u32,
    title: String,
    air_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MediaInfo {
    audio_codec: String,
    video_codec: String,
    audio_languages: Vec<String>,
    subtitles: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EpisodeFile {
    quality: String,
    release_group: String,
    scene_name: String,
    size: u64,
    media_info: Option<MediaInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Payload {
    #[serde(flatten)]
    common: CommonFields,
    series: Option<Series>,
    episodes: Vec<Episode>,
    episode_file: Option<EpisodeFile>,
    renamed_episode_files: Vec<EpisodeFile>,
    deleted_files: Vec<EpisodeFile>,
    release: Option<Release>,
    delete_reason: String,
}

impl Payload {
    /// The file an episode event is about, wherever Sonarr put it
    fn file(&self) -> Option<&EpisodeFile> {
        self.episode_file
            .as_ref()
            .or_else(|| self.renamed_episode_files.first())
            .or_else(|| self.deleted_files.first())
    }

    fn series_title(&self) -> &str {
        self.series.as_ref().map(|s| s.title.as_str()).unwrap_or_default()
    }
}

/// Producer for Sonarr's "Webhook" connection
pub struct Sonarr {
    name: String,
    config: StarrConfig,
}

impl Sonarr {
    pub const TYPE: &'static str = "sonarr";

    pub fn new(name: impl Into<String>, config: StarrConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn from_params(name: &str, params: &Value) -> Result<Self, ContractError> {
        Ok(Self::new(name, StarrConfig::from_params(Self::TYPE, params)?))
    }

    fn series_link(&self, payload: &Payload) -> Option<String> {
        let slug = payload.series.as_ref().map(|s| s.title_slug.as_str())?;
        if slug.is_empty() {
            return None;
        }
        self.config.link(&format!("series/{slug}"))
    }

    fn health_restored(&self, kind: SonarrEventType, common: &CommonFields) -> Event {
        let mut event = VENDOR
            .event(
                kind.event_type(),
                &common.event_type,
                format!("{} {}: {}", VENDOR.label, kind.description(), common.check_type),
            )
            .with_description(&common.message);
        if !common.wiki_url.is_empty() {
            event = event.with_link_url(&common.wiki_url);
        }
        event
    }

    /// "<Series Added>: <title> (<year>)"
    fn series_event(&self, kind: SonarrEventType, payload: &Payload) -> Event {
        let year = payload.series.as_ref().map(|s| s.year).unwrap_or_default();
        let title = if year > 0 {
            format!("{}: {} ({})", kind.description(), payload.series_title(), year)
        } else {
            format!("{}: {}", kind.description(), payload.series_title())
        };

        let mut event = VENDOR
            .event(kind.event_type(), &payload.common.event_type, title)
            .with_description(&payload.common.message);
        if let Some(link) = self.series_link(payload) {
            event = event.with_link_url(link);
        }

        let mut metadata = Metadata::new();
        if let Some(series) = &payload.series {
            add_if_present(&mut metadata, "IMDb", &series.imdb_id, true);
        }
        add_if_present(&mut metadata, "Delete Reason", &payload.delete_reason, false);
        event.with_metadata(metadata)
    }

    /// "[<Downloaded>] <series title>" with episode list and file details
    fn episode_event(&self, kind: SonarrEventType, payload: &Payload) -> Event {
        let mut event = VENDOR
            .event(
                kind.event_type(),
                &payload.common.event_type,
                format!("[{}] {}", kind.description(), payload.series_title()),
            )
            .with_description(&payload.common.message);
        if let Some(link) = self.series_link(payload) {
            event = event.with_link_url(link);
        }

        let mut metadata = Metadata::new();
        if !payload.episodes.is_empty() {
            let label = if payload.episodes.len() > 1 { "Episodes" } else { "Episode" };
            let list: Vec<String> = payload
                .episodes
                .iter()
                .map(|ep| format!("S{:02}E{:02} {}", ep.season_number, ep.episode_number, ep.title))
                .collect();
            metadata.add(label, list.join("\n"));
            if let Some(first) = payload.episodes.first() {
                add_if_present(&mut metadata, "Air Date", &first.air_date, true);
            }
        }

        if let Some(file) = payload.file() {
            add_if_present(&mut metadata, "Quality", &file.quality, true);
            if let Some(media) = &file.media_info {
                if !media.video_codec.is_empty() || !media.audio_codec.is_empty() {
                    metadata.add_inline("Codecs", format!("{} / {}", media.video_codec, media.audio_codec));
                }
                add_if_present(&mut metadata, "Language", &media.audio_languages.join(", "), false);
                add_if_present(&mut metadata, "Subtitles", &media.subtitles.join(", "), false);
            }
            if file.size > 0 {
                metadata.add("File Size", format_size(file.size));
            }
            add_if_present(&mut metadata, "Release Group", &file.release_group, false);
            add_if_present(&mut metadata, "Release", &file.scene_name, false);
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

impl EventSource for Sonarr {
    fn kind(&self) -> &str {
        Self::TYPE
    }

    fn handle(&self, body: &[u8]) -> Result<Event, ContractError> {
        let payload: Payload = decode_payload(&self.name, body)?;
        require_event_type(&self.name, &payload.common)?;

        let kind = SonarrEventType::parse(&payload.common.event_type);
        debug!(source = %self.name, vendor_event = %payload.common.event_type, "Sonarr payload decoded");

        let event = match kind {
            SonarrEventType::Health => VENDOR.health(kind.event_type(), &payload.common),
            SonarrEventType::HealthRestored => self.health_restored(kind, &payload.common),
            SonarrEventType::ApplicationUpdate => {
                VENDOR.application_update(kind.event_type(), &payload.common)
            }
            SonarrEventType::SeriesAdd | SonarrEventType::SeriesDelete => {
                self.series_event(kind, &payload)
            }
            _ => self.episode_event(kind, &payload),
        };
        Ok(event)
    }
}
