//! Event - the normalized notification passed between producers and sinks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification of an event.
///
/// Sinks select their rendering/handling by matching on this value. Any
/// type string not listed here deserializes to [`EventType::Unknown`], so
/// creating an event never fails on its type; a sink that cannot act on
/// `Unknown` reports a per-event failure instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ObjectAdded,
    ObjectUpdated,
    ObjectCompleted,
    ObjectFailed,
    ObjectDeleted,
    Informational,
    HealthIssue,
    Test,
    #[serde(other)]
    Unknown,
}

impl EventType {
    /// All recognized event types, in declaration order
    pub const KNOWN: [EventType; 8] = [
        EventType::ObjectAdded,
        EventType::ObjectUpdated,
        EventType::ObjectCompleted,
        EventType::ObjectFailed,
        EventType::ObjectDeleted,
        EventType::Informational,
        EventType::HealthIssue,
        EventType::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ObjectAdded => "ObjectAdded",
            EventType::ObjectUpdated => "ObjectUpdated",
            EventType::ObjectCompleted => "ObjectCompleted",
            EventType::ObjectFailed => "ObjectFailed",
            EventType::ObjectDeleted => "ObjectDeleted",
            EventType::Informational => "Informational",
            EventType::HealthIssue => "HealthIssue",
            EventType::Test => "Test",
            EventType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single metadata entry, rendered as a key/value row by sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
    /// Hint that the field may be rendered side by side with its neighbours
    #[serde(default)]
    pub inline: bool,
}

/// Ordered metadata list.
///
/// Order is the rendering order. Names are not required to be unique and
/// sinks must not rely on any particular name being present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Vec<MetadataField>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block (non-inline) field
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(name, value, false);
    }

    /// Append an inline field
    pub fn add_inline(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(name, value, true);
    }

    fn push(&mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) {
        self.0.push(MetadataField {
            name: name.into(),
            value: value.into(),
            inline,
        });
    }

    /// First value recorded under `name`, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetadataField> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a MetadataField;
    type IntoIter = std::slice::Iter<'a, MetadataField>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Normalized event
///
/// Produced by a source from an inbound request and delivered, by value, to
/// every active sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// What happened; sinks choose their handling from this
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Human readable headline (title, subject, ...)
    #[serde(default)]
    pub title: String,

    /// Body text, written in a small markdown subset
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,

    /// Producer name, diagnostics only
    #[serde(default)]
    pub source: String,

    /// Producer specific type string, diagnostics only
    #[serde(default, rename = "source_event")]
    pub source_event_type: String,

    #[serde(default, rename = "source_icon")]
    pub source_icon_url: String,

    #[serde(default)]
    pub metadata: Metadata,
}

impl Event {
    /// Create an event with the given type and title, all other fields empty
    pub fn new(event_type: EventType, title: impl Into<String>) -> Self {
        Self {
            event_type,
            title: title.into(),
            description: String::new(),
            thumbnail_url: None,
            image_url: None,
            link_url: None,
            source: String::new(),
            source_event_type: String::new(),
            source_icon_url: String::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set producer name, producer specific type and icon
    pub fn with_source(
        mut self,
        source: impl Into<String>,
        source_event_type: impl Into<String>,
        source_icon_url: impl Into<String>,
    ) -> Self {
        self.source = source.into();
        self.source_event_type = source_event_type.into();
        self.source_icon_url = source_icon_url.into();
        self
    }

    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_link_url(mut self, url: impl Into<String>) -> Self {
        self.link_url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}
