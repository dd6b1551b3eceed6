//! Dream records and the inputs that create or modify them.

use crate::{error::Result, DreamId, Error, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Message used whenever a dream has nothing worth saving.
pub const EMPTY_DREAM_MESSAGE: &str = "A title, content, or tag is required to save a dream.";

/// Kind of dream. The set is closed; every lookup over it is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DreamType {
    #[default]
    Normal,
    Lucid,
    Vivid,
    FalseAwakening,
    SleepParalysis,
}

impl DreamType {
    /// Every variant, in display order.
    pub const ALL: [DreamType; 5] = [
        DreamType::Normal,
        DreamType::Lucid,
        DreamType::Vivid,
        DreamType::FalseAwakening,
        DreamType::SleepParalysis,
    ];

    /// Wire and database name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DreamType::Normal => "normal",
            DreamType::Lucid => "lucid",
            DreamType::Vivid => "vivid",
            DreamType::FalseAwakening => "false_awakening",
            DreamType::SleepParalysis => "sleep_paralysis",
        }
    }

    /// Human-readable label shown on cards and in the type selector.
    pub fn label(&self) -> &'static str {
        match self {
            DreamType::Normal => "Обычный",
            DreamType::Lucid => "Осознанный",
            DreamType::Vivid => "Яркий",
            DreamType::FalseAwakening => "Ложное пробуждение",
            DreamType::SleepParalysis => "Сонный паралич",
        }
    }

    /// Label for narrow badges.
    pub fn short_label(&self) -> &'static str {
        match self {
            DreamType::FalseAwakening => "ЛП",
            other => other.label(),
        }
    }
}

impl fmt::Display for DreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DreamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DreamType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownDreamType(s.to_string()))
    }
}

/// A journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dream {
    /// Negative ids are temporary, assigned by the client until the server answers.
    pub id: DreamId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// When the dream happened, `None` when unknown.
    #[serde(default)]
    pub date: Option<Timestamp>,
    /// Lowercase, unique, in display order.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type", default)]
    pub dream_type: DreamType,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Dream {
    /// Whether this record is a local placeholder awaiting confirmation.
    pub fn is_temporary(&self) -> bool {
        self.id < 0
    }

    /// Check the title/content/tag invariant.
    pub fn validate(&self) -> Result<()> {
        ensure_not_empty(&self.title, &self.content, &self.tags)
    }

    /// Return a copy of this dream with `patch` applied.
    ///
    /// Identity and server timestamps are never touched by a merge.
    pub fn merged(&self, patch: &DreamPatch) -> Dream {
        let mut dream = self.clone();
        if let Some(title) = &patch.title {
            dream.title = title.clone();
        }
        if let Some(content) = &patch.content {
            dream.content = content.clone();
        }
        if let Some(date) = patch.date {
            dream.date = date;
        }
        if let Some(tags) = &patch.tags {
            dream.tags = normalize_tags(tags);
        }
        if let Some(dream_type) = patch.dream_type {
            dream.dream_type = dream_type;
        }
        dream
    }

    /// Same user-visible fields, ignoring id and timestamps.
    pub fn same_entry(&self, other: &Dream) -> bool {
        self.title == other.title
            && self.content == other.content
            && self.date == other.date
            && self.tags == other.tags
            && self.dream_type == other.dream_type
    }
}

/// Fields supplied by the user when creating a dream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date: Option<Timestamp>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type", default)]
    pub dream_type: DreamType,
}

impl DreamInput {
    /// Create an input with just a title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, date: Timestamp) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_type(mut self, dream_type: DreamType) -> Self {
        self.dream_type = dream_type;
        self
    }

    /// Check the title/content/tag invariant.
    pub fn validate(&self) -> Result<()> {
        ensure_not_empty(&self.title, &self.content, &self.tags)
    }

    /// Normalize tags and validate.
    pub fn prepared(mut self) -> Result<Self> {
        self.tags = normalize_tags(&self.tags);
        self.validate()?;
        Ok(self)
    }

    /// Materialize as a dream with the given id and timestamp.
    pub fn into_dream(self, id: DreamId, now: Timestamp) -> Dream {
        Dream {
            id,
            title: self.title,
            content: self.content,
            date: self.date,
            tags: normalize_tags(&self.tags),
            dream_type: self.dream_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. Absent fields are left unchanged.
///
/// `date` is doubly optional: `None` leaves the date alone, `Some(None)`
/// (an explicit JSON `null`) clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Option<Timestamp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dream_type: Option<DreamType>,
}

impl DreamPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn date(mut self, date: Option<Timestamp>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = Some(normalize_tags(tags));
        self
    }

    pub fn dream_type(mut self, dream_type: DreamType) -> Self {
        self.dream_type = Some(dream_type);
        self
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.date.is_none()
            && self.tags.is_none()
            && self.dream_type.is_none()
    }
}

/// Distinguishes a missing `date` key from `"date": null`.
fn present_or_null<'de, D>(deserializer: D) -> std::result::Result<Option<Option<Timestamp>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Timestamp>::deserialize(deserializer).map(Some)
}

fn ensure_not_empty(title: &str, content: &str, tags: &[String]) -> Result<()> {
    if title.trim().is_empty() && content.trim().is_empty() && tags.is_empty() {
        return Err(Error::Validation(EMPTY_DREAM_MESSAGE.to_string()));
    }
    Ok(())
}

/// Trim, lowercase and deduplicate tags, keeping first occurrences in order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Journal ordering: `date` descending with unknown dates last, then
/// `created_at` descending.
pub fn display_order(a: &Dream, b: &Dream) -> Ordering {
    let by_date = match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| b.created_at.cmp(&a.created_at))
}

/// Sort dreams into journal order in place.
pub fn sort_for_display(dreams: &mut [Dream]) {
    dreams.sort_by(display_order);
}
