//! Catalog record types.
//!
//! These are the documents persisted by the store. Optional fields carry serde
//! defaults so older or hand-written JSON files load with the same shape as
//! freshly created records; nothing downstream needs to re-apply defaults.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{AnimeId, ScheduleId};

/// Format of an anime release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeType {
    /// Regular television series.
    #[default]
    Tv,
    /// Feature film.
    Movie,
    /// Original video animation.
    Ova,
    /// Original net animation.
    Ona,
    /// Specials and extras.
    Special,
}

/// Airing status of an anime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeStatus {
    /// Still releasing episodes.
    #[default]
    Ongoing,
    /// Finished airing.
    Completed,
    /// Announced but not yet airing.
    Upcoming,
}

/// Timestamp for records written without one.
///
/// Fixed so that repeated loads of the same document agree.
fn unrecorded() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// An anime title in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub id: AnimeId,
    pub title: String,
    #[serde(default)]
    pub alt_titles: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: AnimeType,
    #[serde(default)]
    pub status: AnimeStatus,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub trending: bool,
    #[serde(default = "unrecorded")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "unrecorded")]
    pub updated_at: DateTime<Utc>,
}

impl Anime {
    /// Build a record with every optional field at its default.
    pub fn new(id: AnimeId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            alt_titles: Vec::new(),
            description: String::new(),
            genres: Vec::new(),
            image: None,
            kind: AnimeType::default(),
            status: AnimeStatus::default(),
            year: None,
            views: 0,
            trending: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive genre membership.
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }

    /// Number of genres shared with `other`, ignoring case.
    pub fn shared_genres(&self, other: &Anime) -> usize {
        self.genres.iter().filter(|g| other.has_genre(g)).count()
    }
}

/// A named playback slot on an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoServer {
    pub name: String,
    /// Relative path under the content root, or an absolute `http(s)` URL.
    pub source: String,
}

/// One episode of an anime with its available servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub servers: Vec<VideoServer>,
    #[serde(default = "unrecorded")]
    pub created_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            title: None,
            servers: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Server at a 0-based slot.
    pub fn server(&self, index: usize) -> Option<&VideoServer> {
        self.servers.get(index)
    }

    /// Insert a server, replacing any existing server with the same name.
    ///
    /// Returns `true` when an existing server was replaced.
    pub fn upsert_server(&mut self, server: VideoServer) -> bool {
        match self
            .servers
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(&server.name))
        {
            Some(existing) => {
                *existing = server;
                true
            }
            None => {
                self.servers.push(server);
                false
            }
        }
    }
}

/// Day of the week a schedule entry airs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    /// Accepts full names and three-letter abbreviations in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str() == lower || d.as_str()[..3] == lower)
            .ok_or_else(|| format!("unknown weekday: {s}"))
    }
}

/// A weekly airing slot for an anime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: ScheduleId,
    pub anime_id: AnimeId,
    pub day: Weekday,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Settings for the trending list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    /// Animes always listed first, in this order.
    pub pinned: Vec<AnimeId>,
    /// Maximum number of entries returned.
    pub limit: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            pinned: Vec::new(),
            limit: 10,
        }
    }
}

/// Serde adapter storing a [`NaiveTime`] as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    /// Parse `HH:MM`, also tolerating a trailing `:SS`.
    pub fn parse(s: &str) -> Result<NaiveTime, chrono::ParseError> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, FORMAT).or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
