use std::fmt;

use anistream_common::AnimeId;

/// A named JSON document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    /// All anime records.
    Animes,
    /// The episode list of one anime.
    Episodes(AnimeId),
    /// Trending list settings.
    Trending,
    /// Weekly schedule entries.
    Schedule,
}

impl Collection {
    /// Storage key, usable as a relative file stem.
    pub fn key(&self) -> String {
        match self {
            Collection::Animes => "animes".to_string(),
            Collection::Episodes(id) => format!("episodes/{id}"),
            Collection::Trending => "trending".to_string(),
            Collection::Schedule => "schedule".to_string(),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
