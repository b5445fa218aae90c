//! Catalog service.
//!
//! All catalog reads and writes go through [`CatalogService`], which wraps a
//! [`Store`] and keeps the collections consistent with each other (episodes
//! and schedule entries never outlive their anime). Operations are
//! synchronous; collections are small whole-file documents.

mod animes;
mod episodes;
mod ingest;
mod schedule;
mod trending;

pub use animes::{AnimePatch, AnimeQuery, AnimeSort, NewAnime};
pub use episodes::{EpisodePatch, NewEpisode};
pub use ingest::{parse_option_list, EpisodeBatch, IngestReport, OptionEntry};
pub use schedule::{NewScheduleEntry, ScheduleEntryPatch, WeeklyDay};
pub use trending::DEFAULT_RELATED_LIMIT;

use anistream_common::{AnimeId, Episode, Error, VideoSource};
use anistream_store::{Collection, Store};

/// Why a video source could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("anime {0} not found")]
    AnimeMissing(AnimeId),

    #[error("episode {episode} of anime {anime_id} not found")]
    EpisodeMissing { anime_id: AnimeId, episode: u32 },

    #[error("server {index} of episode {episode} not found")]
    ServerMissing { episode: u32, index: usize },

    #[error(transparent)]
    Catalog(#[from] Error),
}

/// Catalog operations over a document store.
#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Store,
}

impl CatalogService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Look up the source behind one server slot of an episode.
    ///
    /// `server_index` is 0-based.
    pub fn resolve_video_source(
        &self,
        anime_id: AnimeId,
        episode: u32,
        server_index: usize,
    ) -> Result<VideoSource, ResolveError> {
        self.find_anime(anime_id)?
            .ok_or(ResolveError::AnimeMissing(anime_id))?;

        let episodes: Vec<Episode> = self.store.load(&Collection::Episodes(anime_id))?;
        let found = episodes
            .iter()
            .find(|e| e.number == episode)
            .ok_or(ResolveError::EpisodeMissing { anime_id, episode })?;

        let server = found.server(server_index).ok_or(ResolveError::ServerMissing {
            episode,
            index: server_index,
        })?;

        Ok(VideoSource::classify(&server.source))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use anistream_store::MemoryStore;

    pub fn service() -> CatalogService {
        CatalogService::new(Store::new(MemoryStore::default()))
    }

    pub fn seed_anime(catalog: &CatalogService, title: &str, genres: &[&str]) -> AnimeId {
        catalog
            .create_anime(NewAnime {
                title: title.to_string(),
                genres: genres.iter().map(|g| g.to_string()).collect(),
                ..Default::default()
            })
            .unwrap()
            .id
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use anistream_common::VideoServer;
    use assert_matches::assert_matches;

    fn seed_episode(catalog: &CatalogService, anime_id: AnimeId) {
        catalog
            .add_episode(
                anime_id,
                NewEpisode {
                    number: 1,
                    title: None,
                    servers: vec![
                        VideoServer {
                            name: "local".into(),
                            source: "frieren/01.mp4".into(),
                        },
                        VideoServer {
                            name: "mirror".into(),
                            source: "https://cdn.example.com/frieren/01.mp4".into(),
                        },
                    ],
                },
            )
            .unwrap();
    }

    #[test]
    fn resolves_local_and_remote_servers() {
        let catalog = service();
        let id = seed_anime(&catalog, "Frieren", &["Fantasy"]);
        seed_episode(&catalog, id);

        assert_eq!(
            catalog.resolve_video_source(id, 1, 0).unwrap(),
            VideoSource::Local("frieren/01.mp4".into())
        );
        assert_eq!(
            catalog.resolve_video_source(id, 1, 1).unwrap(),
            VideoSource::Remote("https://cdn.example.com/frieren/01.mp4".into())
        );
    }

    #[test]
    fn resolve_reports_what_is_missing() {
        let catalog = service();
        let id = seed_anime(&catalog, "Frieren", &[]);
        seed_episode(&catalog, id);

        assert_matches!(
            catalog.resolve_video_source(AnimeId::new(99), 1, 0),
            Err(ResolveError::AnimeMissing(missing)) if missing == AnimeId::new(99)
        );
        assert_matches!(
            catalog.resolve_video_source(id, 7, 0),
            Err(ResolveError::EpisodeMissing { episode: 7, .. })
        );
        assert_matches!(
            catalog.resolve_video_source(id, 1, 2),
            Err(ResolveError::ServerMissing { index: 2, .. })
        );
    }
}
