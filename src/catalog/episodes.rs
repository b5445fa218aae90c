//! Episode CRUD.

use anistream_common::{AnimeId, Episode, Error, Result, VideoServer};
use anistream_store::Collection;
use serde::Deserialize;

use super::CatalogService;

/// Request body for adding an episode.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEpisode {
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub servers: Vec<VideoServer>,
}

/// Partial update for an episode. `servers`, when present, replaces the
/// whole server list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodePatch {
    pub title: Option<String>,
    pub servers: Option<Vec<VideoServer>>,
}

impl CatalogService {
    /// Episodes of an anime, ordered by number.
    pub fn list_episodes(&self, anime_id: AnimeId) -> Result<Vec<Episode>> {
        self.require_anime(anime_id)?;
        let mut episodes: Vec<Episode> = self.store.load(&Collection::Episodes(anime_id))?;
        episodes.sort_by_key(|e| e.number);
        Ok(episodes)
    }

    pub fn get_episode(&self, anime_id: AnimeId, number: u32) -> Result<Episode> {
        self.require_anime(anime_id)?;
        let episodes: Vec<Episode> = self.store.load(&Collection::Episodes(anime_id))?;
        episodes
            .into_iter()
            .find(|e| e.number == number)
            .ok_or_else(|| episode_not_found(anime_id, number))
    }

    /// Add an episode; fails with `Conflict` if the number is taken.
    pub fn add_episode(&self, anime_id: AnimeId, new: NewEpisode) -> Result<Episode> {
        self.require_anime(anime_id)?;
        validate_number(new.number)?;
        let servers = validate_servers(new.servers)?;

        let mut episode = Episode::new(new.number);
        episode.title = clean_title(new.title);
        episode.servers = servers;

        self.store
            .update(&Collection::Episodes(anime_id), |episodes: &mut Vec<Episode>| {
                if episodes.iter().any(|e| e.number == episode.number) {
                    return Err(Error::conflict(format!(
                        "episode {} of anime {anime_id} already exists",
                        episode.number
                    )));
                }
                episodes.push(episode.clone());
                episodes.sort_by_key(|e| e.number);
                Ok(())
            })?;

        tracing::debug!(%anime_id, number = episode.number, "Episode added");
        Ok(episode)
    }

    pub fn update_episode(
        &self,
        anime_id: AnimeId,
        number: u32,
        patch: EpisodePatch,
    ) -> Result<Episode> {
        self.require_anime(anime_id)?;
        let servers = patch.servers.map(validate_servers).transpose()?;

        self.store
            .update(&Collection::Episodes(anime_id), |episodes: &mut Vec<Episode>| {
                let episode = episodes
                    .iter_mut()
                    .find(|e| e.number == number)
                    .ok_or_else(|| episode_not_found(anime_id, number))?;

                if let Some(title) = patch.title {
                    episode.title = clean_title(Some(title));
                }
                if let Some(servers) = servers {
                    episode.servers = servers;
                }
                Ok(episode.clone())
            })
    }

    pub fn delete_episode(&self, anime_id: AnimeId, number: u32) -> Result<()> {
        self.require_anime(anime_id)?;
        self.store
            .update(&Collection::Episodes(anime_id), |episodes: &mut Vec<Episode>| {
                let before = episodes.len();
                episodes.retain(|e| e.number != number);
                if episodes.len() == before {
                    return Err(episode_not_found(anime_id, number));
                }
                Ok(())
            })
    }

    pub(super) fn require_anime(&self, anime_id: AnimeId) -> Result<()> {
        match self.find_anime(anime_id)? {
            Some(_) => Ok(()),
            None => Err(Error::not_found("anime", anime_id)),
        }
    }
}

fn episode_not_found(anime_id: AnimeId, number: u32) -> Error {
    Error::not_found("episode", format!("{anime_id}/{number}"))
}

pub(super) fn validate_number(number: u32) -> Result<()> {
    if number == 0 {
        return Err(Error::validation("episode number must be at least 1"));
    }
    Ok(())
}

/// Trim names and sources, rejecting blanks and duplicate names.
pub(super) fn validate_servers(servers: Vec<VideoServer>) -> Result<Vec<VideoServer>> {
    let mut out: Vec<VideoServer> = Vec::with_capacity(servers.len());
    for server in servers {
        let name = server.name.trim();
        let source = server.source.trim();
        if name.is_empty() || source.is_empty() {
            return Err(Error::validation("server name and source must not be empty"));
        }
        if out.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return Err(Error::validation(format!("duplicate server name: {name}")));
        }
        out.push(VideoServer {
            name: name.to_string(),
            source: source.to_string(),
        });
    }
    Ok(out)
}

fn clean_title(title: Option<String>) -> Option<String> {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
