//! Trending list and related-anime recommendations.

use std::cmp::Reverse;

use anistream_common::{Anime, AnimeId, Error, Result, TrendingConfig};
use anistream_store::Collection;

use super::CatalogService;

/// Default number of related animes returned.
pub const DEFAULT_RELATED_LIMIT: usize = 6;

impl CatalogService {
    /// Pinned animes first, in pinned order, then the rest ranked by
    /// trending flag, views and recency. Truncated to the configured limit.
    pub fn trending(&self) -> Result<Vec<Anime>> {
        let config = self.trending_config()?;
        let mut rest = self.all_animes()?;

        let mut out = Vec::with_capacity(config.limit.min(rest.len()));
        for id in &config.pinned {
            if let Some(pos) = rest.iter().position(|a| a.id == *id) {
                out.push(rest.swap_remove(pos));
            }
        }

        rest.sort_by_key(|a| (Reverse(a.trending), Reverse(a.views), Reverse(a.updated_at)));
        out.extend(rest);
        out.truncate(config.limit);
        Ok(out)
    }

    pub fn trending_config(&self) -> Result<TrendingConfig> {
        self.store.load(&Collection::Trending)
    }

    /// Replace the trending settings.
    ///
    /// Pins are deduplicated; pins of unknown animes are kept and ignored
    /// when listing.
    pub fn set_trending_config(&self, mut config: TrendingConfig) -> Result<TrendingConfig> {
        if config.limit == 0 {
            return Err(Error::validation("trending limit must be at least 1"));
        }
        let mut seen = Vec::with_capacity(config.pinned.len());
        config.pinned.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });

        self.store.save(&Collection::Trending, &config)?;
        tracing::info!(pinned = config.pinned.len(), limit = config.limit, "Trending config updated");
        Ok(config)
    }

    pub(super) fn unpin(&self, id: AnimeId) -> Result<()> {
        self.store
            .update(&Collection::Trending, |config: &mut TrendingConfig| {
                config.pinned.retain(|p| *p != id);
                Ok(())
            })
    }

    /// Animes sharing at least one genre with `anime_id`, most shared
    /// genres first, then most viewed.
    pub fn related(&self, anime_id: AnimeId, limit: usize) -> Result<Vec<Anime>> {
        let animes = self.all_animes()?;
        let anime = animes
            .iter()
            .find(|a| a.id == anime_id)
            .ok_or_else(|| Error::not_found("anime", anime_id))?;

        let mut scored: Vec<(usize, &Anime)> = animes
            .iter()
            .filter(|other| other.id != anime_id)
            .map(|other| (anime.shared_genres(other), other))
            .filter(|(shared, _)| *shared > 0)
            .collect();

        scored.sort_by_key(|(shared, other)| (Reverse(*shared), Reverse(other.views), other.id));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, other)| other.clone())
            .collect())
    }
}
