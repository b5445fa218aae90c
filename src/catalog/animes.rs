//! Anime CRUD, search and view counting.

use anistream_common::{Anime, AnimeId, AnimeStatus, AnimeType, Error, Result, ScheduleEntry};
use anistream_store::Collection;
use chrono::Utc;
use serde::Deserialize;

use super::CatalogService;

/// Sort order for anime listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeSort {
    /// Most viewed first.
    Views,
    /// Alphabetical by title.
    Title,
    /// Most recently added first.
    Newest,
}

/// Filters for [`CatalogService::list_animes`]. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimeQuery {
    /// Case-insensitive substring over title and alternative titles.
    pub q: Option<String>,
    pub genre: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    /// Defaults to ascending id.
    pub sort: Option<AnimeSort>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Request body for creating an anime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAnime {
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
    pub trending: bool,
}

/// Partial update for an anime. Only present fields are changed.
///
/// An empty `image` string clears the image.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimePatch {
    pub title: Option<String>,
    pub alt_titles: Option<Vec<String>>,
    pub description: Option<String>,
    pub genres: Option<Vec<String>>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub year: Option<u16>,
    pub trending: Option<bool>,
}

impl CatalogService {
    /// List animes matching `query`, sorted and paginated.
    pub fn list_animes(&self, query: &AnimeQuery) -> Result<Vec<Anime>> {
        let mut animes = self.all_animes()?;

        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        animes.retain(|anime| {
            needle.as_deref().map_or(true, |n| matches_text(anime, n))
                && query.genre.as_deref().map_or(true, |g| anime.has_genre(g.trim()))
                && query.kind.map_or(true, |k| anime.kind == k)
                && query.status.map_or(true, |s| anime.status == s)
        });

        match query.sort {
            Some(AnimeSort::Views) => {
                animes.sort_by(|a, b| b.views.cmp(&a.views).then(a.id.cmp(&b.id)))
            }
            Some(AnimeSort::Title) => animes.sort_by(|a, b| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then(a.id.cmp(&b.id))
            }),
            Some(AnimeSort::Newest) => animes.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then(b.id.cmp(&a.id))
            }),
            None => animes.sort_by_key(|a| a.id),
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(animes.into_iter().skip(offset).take(limit).collect())
    }

    /// Get an anime, failing with `NotFound` when absent.
    pub fn get_anime(&self, id: AnimeId) -> Result<Anime> {
        self.find_anime(id)?
            .ok_or_else(|| Error::not_found("anime", id))
    }

    pub(super) fn find_anime(&self, id: AnimeId) -> Result<Option<Anime>> {
        Ok(self.all_animes()?.into_iter().find(|a| a.id == id))
    }

    pub(super) fn all_animes(&self) -> Result<Vec<Anime>> {
        self.store.load(&Collection::Animes)
    }

    /// Create an anime with the next free id.
    pub fn create_anime(&self, new: NewAnime) -> Result<Anime> {
        let title = normalize_title(&new.title)?;

        let anime = self
            .store
            .update(&Collection::Animes, |animes: &mut Vec<Anime>| {
                let id = animes
                    .iter()
                    .map(|a| a.id)
                    .max()
                    .map_or(AnimeId::new(1), AnimeId::next);

                let mut anime = Anime::new(id, title);
                anime.alt_titles = normalize_list(new.alt_titles);
                anime.description = new.description;
                anime.genres = normalize_genres(new.genres);
                anime.image = non_empty(new.image);
                anime.kind = new.kind;
                anime.status = new.status;
                anime.year = new.year;
                anime.trending = new.trending;

                animes.push(anime.clone());
                Ok(anime)
            })?;

        tracing::info!(id = %anime.id, title = %anime.title, "Anime created");
        Ok(anime)
    }

    /// Apply a partial update.
    pub fn update_anime(&self, id: AnimeId, patch: AnimePatch) -> Result<Anime> {
        let title = patch.title.as_deref().map(normalize_title).transpose()?;

        self.store
            .update(&Collection::Animes, |animes: &mut Vec<Anime>| {
                let anime = animes
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| Error::not_found("anime", id))?;

                if let Some(title) = title {
                    anime.title = title;
                }
                if let Some(alt_titles) = patch.alt_titles {
                    anime.alt_titles = normalize_list(alt_titles);
                }
                if let Some(description) = patch.description {
                    anime.description = description;
                }
                if let Some(genres) = patch.genres {
                    anime.genres = normalize_genres(genres);
                }
                if let Some(image) = patch.image {
                    anime.image = non_empty(Some(image));
                }
                if let Some(kind) = patch.kind {
                    anime.kind = kind;
                }
                if let Some(status) = patch.status {
                    anime.status = status;
                }
                if let Some(year) = patch.year {
                    anime.year = Some(year);
                }
                if let Some(trending) = patch.trending {
                    anime.trending = trending;
                }
                anime.updated_at = Utc::now();

                Ok(anime.clone())
            })
    }

    /// Delete an anime together with its episodes, schedule entries and
    /// any trending pin.
    pub fn delete_anime(&self, id: AnimeId) -> Result<()> {
        self.store
            .update(&Collection::Animes, |animes: &mut Vec<Anime>| {
                let before = animes.len();
                animes.retain(|a| a.id != id);
                if animes.len() == before {
                    return Err(Error::not_found("anime", id));
                }
                Ok(())
            })?;

        self.store.remove(&Collection::Episodes(id))?;
        let dropped = self
            .store
            .update(&Collection::Schedule, |entries: &mut Vec<ScheduleEntry>| {
                let before = entries.len();
                entries.retain(|e| e.anime_id != id);
                Ok(before - entries.len())
            })?;
        self.unpin(id)?;

        tracing::info!(%id, schedule_entries = dropped, "Anime deleted");
        Ok(())
    }

    /// Increment the view counter and return the new count.
    pub fn record_view(&self, id: AnimeId) -> Result<u64> {
        self.store
            .update(&Collection::Animes, |animes: &mut Vec<Anime>| {
                let anime = animes
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| Error::not_found("anime", id))?;
                anime.views = anime.views.saturating_add(1);
                Ok(anime.views)
            })
    }

    /// Distinct genres across the catalog, sorted case-insensitively.
    pub fn genres(&self) -> Result<Vec<String>> {
        let animes = self.all_animes()?;
        let mut genres: Vec<String> = Vec::new();
        for genre in animes.iter().flat_map(|a| a.genres.iter()) {
            if !genres.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
                genres.push(genre.clone());
            }
        }
        genres.sort_by_key(|g| g.to_lowercase());
        Ok(genres)
    }
}

fn matches_text(anime: &Anime, needle: &str) -> bool {
    std::iter::once(&anime.title)
        .chain(anime.alt_titles.iter())
        .any(|t| t.to_lowercase().contains(needle))
}

fn normalize_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("title must not be empty"));
    }
    Ok(title.to_string())
}

fn normalize_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Trim, drop blanks and remove case-insensitive duplicates, keeping the
/// first spelling.
fn normalize_genres(genres: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(genres.len());
    for genre in normalize_list(genres) {
        if !out.iter().any(|g| g.eq_ignore_ascii_case(&genre)) {
            out.push(genre);
        }
    }
    out
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn create_assigns_incrementing_ids() {
        let catalog = service();
        let a = seed_anime(&catalog, "Frieren", &[]);
        let b = seed_anime(&catalog, "Mushishi", &[]);
        assert_eq!(a, AnimeId::new(1));
        assert_eq!(b, AnimeId::new(2));

        catalog.delete_anime(a).unwrap();
        let c = seed_anime(&catalog, "Monster", &[]);
        assert_eq!(c, AnimeId::new(3));
    }

    #[test]
    fn create_normalizes_fields() {
        let catalog = service();
        let anime = catalog
            .create_anime(NewAnime {
                title: "  Frieren  ".into(),
                genres: vec![
                    " Fantasy ".into(),
                    "fantasy".into(),
                    "".into(),
                    "Adventure".into(),
                ],
                image: Some("   ".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(anime.title, "Frieren");
        assert_eq!(anime.genres, vec!["Fantasy", "Adventure"]);
        assert_eq!(anime.image, None);
        assert_eq!(anime.views, 0);
    }

    #[test]
    fn create_rejects_blank_title() {
        let catalog = service();
        let result = catalog.create_anime(NewAnime {
            title: "   ".into(),
            ..Default::default()
        });
        assert_matches!(result, Err(Error::Validation(_)));
        assert!(catalog.list_animes(&AnimeQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn get_missing_is_not_found() {
        let catalog = service();
        assert_matches!(
            catalog.get_anime(AnimeId::new(5)),
            Err(Error::NotFound { .. })
        );
    }

    #[test]
    fn search_matches_title_and_alt_titles() {
        let catalog = service();
        seed_anime(&catalog, "Sousou no Frieren", &["Fantasy"]);
        let id = seed_anime(&catalog, "Shingeki no Kyojin", &["Action"]);
        catalog
            .update_anime(
                id,
                AnimePatch {
                    alt_titles: Some(vec!["Attack on Titan".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        let query = AnimeQuery {
            q: Some("TITAN".into()),
            ..Default::default()
        };
        let found = catalog.list_animes(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);

        let query = AnimeQuery {
            q: Some("no".into()),
            ..Default::default()
        };
        assert_eq!(catalog.list_animes(&query).unwrap().len(), 2);
    }

    #[test]
    fn filters_by_genre_type_and_status() {
        let catalog = service();
        seed_anime(&catalog, "Frieren", &["Fantasy"]);
        let movie = catalog
            .create_anime(NewAnime {
                title: "Your Name".into(),
                genres: vec!["Romance".into()],
                kind: AnimeType::Movie,
                status: AnimeStatus::Completed,
                ..Default::default()
            })
            .unwrap();

        let by_genre = catalog
            .list_animes(&AnimeQuery {
                genre: Some("romance".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_genre.len(), 1);
        assert_eq!(by_genre[0].id, movie.id);

        let by_type = catalog
            .list_animes(&AnimeQuery {
                kind: Some(AnimeType::Tv),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].title, "Frieren");

        let by_status = catalog
            .list_animes(&AnimeQuery {
                status: Some(AnimeStatus::Completed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_status[0].id, movie.id);
    }

    #[test]
    fn sorts_and_paginates() {
        let catalog = service();
        let c = seed_anime(&catalog, "Cowboy Bebop", &[]);
        let a = seed_anime(&catalog, "akira", &[]);
        let b = seed_anime(&catalog, "Berserk", &[]);
        for _ in 0..3 {
            catalog.record_view(b).unwrap();
        }
        catalog.record_view(c).unwrap();

        let ids = |sort| {
            catalog
                .list_animes(&AnimeQuery {
                    sort,
                    ..Default::default()
                })
                .unwrap()
                .into_iter()
                .map(|a| a.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(None), vec![c, a, b]);
        assert_eq!(ids(Some(AnimeSort::Title)), vec![a, b, c]);
        assert_eq!(ids(Some(AnimeSort::Views)), vec![b, c, a]);

        let page = catalog
            .list_animes(&AnimeQuery {
                sort: Some(AnimeSort::Title),
                offset: Some(1),
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, b);
    }

    #[test]
    fn update_patches_only_given_fields() {
        let catalog = service();
        let id = seed_anime(&catalog, "Frieren", &["Fantasy"]);
        let before = catalog.get_anime(id).unwrap();

        let updated = catalog
            .update_anime(
                id,
                AnimePatch {
                    status: Some(AnimeStatus::Completed),
                    year: Some(2023),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Frieren");
        assert_eq!(updated.genres, vec!["Fantasy"]);
        assert_eq!(updated.status, AnimeStatus::Completed);
        assert_eq!(updated.year, Some(2023));
        assert!(updated.updated_at >= before.updated_at);
        assert_eq!(catalog.get_anime(id).unwrap(), updated);
    }

    #[test]
    fn update_missing_is_not_found() {
        let catalog = service();
        assert_matches!(
            catalog.update_anime(AnimeId::new(1), AnimePatch::default()),
            Err(Error::NotFound { .. })
        );
    }

    #[test]
    fn record_view_increments() {
        let catalog = service();
        let id = seed_anime(&catalog, "Frieren", &[]);
        assert_eq!(catalog.record_view(id).unwrap(), 1);
        assert_eq!(catalog.record_view(id).unwrap(), 2);
        assert_eq!(catalog.get_anime(id).unwrap().views, 2);
        assert_matches!(
            catalog.record_view(AnimeId::new(9)),
            Err(Error::NotFound { .. })
        );
    }

    #[test]
    fn genres_are_distinct_and_sorted() {
        let catalog = service();
        seed_anime(&catalog, "A", &["Fantasy", "Adventure"]);
        seed_anime(&catalog, "B", &["adventure", "Drama"]);
        assert_eq!(
            catalog.genres().unwrap(),
            vec!["Adventure", "Drama", "Fantasy"]
        );
    }

    #[test]
    fn delete_missing_is_not_found() {
        let catalog = service();
        assert_matches!(
            catalog.delete_anime(AnimeId::new(1)),
            Err(Error::NotFound { .. })
        );
    }
}
