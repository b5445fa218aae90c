//! Batch episode ingestion.
//!
//! Episodes can be bulk-loaded either as a JSON list or by pasting the
//! `<option>` list of a player's server dropdown, e.g.
//!
//! ```text
//! <option value="https://cdn.example.com/ep1.mp4">Episode 1</option>
//! <option value="https://cdn.example.com/ep2.mp4">Episode 2</option>
//! ```
//!
//! Each option becomes one server entry on the episode numbered by the first
//! integer in its label.

use std::sync::OnceLock;

use anistream_common::{AnimeId, Episode, Error, Result, VideoServer};
use anistream_store::Collection;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::episodes::{validate_number, validate_servers};
use super::{CatalogService, NewEpisode};

/// Input accepted by [`CatalogService::ingest_episodes`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpisodeBatch {
    /// HTML `<option>` elements that all belong to one server.
    Html {
        html: String,
        server_name: String,
        /// Number given to the first option whose label has no number.
        #[serde(default = "default_start_number")]
        start_number: u32,
    },
    /// Episodes with their servers.
    Episodes(Vec<NewEpisode>),
}

fn default_start_number() -> u32 {
    1
}

/// Outcome counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// One `<option>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub value: String,
    pub label: String,
}

fn option_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<option\b[^>]*?\svalue\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>(.*?)</option\s*>"#)
            .unwrap_or_else(|e| unreachable!("option pattern is valid: {e}"))
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<[^>]*>").unwrap_or_else(|e| unreachable!("tag pattern is valid: {e}"))
    })
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+").unwrap_or_else(|e| unreachable!("number pattern is valid: {e}"))
    })
}

/// Extract `<option value="...">label</option>` pairs in document order.
///
/// Values and labels are trimmed and basic entities are decoded; inner tags
/// in labels are stripped. Options with an empty value are kept so callers
/// can count them.
pub fn parse_option_list(html: &str) -> Vec<OptionEntry> {
    option_regex()
        .captures_iter(html)
        .map(|caps| {
            let value = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            let label = caps.get(3).map_or("", |m| m.as_str());
            let label = tag_regex().replace_all(label, "");
            OptionEntry {
                value: decode_entities(value.trim()),
                label: decode_entities(label.trim()),
            }
        })
        .collect()
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// First integer in a label, e.g. `12` for "Episode 12 - Finale".
fn label_number(label: &str) -> Option<u32> {
    number_regex()
        .find(label)
        .and_then(|m| m.as_str().parse().ok())
}

impl CatalogService {
    /// Merge a batch into an anime's episodes.
    ///
    /// Existing episodes get the batch's servers added or replaced by name;
    /// new numbers become new episodes. Entries without a usable source or
    /// number are skipped. The whole batch is written at once.
    pub fn ingest_episodes(&self, anime_id: AnimeId, batch: EpisodeBatch) -> Result<IngestReport> {
        self.require_anime(anime_id)?;

        let mut skipped = 0;
        let items: Vec<(u32, Option<String>, Vec<VideoServer>)> = match batch {
            EpisodeBatch::Html {
                html,
                server_name,
                start_number,
            } => {
                let server_name = server_name.trim().to_string();
                if server_name.is_empty() {
                    return Err(Error::validation("server_name must not be empty"));
                }

                let options = parse_option_list(&html);
                if options.is_empty() {
                    return Err(Error::validation("no <option> elements found"));
                }

                let mut next = start_number;
                let mut items = Vec::with_capacity(options.len());
                for option in options {
                    if option.value.is_empty() {
                        skipped += 1;
                        continue;
                    }
                    let number = label_number(&option.label).unwrap_or(next);
                    next = next.saturating_add(1);
                    if number == 0 {
                        skipped += 1;
                        continue;
                    }
                    let server = VideoServer {
                        name: server_name.clone(),
                        source: option.value,
                    };
                    items.push((number, None, vec![server]));
                }
                items
            }
            EpisodeBatch::Episodes(episodes) => {
                let mut items = Vec::with_capacity(episodes.len());
                for episode in episodes {
                    let servers: Vec<VideoServer> = episode
                        .servers
                        .into_iter()
                        .filter(|s| !s.source.trim().is_empty())
                        .collect();
                    if validate_number(episode.number).is_err() || servers.is_empty() {
                        skipped += 1;
                        continue;
                    }
                    match validate_servers(servers) {
                        Ok(servers) => items.push((episode.number, episode.title, servers)),
                        Err(e) => {
                            tracing::debug!(number = episode.number, "Skipping batch entry: {e}");
                            skipped += 1;
                        }
                    }
                }
                items
            }
        };

        let mut report = self
            .store
            .update(&Collection::Episodes(anime_id), |episodes: &mut Vec<Episode>| {
                let mut report = IngestReport::default();
                for (number, title, servers) in items {
                    match episodes.iter_mut().find(|e| e.number == number) {
                        Some(existing) => {
                            for server in servers {
                                existing.upsert_server(server);
                            }
                            if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
                                existing.title = Some(title.trim().to_string());
                            }
                            report.updated += 1;
                        }
                        None => {
                            let mut episode = Episode::new(number);
                            episode.title = title
                                .map(|t| t.trim().to_string())
                                .filter(|t| !t.is_empty());
                            for server in servers {
                                episode.upsert_server(server);
                            }
                            episodes.push(episode);
                            report.created += 1;
                        }
                    }
                }
                episodes.sort_by_key(|e| e.number);
                Ok(report)
            })?;
        report.skipped = skipped;

        tracing::info!(
            %anime_id,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "Episode batch ingested"
        );
        Ok(report)
    }
}
