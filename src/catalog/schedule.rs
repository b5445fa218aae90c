//! Weekly airing schedule.

use anistream_common::{hhmm, AnimeId, Error, Result, ScheduleEntry, ScheduleId, Weekday};
use anistream_store::Collection;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::CatalogService;

/// Request body for a new schedule entry. `time` is `HH:MM`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewScheduleEntry {
    pub anime_id: AnimeId,
    pub day: Weekday,
    pub time: String,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleEntryPatch {
    pub anime_id: Option<AnimeId>,
    pub day: Option<Weekday>,
    pub time: Option<String>,
    pub episode: Option<u32>,
    pub note: Option<String>,
}

/// One day of the weekly view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyDay {
    pub day: Weekday,
    pub entries: Vec<ScheduleEntry>,
}

impl CatalogService {
    /// Schedule entries ordered by day then time, optionally for one day.
    pub fn list_schedule(&self, day: Option<Weekday>) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = self.store.load(&Collection::Schedule)?;
        if let Some(day) = day {
            entries.retain(|e| e.day == day);
        }
        entries.sort_by_key(|e| (e.day, e.time, e.id));
        Ok(entries)
    }

    /// All seven days, Monday first, each with its entries in time order.
    pub fn weekly_schedule(&self) -> Result<Vec<WeeklyDay>> {
        let entries = self.list_schedule(None)?;
        Ok(Weekday::ALL
            .into_iter()
            .map(|day| WeeklyDay {
                day,
                entries: entries.iter().filter(|e| e.day == day).cloned().collect(),
            })
            .collect())
    }

    pub fn create_schedule_entry(&self, new: NewScheduleEntry) -> Result<ScheduleEntry> {
        self.require_anime(new.anime_id)?;
        let time = parse_time(&new.time)?;

        let entry = self
            .store
            .update(&Collection::Schedule, |entries: &mut Vec<ScheduleEntry>| {
                let id = entries
                    .iter()
                    .map(|e| e.id)
                    .max()
                    .map_or(ScheduleId::new(1), ScheduleId::next);
                let entry = ScheduleEntry {
                    id,
                    anime_id: new.anime_id,
                    day: new.day,
                    time,
                    episode: new.episode,
                    note: clean_note(new.note),
                };
                entries.push(entry.clone());
                Ok(entry)
            })?;

        tracing::debug!(id = %entry.id, anime_id = %entry.anime_id, day = %entry.day, "Schedule entry created");
        Ok(entry)
    }

    pub fn update_schedule_entry(
        &self,
        id: ScheduleId,
        patch: ScheduleEntryPatch,
    ) -> Result<ScheduleEntry> {
        if let Some(anime_id) = patch.anime_id {
            self.require_anime(anime_id)?;
        }
        let time = patch.time.as_deref().map(parse_time).transpose()?;

        self.store
            .update(&Collection::Schedule, |entries: &mut Vec<ScheduleEntry>| {
                let entry = entries
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| Error::not_found("schedule entry", id))?;

                if let Some(anime_id) = patch.anime_id {
                    entry.anime_id = anime_id;
                }
                if let Some(day) = patch.day {
                    entry.day = day;
                }
                if let Some(time) = time {
                    entry.time = time;
                }
                if let Some(episode) = patch.episode {
                    entry.episode = Some(episode);
                }
                if let Some(note) = patch.note {
                    entry.note = clean_note(Some(note));
                }
                Ok(entry.clone())
            })
    }

    pub fn delete_schedule_entry(&self, id: ScheduleId) -> Result<()> {
        self.store
            .update(&Collection::Schedule, |entries: &mut Vec<ScheduleEntry>| {
                let before = entries.len();
                entries.retain(|e| e.id != id);
                if entries.len() == before {
                    return Err(Error::not_found("schedule entry", id));
                }
                Ok(())
            })
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    hhmm::parse(raw).map_err(|_| Error::validation(format!("invalid time {raw:?}, expected HH:MM")))
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
