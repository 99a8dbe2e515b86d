//! Preset catalogue and duplicate suppression for preset application.

use crate::contrast::{select_text_color, status_color};
use crate::models::preset::{Preset, PresetEntry, PresetView};
use crate::models::schedule::{ScheduleEntry, status};

impl Preset {
    /// The segment whose status decides the preset's display color.
    pub fn representative(&self) -> Option<&PresetEntry> {
        self.entries
            .get(self.representative_index)
            .or_else(|| self.entries.first())
    }

    pub fn view(&self) -> PresetView {
        let background = self
            .representative()
            .map(|entry| status_color(&entry.status))
            .unwrap_or(status_color(status::ONLINE));
        PresetView {
            preset: self.clone(),
            background_color: background.to_string(),
            text_color: select_text_color(background),
        }
    }
}

fn segment(status: &str, start_time: f64, end_time: f64) -> PresetEntry {
    PresetEntry {
        status: status.to_string(),
        start_time,
        end_time,
        memo: None,
    }
}

fn preset(id: &str, name: &str, entries: Vec<PresetEntry>, representative_index: usize) -> Preset {
    Preset {
        id: id.to_string(),
        name: name.to_string(),
        entries,
        representative_index,
    }
}

/// Built-in presets offered on the monthly planner.
pub fn default_presets() -> Vec<Preset> {
    vec![
        preset("full-day-online", "Online 9-18", vec![segment(status::ONLINE, 9.0, 18.0)], 0),
        preset("full-day-remote", "Remote 9-18", vec![segment(status::REMOTE, 9.0, 18.0)], 0),
        preset(
            "online-with-lunch",
            "Online 9-18 with lunch",
            vec![
                segment(status::ONLINE, 9.0, 12.0),
                segment(status::BREAK, 12.0, 13.0),
                segment(status::ONLINE, 13.0, 18.0),
            ],
            0,
        ),
        preset("morning-online", "Morning online", vec![segment(status::ONLINE, 9.0, 13.0)], 0),
        preset(
            "afternoon-online",
            "Afternoon online",
            vec![segment(status::ONLINE, 13.0, 18.0)],
            0,
        ),
        preset("late-shift", "Late shift 12-21", vec![segment(status::ONLINE, 12.0, 21.0)], 0),
        preset("training-day", "Training", vec![segment(status::TRAINING, 9.0, 18.0)], 0),
        preset("day-off", "Day off", vec![segment(status::OFF, 9.0, 18.0)], 0),
        preset("night-duty", "Night duty", vec![segment(status::NIGHT_DUTY, 17.0, 21.0)], 0),
    ]
}

pub fn find_preset<'a>(presets: &'a [Preset], id: &str) -> Option<&'a Preset> {
    presets.iter().find(|p| p.id == id)
}

/// True when `candidate` has the same times, status and memo as `existing`.
/// A missing memo equals an empty one.
pub fn is_exact_duplicate(candidate: &PresetEntry, existing: &ScheduleEntry) -> bool {
    candidate.start_time == existing.start
        && candidate.end_time == existing.end
        && candidate.status == existing.status
        && candidate.memo_text() == existing.memo_text()
}

/// Drops the preset segments that would recreate an entry already on the day.
///
/// For each segment the overlapping entry with the highest layer priority is
/// picked (first found wins a tie). The segment is dropped only if it matches that
/// entry exactly; any other overlap is kept and stacks on top.
pub fn filter_duplicate_entries(
    entries: &[PresetEntry],
    existing: &[ScheduleEntry],
) -> Vec<PresetEntry> {
    entries
        .iter()
        .filter(|candidate| {
            let top = existing
                .iter()
                .filter(|e| e.overlaps(candidate.start_time, candidate.end_time))
                .fold(None::<&ScheduleEntry>, |best, e| match best {
                    Some(b) if b.layer.priority() >= e.layer.priority() => Some(b),
                    _ => Some(e),
                });
            match top {
                Some(top) => !is_exact_duplicate(candidate, top),
                None => true,
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representative_falls_back_to_first_segment() {
        let mut p = default_presets().remove(2);
        p.representative_index = 10;
        assert_eq!(p.representative().map(|e| e.status.as_str()), Some(status::ONLINE));
    }

    #[test]
    fn catalogue_ids_are_unique() {
        let presets = default_presets();
        for p in &presets {
            assert_eq!(presets.iter().filter(|o| o.id == p.id).count(), 1);
            assert!(find_preset(&presets, &p.id).is_some());
        }
    }
}
