//! Two-layer schedule resolution.
//!
//! A day's schedule for one staff member is made of contract-layer entries
//! (derived from the standing contract, read-only) and adjustment-layer entries
//! (user edits). Entries may overlap; the returned order is the paint order, so the
//! last entry covering a time slot is the one that shows.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::models::contract::Contract;
use crate::models::schedule::{Holiday, ScheduleEntry, ScheduleLayer, UnifiedEntry, status};
use crate::timeline::parse_hour_range;

/// Dates on which contract-layer entries are suppressed.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    days: BTreeMap<NaiveDate, String>,
}

impl HolidayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = Holiday>) -> Self {
        Self {
            days: holidays.into_iter().map(|h| (h.date, h.name)).collect(),
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn name_of(&self, date: NaiveDate) -> Option<&str> {
        self.days.get(&date).map(String::as_str)
    }
}

/// Builds the contract-layer entry for `date`, if the contract has working hours that day.
pub fn contract_entries(contract: &Contract, date: NaiveDate) -> Vec<ScheduleEntry> {
    let Some(hours) = contract.hours_for(date.weekday()) else {
        return Vec::new();
    };
    let Some((start, end)) = parse_hour_range(hours) else {
        return Vec::new();
    };

    vec![ScheduleEntry {
        id: Uuid::from_u64_pair(
            contract.staff_id as u64,
            date.num_days_from_ce() as u64,
        ),
        staff_id: contract.staff_id,
        date,
        status: status::ONLINE.to_string(),
        start,
        end,
        memo: None,
        layer: ScheduleLayer::Contract,
        import_batch_id: None,
        approved_at: None,
        created_at: contract.updated_at,
        updated_at: contract.updated_at,
    }]
}

/// Orders one staff member's entries for one day.
///
/// Contract entries are dropped on holidays. The rest are sorted contract first,
/// then adjustments by `updated_at` ascending so the latest edit paints last.
pub fn resolve_day(
    entries: Vec<ScheduleEntry>,
    date: NaiveDate,
    calendar: &HolidayCalendar,
) -> Vec<ScheduleEntry> {
    let holiday = calendar.is_holiday(date);
    let mut visible: Vec<ScheduleEntry> = entries
        .into_iter()
        .filter(|e| !(holiday && e.layer == ScheduleLayer::Contract))
        .collect();
    sort_by_layer(&mut visible);
    visible
}

/// Like [`resolve_day`], but suppressed contract entries are kept and flagged
/// `masked` when `include_masking` is set.
pub fn resolve_unified(
    entries: Vec<ScheduleEntry>,
    date: NaiveDate,
    calendar: &HolidayCalendar,
    include_masking: bool,
) -> Vec<UnifiedEntry> {
    if !include_masking {
        return resolve_day(entries, date, calendar)
            .into_iter()
            .map(|entry| UnifiedEntry { entry, masked: false })
            .collect();
    }

    let holiday = calendar.is_holiday(date);
    let mut all = entries;
    sort_by_layer(&mut all);
    all.into_iter()
        .map(|entry| {
            let masked = holiday && entry.layer == ScheduleLayer::Contract;
            UnifiedEntry { entry, masked }
        })
        .collect()
}

/// Stable sort: layer priority, then `updated_at` inside the adjustment layer.
fn sort_by_layer(entries: &mut [ScheduleEntry]) {
    entries.sort_by(|a, b| {
        a.layer.priority().cmp(&b.layer.priority()).then_with(|| {
            if a.layer == ScheduleLayer::Adjustment && b.layer == ScheduleLayer::Adjustment {
                a.updated_at.cmp(&b.updated_at)
            } else {
                std::cmp::Ordering::Equal
            }
        })
    });
}

/// Groups entries by staff id and resolves each group for `date`.
pub fn resolve_grid(
    entries: Vec<ScheduleEntry>,
    date: NaiveDate,
    calendar: &HolidayCalendar,
) -> Vec<ScheduleEntry> {
    let mut by_staff: BTreeMap<i32, Vec<ScheduleEntry>> = BTreeMap::new();
    for entry in entries.into_iter().filter(|e| e.date == date) {
        by_staff.entry(entry.staff_id).or_default().push(entry);
    }
    by_staff
        .into_values()
        .flat_map(|group| resolve_day(group, date, calendar))
        .collect()
}
