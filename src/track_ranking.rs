use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::kart_record::rate_u64;
use crate::state::Revision;
use crate::time_format::de_record_ms;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub best_rider: String,
    #[serde(default, deserialize_with = "de_record_ms")]
    pub best_record: Option<u64>,
    #[serde(default, deserialize_with = "de_record_ms")]
    pub average_record: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPage {
    #[serde(default)]
    pub tracks: Vec<TrackDetail>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Count,
    BestRider,
    BestRecord,
    AverageRecord,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Name,
        SortField::Count,
        SortField::BestRider,
        SortField::BestRecord,
        SortField::AverageRecord,
    ];

    pub fn next(self) -> Self {
        match self {
            SortField::Name => SortField::Count,
            SortField::Count => SortField::BestRider,
            SortField::BestRider => SortField::BestRecord,
            SortField::BestRecord => SortField::AverageRecord,
            SortField::AverageRecord => SortField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSeq {
    Asc,
    Desc,
}

impl SortSeq {
    pub fn flipped(self) -> Self {
        match self {
            SortSeq::Asc => SortSeq::Desc,
            SortSeq::Desc => SortSeq::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub standard: SortField,
    pub seq: SortSeq,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            standard: SortField::Count,
            seq: SortSeq::Desc,
        }
    }
}

/// Case-sensitive substring match on track name or best rider. Empty text matches everything.
pub fn matches_filter(track: &TrackDetail, text: &str) -> bool {
    text.is_empty() || track.best_rider.contains(text) || track.name.contains(text)
}

pub fn compare_by(a: &TrackDetail, b: &TrackDetail, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Count => a.count.cmp(&b.count),
        SortField::BestRider => a.best_rider.cmp(&b.best_rider),
        SortField::BestRecord => a.best_record.cmp(&b.best_record),
        SortField::AverageRecord => a.average_record.cmp(&b.average_record),
    }
}

/// Indices into `tracks` of the rows to show, in display order.
///
/// `sort_by` is stable and `Desc` only reverses the key comparison, so equal
/// keys keep their input order in both directions.
pub fn derive_visible(tracks: &[TrackDetail], filter: &str, sort: SortSpec) -> Vec<usize> {
    let mut indices: Vec<usize> = tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| matches_filter(t, filter))
        .map(|(idx, _)| idx)
        .collect();
    indices.sort_by(|a, b| {
        let ord = compare_by(&tracks[*a], &tracks[*b], sort.standard);
        match sort.seq {
            SortSeq::Asc => ord,
            SortSeq::Desc => ord.reverse(),
        }
    });
    indices
}

/// Searchable, sortable track ranking for one game mode.
#[derive(Debug, Clone, Default)]
pub struct RankedTable {
    page: TrackPage,
    revision: Option<Revision>,
    filter: String,
    sort: SortSpec,
    visible: Vec<usize>,
    selected: usize,
}

impl RankedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, page: TrackPage, revision: Revision) {
        if self.revision != Some(revision) {
            self.selected = 0;
        }
        self.page = page;
        self.revision = Some(revision);
        self.recompute();
    }

    pub fn clear(&mut self) {
        self.page = TrackPage::default();
        self.revision = None;
        self.selected = 0;
        self.recompute();
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.recompute();
    }

    pub fn set_sort(&mut self, standard: SortField, seq: SortSeq) {
        self.sort = SortSpec { standard, seq };
        self.recompute();
    }

    /// Column-header click: same column flips direction, a new column starts descending.
    pub fn toggle_sort(&mut self, standard: SortField) {
        let seq = if self.sort.standard == standard {
            self.sort.seq.flipped()
        } else {
            SortSeq::Desc
        };
        self.set_sort(standard, seq);
    }

    fn recompute(&mut self) {
        self.visible = derive_visible(&self.page.tracks, &self.filter, self.sort);
        self.clamp_selection();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn total_count(&self) -> u64 {
        self.page.total_count
    }

    pub fn tracks(&self) -> &[TrackDetail] {
        &self.page.tracks
    }

    pub fn has_data(&self) -> bool {
        self.revision.is_some()
    }

    pub fn visible(&self) -> impl Iterator<Item = &TrackDetail> + '_ {
        self.visible.iter().filter_map(|idx| self.page.tracks.get(*idx))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Share of all recorded races played on this track.
    pub fn pick_rate(&self, track: &TrackDetail) -> Option<u32> {
        rate_u64(track.count, self.page.total_count)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&TrackDetail> {
        self.visible
            .get(self.selected)
            .and_then(|idx| self.page.tracks.get(*idx))
    }

    pub fn select_next(&mut self) {
        let total = self.visible.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.visible.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn clamp_selection(&mut self) {
        let total = self.visible.len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }
}

pub fn sort_field_label(field: SortField) -> &'static str {
    match field {
        SortField::Name => "Track",
        SortField::Count => "Races",
        SortField::BestRider => "Best Rider",
        SortField::BestRecord => "Best",
        SortField::AverageRecord => "Average",
    }
}

pub fn sort_seq_label(seq: SortSeq) -> &'static str {
    match seq {
        SortSeq::Asc => "ASC",
        SortSeq::Desc => "DESC",
    }
}
