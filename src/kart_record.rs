use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::state::Revision;
use crate::time_format::{de_record_ms, format_record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kart {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub win_count: u32,
    #[serde(default)]
    pub retire_count: u32,
    /// Best record per track driven with this kart, in API order.
    #[serde(default)]
    pub map: Vec<RecordItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordItem {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Elapsed time in milliseconds.
    #[serde(default, deserialize_with = "de_record_ms")]
    pub record: Option<u64>,
}

impl Kart {
    pub fn win_rate(&self) -> Option<u32> {
        rate(self.win_count, self.count)
    }

    pub fn retire_rate(&self) -> Option<u32> {
        rate(self.retire_count, self.count)
    }
}

/// `round(part / total * 100)`, or `None` when there is nothing to divide by.
pub fn rate(part: u32, total: u32) -> Option<u32> {
    rate_u64(part as u64, total as u64)
}

pub fn rate_u64(part: u64, total: u64) -> Option<u32> {
    if total == 0 {
        return None;
    }
    let pct = (part as f64 / total as f64 * 100.0).round();
    Some(pct.clamp(0.0, u32::MAX as f64) as u32)
}

/// One line of the kart roll-up table.
#[derive(Debug, Clone, Copy)]
pub struct KartRow<'a> {
    pub kart: &'a Kart,
    pub win_rate: Option<u32>,
    pub retire_rate: Option<u32>,
    pub selected: bool,
}

/// Single-choice selection over the player's karts.
///
/// The selection is positional and resets to the first kart whenever the
/// list is replaced by one with different content. A reorder across fetches
/// therefore lands on index 0 instead of following the previously selected
/// kart id.
#[derive(Debug, Clone, Default)]
pub struct RecordSelector {
    karts: Vec<Kart>,
    revision: Option<Revision>,
    selected: usize,
}

impl RecordSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a freshly fetched list. Returns `true` if the selection was reset.
    pub fn replace(&mut self, karts: Vec<Kart>, revision: Revision) -> bool {
        let changed = self.revision != Some(revision);
        self.karts = karts;
        self.revision = Some(revision);
        if changed {
            self.selected = 0;
        } else {
            self.clamp_selection();
        }
        changed
    }

    pub fn clear(&mut self) {
        self.karts.clear();
        self.revision = None;
        self.selected = 0;
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.karts.len() {
            bail!(
                "kart index {index} out of range ({} karts)",
                self.karts.len()
            );
        }
        self.selected = index;
        Ok(())
    }

    pub fn select_next(&mut self) {
        let total = self.karts.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.karts.len();
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
        let total = self.karts.len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn karts(&self) -> &[Kart] {
        &self.karts
    }

    pub fn is_empty(&self) -> bool {
        self.karts.is_empty()
    }

    pub fn revision(&self) -> Option<Revision> {
        self.revision
    }

    /// `None` when there are no karts. Callers render a placeholder instead.
    pub fn selected_index(&self) -> Option<usize> {
        (!self.karts.is_empty()).then_some(self.selected)
    }

    pub fn selected(&self) -> Option<&Kart> {
        self.karts.get(self.selected)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected().map(|k| k.id.as_str())
    }

    /// Track name and formatted record for the selected kart.
    pub fn nested_records(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.selected()
            .into_iter()
            .flat_map(|kart| kart.map.iter())
            .map(|item| (item.name.as_str(), format_record(item.record)))
    }

    pub fn rows(&self) -> Vec<KartRow<'_>> {
        self.karts
            .iter()
            .enumerate()
            .map(|(idx, kart)| KartRow {
                kart,
                win_rate: kart.win_rate(),
                retire_rate: kart.retire_rate(),
                selected: idx == self.selected,
            })
            .collect()
    }
}
