//! Persistent game state and the helpers that keep its invariants.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Baseline fish granted per manual catch before upgrades apply.
pub const DEFAULT_FISH_PER_CLICK: f64 = 1.0;

fn default_fish_per_click() -> f64 {
    DEFAULT_FISH_PER_CLICK
}

/// Lifetime counters shown on the stats panel. Fish and money totals are
/// fractional because passive income accrues un-floored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub total_fish_caught: f64,
    #[serde(default)]
    pub total_money_earned: f64,
    #[serde(default)]
    pub total_clicks: u64,
}

impl Stats {
    /// Force the float counters back to finite, non-negative values.
    pub fn clamp(&mut self) {
        if !self.total_fish_caught.is_finite() || self.total_fish_caught < 0.0 {
            self.total_fish_caught = 0.0;
        }
        if !self.total_money_earned.is_finite() || self.total_money_earned < 0.0 {
            self.total_money_earned = 0.0;
        }
    }
}

/// The complete save-file state. [`GameSession`](crate::GameSession) is its
/// only writer during play; everything else borrows it read-only.
///
/// Every field carries a serde default so that blobs written by older
/// builds deserialize, with new fields filled from the fresh-game values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub money: f64,
    /// Fish counts keyed by catalog name. Counts are fractional; passive
    /// income deposits un-floored amounts.
    #[serde(default)]
    pub inventory: BTreeMap<String, f64>,
    /// Owned building counts keyed by catalog id.
    #[serde(default)]
    pub buildings: BTreeMap<String, u32>,
    /// Purchased upgrade ids, stored on the wire as `{ "<id>": true }`.
    #[serde(default, with = "purchased_map")]
    pub upgrades: BTreeSet<String>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default = "default_fish_per_click")]
    pub fish_per_click_base: f64,
    /// Cached production rate; the session refreshes it after every change
    /// that can affect it.
    #[serde(default)]
    pub fish_per_second: f64,
    #[serde(default)]
    pub is_line_cast: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            money: 0.0,
            inventory: BTreeMap::new(),
            buildings: BTreeMap::new(),
            upgrades: BTreeSet::new(),
            stats: Stats::default(),
            fish_per_click_base: DEFAULT_FISH_PER_CLICK,
            fish_per_second: 0.0,
            is_line_cast: false,
        }
    }
}

impl GameState {
    #[must_use]
    pub fn fish_count(&self, name: &str) -> f64 {
        self.inventory.get(name).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn building_count(&self, id: &str) -> u32 {
        self.buildings.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has_upgrade(&self, id: &str) -> bool {
        self.upgrades.contains(id)
    }

    /// Add fish to the inventory. Non-positive and non-finite amounts are
    /// ignored, so zero-count entries never appear.
    pub fn add_fish(&mut self, name: &str, amount: f64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        *self.inventory.entry(name.to_string()).or_insert(0.0) += amount;
    }

    /// Remove fish, dropping the entry when it reaches zero. Returns false
    /// and changes nothing when fewer than `amount` are held.
    pub fn remove_fish(&mut self, name: &str, amount: f64) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        let count = match self.inventory.get_mut(name) {
            Some(count) if *count >= amount => count,
            _ => return false,
        };
        *count -= amount;
        if *count <= 0.0 {
            self.inventory.remove(name);
        }
        true
    }

    /// Repair a deserialized state against `catalog`: drop entries the
    /// catalog does not know, remove degenerate counts, and clamp the money
    /// and lifetime counters. The production cache is left for the session
    /// to refresh.
    pub fn sanitize(&mut self, catalog: &Catalog) {
        if !self.money.is_finite() || self.money < 0.0 {
            self.money = 0.0;
        }
        if !self.fish_per_click_base.is_finite() || self.fish_per_click_base < 0.0 {
            self.fish_per_click_base = DEFAULT_FISH_PER_CLICK;
        }
        self.stats.clamp();

        let before = self.inventory.len();
        self.inventory
            .retain(|name, count| catalog.fish_by_name(name).is_some() && count.is_finite() && *count > 0.0);
        if self.inventory.len() < before {
            log::warn!("dropped {} stale inventory entries", before - self.inventory.len());
        }

        let before = self.buildings.len();
        self.buildings
            .retain(|id, count| catalog.building(id).is_some() && *count > 0);
        if self.buildings.len() < before {
            log::warn!("dropped {} stale building entries", before - self.buildings.len());
        }

        let before = self.upgrades.len();
        self.upgrades.retain(|id| catalog.upgrade(id).is_some());
        if self.upgrades.len() < before {
            log::warn!("dropped {} stale upgrade entries", before - self.upgrades.len());
        }
    }
}

/// Serde codec storing the upgrade set as a `{ "<id>": true }` map, the
/// shape save blobs have always used.
mod purchased_map {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(set.len()))?;
        for id in set {
            map.serialize_entry(id, &true)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<String, bool>::deserialize(deserializer)?;
        Ok(map
            .into_iter()
            .filter_map(|(id, purchased)| purchased.then_some(id))
            .collect())
    }
}
