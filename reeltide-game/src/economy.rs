//! Pure pricing and production math. Everything here takes borrowed data
//! and returns a number; the session decides what to do with it.

use crate::catalog::{Building, Catalog, UpgradeKind};
use crate::numbers;
use crate::state::GameState;

/// Price of the next copy of `building` when `owned` copies are already
/// held: `floor(base_cost * cost_scale^owned)`. Saturates at `u64::MAX`
/// once the product leaves the f64 range.
#[must_use]
pub fn building_cost(building: &Building, owned: u32) -> u64 {
    let scaled = building.base_cost * building.cost_scale.powf(f64::from(owned));
    numbers::floor_f64_to_u64(scaled)
}

/// Fish granted by one manual reel-in. Click multipliers apply in catalog
/// order and the result is floored once, at the end.
#[must_use]
pub fn fish_per_click(catalog: &Catalog, state: &GameState) -> u32 {
    let mut amount = state.fish_per_click_base;
    for upgrade in catalog.upgrades() {
        if upgrade.kind == UpgradeKind::FpcMultiplier && state.has_upgrade(&upgrade.id) {
            amount *= upgrade.effect;
        }
    }
    numbers::floor_f64_to_u32(amount)
}

/// Passive fish per second: each building contributes `count * fps_effect`,
/// then production multipliers scale the sum by `1 + effect` in catalog
/// order. Never floored.
#[must_use]
pub fn fish_per_second(catalog: &Catalog, state: &GameState) -> f64 {
    let mut rate = 0.0;
    for building in catalog.buildings() {
        let owned = state.building_count(&building.id);
        if owned > 0 {
            rate += f64::from(owned) * building.fps_effect;
        }
    }
    for upgrade in catalog.upgrades() {
        if upgrade.kind == UpgradeKind::FpsMultiplier && state.has_upgrade(&upgrade.id) {
            rate *= 1.0 + upgrade.effect;
        }
    }
    rate
}
