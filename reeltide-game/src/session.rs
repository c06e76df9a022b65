//! The progression controller: every state change flows through here.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::economy;
use crate::event::GameEvent;
use crate::numbers;
use crate::rewards;
use crate::save::{self, SaveError, SaveStore};
use crate::state::{GameState, Stats};

/// Recoverable gameplay failures. The `Display` strings are the
/// player-facing alert texts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayError {
    #[error("Not enough money!")]
    InsufficientFunds { cost: f64, balance: f64 },
    #[error("Already purchased!")]
    AlreadyPurchased { id: String },
    #[error("Inventory is empty!")]
    EmptyInventory,
    #[error("unknown catalog id '{id}'")]
    UnknownItem { id: String },
}

/// A running game: catalog, state, RNG, and the save store.
///
/// The session is the only writer of its [`GameState`]; hosts call the
/// operations below and render the returned [`GameEvent`]s. Cast/reel
/// misuse and short sells are silent no-ops (`None`), matching how the
/// game has always shrugged them off. Everything is single-threaded by
/// contract; a host that shares a session across threads must wrap the
/// whole thing in a mutex.
pub struct GameSession<S: SaveStore> {
    catalog: Catalog,
    state: GameState,
    rng: ChaCha20Rng,
    store: S,
}

impl<S: SaveStore> GameSession<S> {
    /// Start a fresh session.
    ///
    /// # Errors
    ///
    /// Rejects an invalid catalog before any play can happen.
    pub fn new(catalog: Catalog, store: S, seed: u64) -> Result<Self, CatalogError> {
        catalog.validate()?;
        Ok(Self {
            catalog,
            state: GameState::default(),
            rng: ChaCha20Rng::seed_from_u64(seed),
            store,
        })
    }

    /// Cast the line. `None` when it is already out.
    pub fn cast_line(&mut self) -> Option<GameEvent> {
        if self.state.is_line_cast {
            return None;
        }
        self.state.is_line_cast = true;
        self.state.stats.total_clicks += 1;
        Some(GameEvent::LineCast)
    }

    /// Reel in a cast line, landing a weighted random catch. `None` when
    /// the line is not out.
    pub fn reel_in(&mut self) -> Option<GameEvent> {
        if !self.state.is_line_cast {
            return None;
        }
        self.state.is_line_cast = false;
        self.state.stats.total_clicks += 1;

        let (name, icon, rarity) = match rewards::draw_catch(&self.catalog, &mut self.rng) {
            Ok(fish) => (fish.name.clone(), fish.icon.clone(), fish.rarity),
            Err(err) => {
                log::error!("catch aborted: {err}");
                return None;
            }
        };
        let amount = economy::fish_per_click(&self.catalog, &self.state);
        self.state.add_fish(&name, f64::from(amount));
        self.state.stats.total_fish_caught += f64::from(amount);
        Some(GameEvent::FishCaught {
            name,
            icon,
            rarity,
            amount,
        })
    }

    /// Advance one scheduler interval: refresh the production cache,
    /// deposit passive income into the cheapest Common fish, and autosave.
    /// The host owns the clock and calls this once per second.
    pub fn tick(&mut self) -> Option<GameEvent> {
        let rate = economy::fish_per_second(&self.catalog, &self.state);
        self.state.fish_per_second = rate;

        let mut event = None;
        if rate > 0.0 {
            if let Some(fish) = self.catalog.passive_fish() {
                let name = fish.name.clone();
                let icon = fish.icon.clone();
                self.state.add_fish(&name, rate);
                self.state.stats.total_fish_caught += rate;
                event = Some(GameEvent::PassiveIncome {
                    name,
                    icon,
                    amount: rate,
                });
            }
        }

        // Autosave is fire-and-forget; a broken store must not stop play.
        if let Err(err) = save::save_state(&self.store, &self.state) {
            log::warn!("autosave failed: {err}");
        }
        event
    }

    /// Buy the next copy of a building at its scaled price.
    ///
    /// # Errors
    ///
    /// [`PlayError::UnknownItem`] for an id the catalog lacks,
    /// [`PlayError::InsufficientFunds`] when the balance cannot cover the
    /// cost. State is untouched on error.
    pub fn buy_building(&mut self, id: &str) -> Result<GameEvent, PlayError> {
        let building = self
            .catalog
            .building(id)
            .ok_or_else(|| PlayError::UnknownItem { id: id.to_string() })?;
        let owned = self.state.building_count(id);
        let cost = economy::building_cost(building, owned);
        let price = numbers::u64_to_f64(cost);
        if self.state.money < price {
            return Err(PlayError::InsufficientFunds {
                cost: price,
                balance: self.state.money,
            });
        }
        let name = building.name.clone();
        self.state.money -= price;
        let owned = owned + 1;
        self.state.buildings.insert(id.to_string(), owned);
        self.refresh_production();
        Ok(GameEvent::BuildingPurchased {
            id: id.to_string(),
            name,
            cost,
            owned,
        })
    }

    /// Buy a one-shot upgrade.
    ///
    /// # Errors
    ///
    /// [`PlayError::UnknownItem`], [`PlayError::AlreadyPurchased`], or
    /// [`PlayError::InsufficientFunds`]. State is untouched on error.
    pub fn buy_upgrade(&mut self, id: &str) -> Result<GameEvent, PlayError> {
        let upgrade = self
            .catalog
            .upgrade(id)
            .ok_or_else(|| PlayError::UnknownItem { id: id.to_string() })?;
        if self.state.has_upgrade(id) {
            return Err(PlayError::AlreadyPurchased { id: id.to_string() });
        }
        if self.state.money < upgrade.cost {
            return Err(PlayError::InsufficientFunds {
                cost: upgrade.cost,
                balance: self.state.money,
            });
        }
        let name = upgrade.name.clone();
        let cost = upgrade.cost;
        self.state.money -= cost;
        self.state.upgrades.insert(id.to_string());
        self.refresh_production();
        Ok(GameEvent::UpgradePurchased {
            id: id.to_string(),
            name,
            cost,
        })
    }

    /// Sell `amount` of one species at its base value. `None` (and no
    /// state change) for unknown names, non-positive amounts, or when
    /// fewer than `amount` are held.
    pub fn sell_fish(&mut self, name: &str, amount: f64) -> Option<GameEvent> {
        let fish = self.catalog.fish_by_name(name)?;
        let value = fish.base_value;
        if !self.state.remove_fish(name, amount) {
            return None;
        }
        let earnings = value * amount;
        self.state.money += earnings;
        self.state.stats.total_money_earned += earnings;
        Some(GameEvent::FishSold {
            name: fish.name.clone(),
            icon: fish.icon.clone(),
            amount,
            earnings,
        })
    }

    /// Liquidate the whole inventory in one transaction.
    ///
    /// # Errors
    ///
    /// [`PlayError::EmptyInventory`] when there is nothing of value to
    /// sell; the inventory is left as it was.
    pub fn sell_all(&mut self) -> Result<GameEvent, PlayError> {
        let mut earnings = 0.0;
        let mut fish_sold = 0.0;
        for (name, count) in &self.state.inventory {
            if let Some(fish) = self.catalog.fish_by_name(name) {
                earnings += fish.base_value * *count;
                fish_sold += *count;
            }
        }
        if earnings <= 0.0 {
            return Err(PlayError::EmptyInventory);
        }
        self.state.inventory.clear();
        self.state.money += earnings;
        self.state.stats.total_money_earned += earnings;
        Ok(GameEvent::InventoryCleared {
            fish_sold,
            earnings,
        })
    }

    /// Persist the current state explicitly.
    ///
    /// # Errors
    ///
    /// Passes through any [`SaveError`] from the store.
    pub fn save(&self) -> Result<(), SaveError> {
        save::save_state(&self.store, &self.state)
    }

    /// Replace the in-memory state with the stored blob, if one exists.
    /// Returns `Ok(false)` when no save is present. On error the current
    /// state is untouched, so a corrupt save falls back to a fresh game.
    ///
    /// # Errors
    ///
    /// [`SaveError::Store`] or [`SaveError::Corrupt`].
    pub fn load(&mut self) -> Result<bool, SaveError> {
        match save::load_state(&self.store)? {
            Some(mut loaded) => {
                loaded.sanitize(&self.catalog);
                loaded.fish_per_second = economy::fish_per_second(&self.catalog, &loaded);
                self.state = loaded;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Wipe progress and delete the stored save. The host asks the player
    /// for confirmation before calling this.
    pub fn reset_to_defaults(&mut self) {
        self.state = GameState::default();
        if let Err(err) = save::clear_state(&self.store) {
            log::warn!("failed to clear save: {err}");
        }
    }

    #[must_use]
    pub fn money(&self) -> f64 {
        self.state.money
    }

    /// Current per-click yield, upgrades applied.
    #[must_use]
    pub fn fish_per_click(&self) -> u32 {
        economy::fish_per_click(&self.catalog, &self.state)
    }

    /// Cached production rate, refreshed on every purchase, load, and tick.
    #[must_use]
    pub fn fish_per_second(&self) -> f64 {
        self.state.fish_per_second
    }

    #[must_use]
    pub fn inventory(&self) -> &BTreeMap<String, f64> {
        &self.state.inventory
    }

    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.state.stats
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn building_count(&self, id: &str) -> u32 {
        self.state.building_count(id)
    }

    #[must_use]
    pub fn has_upgrade(&self, id: &str) -> bool {
        self.state.has_upgrade(id)
    }

    /// Price of the next copy of a building, if the id exists. Feeds shop
    /// rendering and affordability checks.
    #[must_use]
    pub fn next_building_cost(&self, id: &str) -> Option<u64> {
        let building = self.catalog.building(id)?;
        Some(economy::building_cost(
            building,
            self.state.building_count(id),
        ))
    }

    /// Mutate the state directly and refresh the production cache after.
    /// Hosts use this for debug tooling; tests use it to stage scenarios.
    /// Gameplay writes belong in the operations above.
    pub fn with_state_mut<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut GameState) -> R,
    {
        let result = f(&mut self.state);
        self.refresh_production();
        result
    }

    /// Consume the session and keep the bare state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    fn refresh_production(&mut self) {
        let rate = economy::fish_per_second(&self.catalog, &self.state);
        self.state.fish_per_second = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::{MemoryStore, SAVE_KEY};

    fn session() -> GameSession<MemoryStore> {
        GameSession::new(Catalog::standard(), MemoryStore::new(), 42).unwrap()
    }

    #[test]
    fn cast_then_reel_lands_a_fish() {
        let mut session = session();
        assert_eq!(session.cast_line(), Some(GameEvent::LineCast));
        let event = session.reel_in().expect("line was out");
        match event {
            GameEvent::FishCaught { amount, .. } => assert_eq!(amount, 1),
            other => panic!("expected a catch, got {other:?}"),
        }
        assert_eq!(session.stats().total_clicks, 2);
        assert!((session.stats().total_fish_caught - 1.0).abs() < f64::EPSILON);
        assert!(!session.inventory().is_empty());
    }

    #[test]
    fn double_cast_is_a_silent_no_op() {
        let mut session = session();
        assert!(session.cast_line().is_some());
        assert!(session.cast_line().is_none());
        assert_eq!(session.stats().total_clicks, 1);
    }

    #[test]
    fn reel_without_cast_is_a_silent_no_op() {
        let mut session = session();
        assert!(session.reel_in().is_none());
        assert_eq!(session.stats().total_clicks, 0);
        assert!(session.inventory().is_empty());
    }

    #[test]
    fn seeded_sessions_repeat_their_catches() {
        let mut first = GameSession::new(Catalog::standard(), MemoryStore::new(), 7).unwrap();
        let mut second = GameSession::new(Catalog::standard(), MemoryStore::new(), 7).unwrap();
        for _ in 0..50 {
            first.cast_line();
            second.cast_line();
            assert_eq!(first.reel_in(), second.reel_in());
        }
    }

    #[test]
    fn buying_a_building_charges_the_scaled_price() {
        let mut session = session();
        session.with_state_mut(|state| state.money = 21.0);
        let event = session.buy_building("rod").unwrap();
        assert_eq!(
            event,
            GameEvent::BuildingPurchased {
                id: "rod".to_string(),
                name: "Fishing Rods".to_string(),
                cost: 10,
                owned: 1,
            }
        );
        assert!((session.money() - 11.0).abs() < f64::EPSILON);
        // Second rod costs floor(10 * 1.15) = 11.
        assert_eq!(session.next_building_cost("rod"), Some(11));
        session.buy_building("rod").unwrap();
        assert!(session.money().abs() < f64::EPSILON);
        assert_eq!(session.building_count("rod"), 2);
    }

    #[test]
    fn underfunded_building_purchase_changes_nothing() {
        let mut session = session();
        session.with_state_mut(|state| state.money = 9.0);
        let err = session.buy_building("rod").unwrap_err();
        assert!(matches!(err, PlayError::InsufficientFunds { .. }));
        assert_eq!(err.to_string(), "Not enough money!");
        assert!((session.money() - 9.0).abs() < f64::EPSILON);
        assert_eq!(session.building_count("rod"), 0);
    }

    #[test]
    fn overflowed_building_costs_stay_unaffordable() {
        let mut session = session();
        // Enough rods that the geometric curve leaves the f64 range.
        session.with_state_mut(|state| {
            state.buildings.insert("rod".to_string(), 6_000);
        });
        assert_eq!(session.next_building_cost("rod"), Some(u64::MAX));
        let err = session.buy_building("rod").unwrap_err();
        assert!(matches!(err, PlayError::InsufficientFunds { .. }));
        assert_eq!(session.building_count("rod"), 6_000);
        assert!(session.money().abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut session = session();
        assert!(matches!(
            session.buy_building("lighthouse"),
            Err(PlayError::UnknownItem { .. })
        ));
        assert!(matches!(
            session.buy_upgrade("laser_reel"),
            Err(PlayError::UnknownItem { .. })
        ));
    }

    #[test]
    fn purchases_refresh_the_production_cache() {
        let mut session = session();
        session.with_state_mut(|state| state.money = 1000.0);
        session.buy_building("net").unwrap();
        assert!((session.fish_per_second() - 1.0).abs() < 1e-9);
        session.buy_upgrade("better_bait").unwrap();
        assert!((session.fish_per_second() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn upgrades_cannot_be_bought_twice() {
        let mut session = session();
        session.with_state_mut(|state| state.money = 300.0);
        session.buy_upgrade("sharper_hook").unwrap();
        assert_eq!(session.fish_per_click(), 2);
        let err = session.buy_upgrade("sharper_hook").unwrap_err();
        assert_eq!(err, PlayError::AlreadyPurchased { id: "sharper_hook".to_string() });
        assert_eq!(err.to_string(), "Already purchased!");
        assert!((session.money() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn click_upgrade_doubles_the_catch() {
        let mut session = session();
        session.with_state_mut(|state| state.money = 100.0);
        session.buy_upgrade("sharper_hook").unwrap();
        assert!(session.money().abs() < f64::EPSILON);
        session.cast_line();
        match session.reel_in() {
            Some(GameEvent::FishCaught { amount, .. }) => assert_eq!(amount, 2),
            other => panic!("expected a catch, got {other:?}"),
        }
    }

    #[test]
    fn selling_fish_credits_base_value() {
        let mut session = session();
        session.with_state_mut(|state| state.add_fish("Trout", 3.0));
        let event = session.sell_fish("Trout", 2.0).expect("enough trout");
        match event {
            GameEvent::FishSold { earnings, .. } => {
                assert!((earnings - 10.0).abs() < f64::EPSILON);
            }
            other => panic!("expected a sale, got {other:?}"),
        }
        assert!((session.money() - 10.0).abs() < f64::EPSILON);
        assert!((session.stats().total_money_earned - 10.0).abs() < f64::EPSILON);
        assert!((session.state().fish_count("Trout") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn selling_the_last_fish_removes_the_entry() {
        let mut session = session();
        session.with_state_mut(|state| state.add_fish("Minnow", 1.0));
        session.sell_fish("Minnow", 1.0).unwrap();
        assert!(session.inventory().is_empty());
    }

    #[test]
    fn short_sells_are_silent_no_ops() {
        let mut session = session();
        session.with_state_mut(|state| state.add_fish("Minnow", 1.0));
        assert!(session.sell_fish("Minnow", 2.0).is_none());
        assert!(session.sell_fish("Kraken", 1.0).is_none());
        assert!(session.sell_fish("Minnow", 0.0).is_none());
        assert!(session.money().abs() < f64::EPSILON);
        assert!((session.state().fish_count("Minnow") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_all_liquidates_everything_at_once() {
        let mut session = session();
        session.with_state_mut(|state| {
            state.add_fish("Minnow", 2.0);
            state.add_fish("Trout", 1.0);
            state.add_fish("Salmon", 1.0);
        });
        let event = session.sell_all().unwrap();
        assert_eq!(
            event,
            GameEvent::InventoryCleared {
                fish_sold: 4.0,
                earnings: 32.0,
            }
        );
        assert!(session.inventory().is_empty());
        assert!((session.money() - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_all_on_an_empty_inventory_errors() {
        let mut session = session();
        let err = session.sell_all().unwrap_err();
        assert_eq!(err, PlayError::EmptyInventory);
        assert_eq!(err.to_string(), "Inventory is empty!");
    }

    #[test]
    fn tick_deposits_unfloored_income_into_minnows() {
        let mut session = session();
        session.with_state_mut(|state| {
            state.buildings.insert("rod".to_string(), 1);
        });
        let event = session.tick().expect("production is running");
        match event {
            GameEvent::PassiveIncome { name, amount, .. } => {
                assert_eq!(name, "Minnow");
                assert!((amount - 0.1).abs() < 1e-9);
            }
            other => panic!("expected passive income, got {other:?}"),
        }
        assert!((session.state().fish_count("Minnow") - 0.1).abs() < 1e-9);
        assert!((session.fish_per_second() - 0.1).abs() < 1e-9);
        // Clicks floor; passive income does not.
        assert!((session.stats().total_fish_caught - 0.1).abs() < 1e-9);
    }

    #[test]
    fn idle_ticks_still_autosave() {
        let store = MemoryStore::new();
        let mut session =
            GameSession::new(Catalog::standard(), store.clone(), 1).unwrap();
        assert!(session.tick().is_none());
        assert!(store.blob(SAVE_KEY).is_some());
    }

    #[test]
    fn save_and_load_round_trip_through_the_store() {
        let store = MemoryStore::new();
        let mut session =
            GameSession::new(Catalog::standard(), store.clone(), 5).unwrap();
        session.with_state_mut(|state| {
            state.money = 77.5;
            state.add_fish("Tuna", 2.0);
        });
        session.save().unwrap();

        let mut revived = GameSession::new(Catalog::standard(), store, 5).unwrap();
        assert!(revived.load().unwrap());
        assert!((revived.money() - 77.5).abs() < f64::EPSILON);
        assert!((revived.state().fish_count("Tuna") - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn loading_without_a_save_reports_false() {
        let mut session = session();
        assert!(!session.load().unwrap());
    }

    #[test]
    fn corrupt_saves_leave_the_fresh_state_alone() {
        let store = MemoryStore::new();
        store.put_blob(SAVE_KEY, "not a save at all");
        let mut session = GameSession::new(Catalog::standard(), store, 2).unwrap();
        assert!(matches!(session.load(), Err(SaveError::Corrupt(_))));
        assert!(session.money().abs() < f64::EPSILON);
        // Play continues on the fresh state.
        session.cast_line();
        assert!(session.reel_in().is_some());
    }

    #[test]
    fn loaded_states_are_sanitized_and_recached() {
        let store = MemoryStore::new();
        store.put_blob(
            SAVE_KEY,
            r#"{
                "money": -10.0,
                "inventory": {"Minnow": 3.0, "Kraken": 2.0},
                "buildings": {"net": 2, "castle": 1},
                "upgrades": {"better_bait": true, "laser_reel": true}
            }"#,
        );
        let mut session = GameSession::new(Catalog::standard(), store, 3).unwrap();
        assert!(session.load().unwrap());
        assert!(session.money().abs() < f64::EPSILON);
        assert!((session.state().fish_count("Kraken")).abs() < f64::EPSILON);
        assert_eq!(session.building_count("castle"), 0);
        assert!(!session.has_upgrade("laser_reel"));
        // 2 nets * 1.0, scaled by Better Bait.
        assert!((session.fish_per_second() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn reset_wipes_state_and_storage() {
        let store = MemoryStore::new();
        let mut session =
            GameSession::new(Catalog::standard(), store.clone(), 9).unwrap();
        session.with_state_mut(|state| state.money = 500.0);
        session.save().unwrap();
        session.reset_to_defaults();
        assert!(session.money().abs() < f64::EPSILON);
        assert!(store.blob(SAVE_KEY).is_none());
    }

    #[test]
    fn invalid_catalogs_never_start_a_session() {
        let catalog = Catalog::build(Vec::new(), Vec::new(), Vec::new());
        assert!(matches!(
            GameSession::new(catalog, MemoryStore::new(), 0),
            Err(CatalogError::EmptyTier { .. })
        ));
    }
}
