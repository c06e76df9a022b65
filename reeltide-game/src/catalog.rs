//! Fish, building, and upgrade definitions plus the lookup indexes the
//! rest of the crate resolves ids against.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Catch rarity tiers, ordered from most to least frequent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Every tier, most frequent first.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "uncommon" => Ok(Self::Uncommon),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            _ => Err(()),
        }
    }
}

/// A catchable species. Fish are identified by `name`; the inventory and
/// the sell operations key on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishType {
    pub name: String,
    /// Sale price per unit.
    pub base_value: f64,
    pub rarity: Rarity,
    /// Emoji shown next to the name in notifications and lists.
    pub icon: String,
}

/// A passive producer sold in the shop. Repeat purchases follow a
/// geometric price curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub name: String,
    /// Price of the first copy.
    pub base_cost: f64,
    /// Per-copy price multiplier, strictly greater than 1.
    pub cost_scale: f64,
    /// Fish per second added by each owned copy.
    pub fps_effect: f64,
    pub description: String,
}

/// What an upgrade multiplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpgradeKind {
    /// Multiplies the per-click yield by `effect`.
    FpcMultiplier,
    /// Scales total production by `1 + effect`.
    FpsMultiplier,
}

/// A one-shot shop purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub cost: f64,
    pub kind: UpgradeKind,
    /// Multiplier operand; interpretation depends on `kind`.
    pub effect: f64,
    pub description: String,
}

/// Problems that make a catalog unplayable. Checked once when a session
/// starts, so play-time lookups can trust the data.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no {rarity} fish defined")]
    EmptyTier { rarity: Rarity },
    #[error("duplicate fish name '{name}'")]
    DuplicateFish { name: String },
    #[error("duplicate shop id '{id}'")]
    DuplicateId { id: String },
    #[error("fish '{name}' needs a positive base value")]
    NonPositiveValue { name: String },
    #[error("'{id}' needs a positive cost")]
    NonPositiveCost { id: String },
    #[error("'{id}' cost scale must be greater than 1 (got {scale})")]
    CostScaleTooLow { id: String, scale: f64 },
    #[error("building '{id}' output must be finite and non-negative")]
    InvalidOutput { id: String },
    #[error("upgrade '{id}' effect must be positive")]
    NonPositiveEffect { id: String },
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDoc {
    #[serde(default)]
    fish: Vec<FishType>,
    #[serde(default)]
    buildings: Vec<Building>,
    #[serde(default)]
    upgrades: Vec<Upgrade>,
}

type TierBucket = SmallVec<[usize; 4]>;

/// Immutable game content: the fish table and the shop, with O(1) lookup
/// indexes and the per-tier buckets the reward roll selects from.
#[derive(Debug, Clone)]
pub struct Catalog {
    fish: Vec<FishType>,
    buildings: Vec<Building>,
    upgrades: Vec<Upgrade>,
    fish_by_name: HashMap<String, usize>,
    buildings_by_id: HashMap<String, usize>,
    upgrades_by_id: HashMap<String, usize>,
    tiers: HashMap<Rarity, TierBucket>,
    /// Index of the cheapest Common fish; passive income lands here.
    passive: Option<usize>,
}

impl Catalog {
    /// Build a catalog from explicit parts and validate it.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found in the data.
    pub fn new(
        fish: Vec<FishType>,
        buildings: Vec<Building>,
        upgrades: Vec<Upgrade>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self::build(fish, buildings, upgrades);
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a `{ "fish": [...], "buildings": [...], "upgrades": [...] }`
    /// document and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and the usual
    /// validation errors for bad data.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDoc = serde_json::from_str(json)?;
        Self::new(doc.fish, doc.buildings, doc.upgrades)
    }

    /// The built-in content set.
    #[must_use]
    pub fn standard() -> Self {
        Self::build(standard_fish(), standard_buildings(), standard_upgrades())
    }

    pub(crate) fn build(
        fish: Vec<FishType>,
        buildings: Vec<Building>,
        upgrades: Vec<Upgrade>,
    ) -> Self {
        let mut fish_by_name = HashMap::with_capacity(fish.len());
        let mut tiers: HashMap<Rarity, TierBucket> = HashMap::new();
        let mut passive: Option<usize> = None;
        for (index, entry) in fish.iter().enumerate() {
            fish_by_name.insert(entry.name.clone(), index);
            tiers.entry(entry.rarity).or_default().push(index);
            if entry.rarity == Rarity::Common {
                let cheaper =
                    passive.map_or(true, |current| entry.base_value < fish[current].base_value);
                if cheaper {
                    passive = Some(index);
                }
            }
        }
        let buildings_by_id = buildings
            .iter()
            .enumerate()
            .map(|(index, b)| (b.id.clone(), index))
            .collect();
        let upgrades_by_id = upgrades
            .iter()
            .enumerate()
            .map(|(index, u)| (u.id.clone(), index))
            .collect();
        Self {
            fish,
            buildings,
            upgrades,
            fish_by_name,
            buildings_by_id,
            upgrades_by_id,
            tiers,
            passive,
        }
    }

    /// Check the catalog against every structural rule the game relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for rarity in Rarity::ALL {
            if self.tier_bucket(rarity).is_empty() {
                return Err(CatalogError::EmptyTier { rarity });
            }
        }
        let mut seen_fish = HashSet::new();
        for entry in &self.fish {
            if !seen_fish.insert(entry.name.as_str()) {
                return Err(CatalogError::DuplicateFish {
                    name: entry.name.clone(),
                });
            }
            if !entry.base_value.is_finite() || entry.base_value <= 0.0 {
                return Err(CatalogError::NonPositiveValue {
                    name: entry.name.clone(),
                });
            }
        }
        let mut seen_ids = HashSet::new();
        for building in &self.buildings {
            if !seen_ids.insert(building.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    id: building.id.clone(),
                });
            }
            if !building.base_cost.is_finite() || building.base_cost <= 0.0 {
                return Err(CatalogError::NonPositiveCost {
                    id: building.id.clone(),
                });
            }
            if !building.cost_scale.is_finite() || building.cost_scale <= 1.0 {
                return Err(CatalogError::CostScaleTooLow {
                    id: building.id.clone(),
                    scale: building.cost_scale,
                });
            }
            if !building.fps_effect.is_finite() || building.fps_effect < 0.0 {
                return Err(CatalogError::InvalidOutput {
                    id: building.id.clone(),
                });
            }
        }
        for upgrade in &self.upgrades {
            if !seen_ids.insert(upgrade.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    id: upgrade.id.clone(),
                });
            }
            if !upgrade.cost.is_finite() || upgrade.cost <= 0.0 {
                return Err(CatalogError::NonPositiveCost {
                    id: upgrade.id.clone(),
                });
            }
            if !upgrade.effect.is_finite() || upgrade.effect <= 0.0 {
                return Err(CatalogError::NonPositiveEffect {
                    id: upgrade.id.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn fish(&self) -> &[FishType] {
        &self.fish
    }

    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    #[must_use]
    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    #[must_use]
    pub fn fish_by_name(&self, name: &str) -> Option<&FishType> {
        self.fish_by_name.get(name).map(|&index| &self.fish[index])
    }

    #[must_use]
    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings_by_id
            .get(id)
            .map(|&index| &self.buildings[index])
    }

    #[must_use]
    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades_by_id
            .get(id)
            .map(|&index| &self.upgrades[index])
    }

    /// All fish of one tier, in declaration order.
    pub fn fish_of(&self, rarity: Rarity) -> impl Iterator<Item = &FishType> + '_ {
        self.tier_bucket(rarity).iter().map(|&index| &self.fish[index])
    }

    /// Where passive production is deposited: the cheapest Common fish,
    /// first declared winning ties. `None` only for unvalidated catalogs.
    #[must_use]
    pub fn passive_fish(&self) -> Option<&FishType> {
        self.passive.map(|index| &self.fish[index])
    }

    pub(crate) fn tier_bucket(&self, rarity: Rarity) -> &[usize] {
        self.tiers.get(&rarity).map_or(&[], SmallVec::as_slice)
    }
}

fn standard_fish() -> Vec<FishType> {
    vec![
        FishType {
            name: "Minnow".to_string(),
            base_value: 1.0,
            rarity: Rarity::Common,
            icon: "🐠".to_string(),
        },
        FishType {
            name: "Trout".to_string(),
            base_value: 5.0,
            rarity: Rarity::Common,
            icon: "🐟".to_string(),
        },
        FishType {
            name: "Salmon".to_string(),
            base_value: 25.0,
            rarity: Rarity::Uncommon,
            icon: "🍣".to_string(),
        },
        FishType {
            name: "Tuna".to_string(),
            base_value: 100.0,
            rarity: Rarity::Rare,
            icon: "🐡".to_string(),
        },
        FishType {
            name: "Swordfish".to_string(),
            base_value: 500.0,
            rarity: Rarity::Epic,
            icon: "⚔️".to_string(),
        },
        FishType {
            name: "Giant Squid".to_string(),
            base_value: 5000.0,
            rarity: Rarity::Legendary,
            icon: "🦑".to_string(),
        },
    ]
}

fn standard_buildings() -> Vec<Building> {
    vec![
        Building {
            id: "rod".to_string(),
            name: "Fishing Rods".to_string(),
            base_cost: 10.0,
            cost_scale: 1.15,
            fps_effect: 0.1,
            description: "Basic FPS: +0.1".to_string(),
        },
        Building {
            id: "net".to_string(),
            name: "Nets".to_string(),
            base_cost: 100.0,
            cost_scale: 1.15,
            fps_effect: 1.0,
            description: "Passive FPS: +1.0".to_string(),
        },
        Building {
            id: "boat".to_string(),
            name: "Fishing Boats".to_string(),
            base_cost: 1100.0,
            cost_scale: 1.15,
            fps_effect: 8.0,
            description: "Passive FPS: +8.0".to_string(),
        },
        Building {
            id: "trawler".to_string(),
            name: "Trawlers".to_string(),
            base_cost: 12000.0,
            cost_scale: 1.15,
            fps_effect: 47.0,
            description: "Passive FPS: +47.0".to_string(),
        },
    ]
}

fn standard_upgrades() -> Vec<Upgrade> {
    vec![
        Upgrade {
            id: "sharper_hook".to_string(),
            name: "Sharper Hook".to_string(),
            cost: 100.0,
            kind: UpgradeKind::FpcMultiplier,
            effect: 2.0,
            description: "Doubles Fish Per Click".to_string(),
        },
        Upgrade {
            id: "better_bait".to_string(),
            name: "Better Bait".to_string(),
            cost: 500.0,
            kind: UpgradeKind::FpsMultiplier,
            effect: 0.25,
            description: "All FPS +25%".to_string(),
        },
    ]
}
