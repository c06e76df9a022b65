//! Events emitted by session operations, carrying everything a host needs
//! to render a notification or a log line.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Rarity;

/// Outcome of a mutating session operation.
///
/// The `Display` impl renders the player-facing notification text; hosts
/// that want richer presentation read the fields instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum GameEvent {
    /// The line went out; the next click reels it in.
    LineCast,
    /// A manual catch landed `amount` fish of one species.
    FishCaught {
        name: String,
        icon: String,
        rarity: Rarity,
        amount: u32,
    },
    /// One tick of building production, un-floored.
    PassiveIncome { name: String, icon: String, amount: f64 },
    /// A building was bought at its scaled price; `owned` is the new count.
    BuildingPurchased {
        id: String,
        name: String,
        cost: u64,
        owned: u32,
    },
    UpgradePurchased { id: String, name: String, cost: f64 },
    /// A single-species sale.
    FishSold {
        name: String,
        icon: String,
        amount: f64,
        earnings: f64,
    },
    /// The whole inventory was liquidated.
    InventoryCleared { fish_sold: f64, earnings: f64 },
}

impl GameEvent {
    /// Whether the host should surface this as a notification. Trickle
    /// passive income stays quiet until a tick delivers more than one fish.
    #[must_use]
    pub fn noteworthy(&self) -> bool {
        match self {
            Self::PassiveIncome { amount, .. } => *amount > 1.0,
            _ => true,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineCast => f.write_str("Line is cast... Reel In!"),
            Self::FishCaught {
                name, icon, amount, ..
            } => write!(f, "Caught {amount} {icon} {name}!"),
            Self::PassiveIncome { icon, amount, .. } => {
                write!(f, "+{amount} {icon} from buildings!")
            }
            Self::BuildingPurchased { name, .. } | Self::UpgradePurchased { name, .. } => {
                write!(f, "Purchased {name}!")
            }
            Self::FishSold {
                name,
                icon,
                amount,
                earnings,
            } => write!(f, "Sold {amount} {icon} {name} for 💰{earnings}!"),
            Self::InventoryCleared {
                fish_sold,
                earnings,
            } => write!(f, "Sold all {fish_sold} fish for a total of 💰{earnings}!"),
        }
    }
}
