//! Weighted catch resolution: one primary roll picks the rarity tier, a
//! secondary draw picks among Common fish.

use rand::Rng;

use crate::catalog::{Catalog, CatalogError, FishType, Rarity};

/// Upper roll bound for a Legendary catch (1%).
pub const LEGENDARY_BOUND: f64 = 0.01;
/// Upper roll bound for an Epic catch (4% band).
pub const EPIC_BOUND: f64 = 0.05;
/// Upper roll bound for a Rare catch (10% band).
pub const RARE_BOUND: f64 = 0.15;
/// Upper roll bound for an Uncommon catch (20% band); everything above is
/// Common.
pub const UNCOMMON_BOUND: f64 = 0.35;

/// Map a primary roll in `[0, 1)` onto the rarity ladder.
#[must_use]
pub fn rarity_for_roll(roll: f64) -> Rarity {
    if roll < LEGENDARY_BOUND {
        Rarity::Legendary
    } else if roll < EPIC_BOUND {
        Rarity::Epic
    } else if roll < RARE_BOUND {
        Rarity::Rare
    } else if roll < UNCOMMON_BOUND {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

/// Resolve a primary roll to a concrete fish.
///
/// Non-Common tiers resolve to their first declared fish. A Common roll
/// picks uniformly among every Common fish with a secondary draw from
/// `rng`.
///
/// # Errors
///
/// Returns [`CatalogError::EmptyTier`] when the selected tier has no fish;
/// unreachable through a session, which validates its catalog up front.
pub fn resolve_catch<'a, R: Rng>(
    catalog: &'a Catalog,
    roll: f64,
    rng: &mut R,
) -> Result<&'a FishType, CatalogError> {
    let rarity = rarity_for_roll(roll);
    let bucket = catalog.tier_bucket(rarity);
    if bucket.is_empty() {
        return Err(CatalogError::EmptyTier { rarity });
    }
    let index = match rarity {
        Rarity::Common => bucket[rng.gen_range(0..bucket.len())],
        _ => bucket[0],
    };
    Ok(&catalog.fish()[index])
}

/// Roll the primary draw and resolve it in one step.
///
/// # Errors
///
/// Same as [`resolve_catch`].
pub fn draw_catch<'a, R: Rng>(
    catalog: &'a Catalog,
    rng: &mut R,
) -> Result<&'a FishType, CatalogError> {
    let roll = rng.gen_range(0.0..1.0);
    resolve_catch(catalog, roll, rng)
}
