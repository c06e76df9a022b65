//! Core game logic for Reeltide, a fishing idle clicker.
//!
//! Platform-agnostic: everything here is state, math, and a
//! [`SaveStore`] seam the host implements over whatever storage it has
//! (browser `localStorage`, a file, an in-memory map). The host owns the
//! clock and the presentation; this crate owns the rules.
//!
//! A host drives the game through [`GameSession`]: call the operation for
//! each player action, render the returned [`GameEvent`], and call
//! [`GameSession::tick`] once a second for passive income and autosaving.
//!
//! ```
//! use reeltide_game::{Catalog, GameSession, MemoryStore};
//!
//! let mut session = GameSession::new(Catalog::standard(), MemoryStore::new(), 7)?;
//! session.cast_line();
//! if let Some(event) = session.reel_in() {
//!     println!("{event}");
//! }
//! # Ok::<(), reeltide_game::CatalogError>(())
//! ```

pub mod catalog;
pub mod economy;
pub mod event;
pub mod numbers;
pub mod rewards;
pub mod save;
pub mod session;
pub mod state;

pub use catalog::{Building, Catalog, CatalogError, FishType, Rarity, Upgrade, UpgradeKind};
pub use event::GameEvent;
pub use save::{MemoryStore, SaveError, SaveStore, SAVE_KEY};
pub use session::{GameSession, PlayError};
pub use state::{GameState, Stats};
