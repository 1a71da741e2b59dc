//! partydeck — the engine behind a pass-the-device party game.
//!
//! Players take turns writing cards to a prompt, react-vote on each other's
//! cards, then secretly rank a curated deck before the group argues its way
//! to a public ordering and a reveal. This crate is the deterministic core:
//! the reducer, its scoring algorithms, per-room persistence, and the
//! tab-to-tab sync bus. Rendering, timers, and gestures live in the driver.

pub mod bus;
pub mod engine;
pub mod events;
pub mod random;
pub mod selectors;
pub mod store;
pub mod themes;
pub mod types;

pub use engine::reduce;
pub use events::Event;
pub use types::GameState;
