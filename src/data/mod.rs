//! Static game content: the board track and the brand/synergy tables.
//!
//! These are the built-in defaults; a `brandopoly.toml` can replace any of
//! them through [`crate::engine::config::GameConfig`].

pub mod board;
pub mod brands;
