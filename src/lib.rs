//! Deepzone library.
//!
//! Zone/tile data model for a tile-map editor: layered tile grids, typed tile
//! properties encoded as compact flag strings, sheet atlases, and the `.zone`
//! text format. Exposed as a library for the CLI and integration tests.

pub mod components;
pub mod error;
pub mod events;
pub mod export;
pub mod properties;
pub mod resources;
pub mod zonefile;
