//! Long-lived stores.
//!
//! Overview
//! - `editorconfig` – INI-backed editor settings with safe defaults
//! - `sheetmodel` – one tile atlas and its per-cell template tiles
//! - `sheetstore` – loaded atlases by uid, and the `GameModel` resolution seam
//! - `zone` – base grid, fixture/entity overlays and the sheet index table
pub mod editorconfig;
pub mod sheetmodel;
pub mod sheetstore;
pub mod zone;
