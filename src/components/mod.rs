//! Per-tile data.
//!
//! Submodules overview:
//! - [`mnemonic`] – `<letter><index>` references to a sheet-atlas cell
//! - [`tileproperty`] – typed, range-clamped properties with flag encoding
//! - [`flags`] – colon-separated flag fragment codec
//! - [`tile`] – map/fixture/entity tiles, flag parsing and instancing

pub mod flags;
pub mod mnemonic;
pub mod tile;
pub mod tileproperty;
