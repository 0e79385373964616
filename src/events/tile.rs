//! Per-tile change events.

use crate::components::mnemonic::Mnemonic;
use crate::components::tileproperty::PropertyKey;

/// Raised by a [`Tile`](crate::components::tile::Tile) when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEvent {
    /// A property was stored with a new (clamped) value.
    PropertyChanged { key: PropertyKey, value: i32 },
    /// The sheet letter or atlas index changed.
    MnemonicChanged(Mnemonic),
}
