//! Zone layer change events.

use crate::components::mnemonic::Mnemonic;
use crate::components::tile::Layer;

/// Raised by a [`Zone`](crate::resources::zone::Zone) when a cell changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneEvent {
    /// A tile was placed at `(x, y)`, replacing `old` if the layer had one.
    TileSwapped {
        layer: Layer,
        x: usize,
        y: usize,
        old: Option<Mnemonic>,
        new: Mnemonic,
    },
    /// The tile at `(x, y)` was edited in place.
    TileChanged { layer: Layer, x: usize, y: usize },
    /// An overlay tile was removed from `(x, y)`.
    TileRemoved {
        layer: Layer,
        x: usize,
        y: usize,
        old: Mnemonic,
    },
}
