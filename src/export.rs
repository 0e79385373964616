//! JSON tile-map export.
//!
//! Flattens a [`Zone`] into simple serializable structs a game engine can
//! read without knowing the `.zone` format: one layer per zone layer, each a
//! list of placements with the atlas id, the sheet uid and the encoded
//! flags.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::components::tile::{Layer, Tile};
use crate::resources::sheetmodel::DEFAULT_TILE_SIZE;
use crate::resources::sheetstore::GameModel;
use crate::resources::zone::Zone;

/// Single tile placement within a layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tileposition {
    /// X coordinate in tiles.
    pub x: u32,
    /// Y coordinate in tiles.
    pub y: u32,
    /// Atlas index within the sheet.
    pub id: u32,
    /// Sheet uid, absent when the letter does not resolve to a loaded sheet.
    pub sheet: Option<u64>,
    /// Encoded non-default flags.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flags: String,
}

/// A named tile layer containing positions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tilelayer {
    pub name: String,
    pub positions: Vec<Tileposition>,
}

/// Tilemap metadata and layers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tilemap {
    pub name: String,
    /// Size of a tile in pixels.
    pub tile_size: u32,
    /// Map width in tiles.
    pub map_width: u32,
    /// Map height in tiles.
    pub map_height: u32,
    /// Zone sheet letters and their uids.
    pub sheets: BTreeMap<char, u64>,
    pub layers: Vec<Tilelayer>,
}

impl Tilemap {
    /// Flatten `zone`. The tile size comes from the sheet under the lowest
    /// letter that resolves.
    pub fn from_zone(zone: &Zone, game: &dyn GameModel) -> Self {
        let sheets = zone.sorted_sheet_index();
        let tile_size = sheets
            .values()
            .find_map(|uid| game.sheet(*uid))
            .map(|s| s.size())
            .unwrap_or_else(|| {
                warn!(
                    "Zone '{}': no sheet resolves, assuming {}px tiles",
                    zone.name(),
                    DEFAULT_TILE_SIZE
                );
                DEFAULT_TILE_SIZE
            });

        let position = |tile: &Tile| Tileposition {
            x: tile.x() as u32,
            y: tile.y() as u32,
            id: tile.index(),
            sheet: tile
                .sheet()
                .and_then(|l| sheets.get(&l).copied())
                .filter(|uid| game.sheet(*uid).is_some()),
            flags: tile.flags(),
        };
        let layer = |kind: Layer, tiles: &[Tile]| {
            let mut positions: Vec<Tileposition> = tiles.iter().map(&position).collect();
            positions.sort_by_key(|p| (p.y, p.x));
            Tilelayer {
                name: kind.to_string(),
                positions,
            }
        };

        let layers = vec![
            layer(Layer::Base, zone.base_tiles()),
            layer(Layer::Fixture, zone.fixtures()),
            layer(Layer::Entity, zone.entities()),
        ];
        Self {
            name: zone.name().to_string(),
            tile_size,
            map_width: zone.width() as u32,
            map_height: zone.height() as u32,
            sheets,
            layers,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn layer(&self, name: &str) -> Option<&Tilelayer> {
        self.layers.iter().find(|l| l.name == name)
    }
}
