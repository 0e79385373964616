//! Zone: a layered tile grid.
//!
//! A zone owns a dense base layer (exactly one map tile per cell, stored row
//! major) and two sparse overlay lists, fixtures and entities, holding at
//! most one tile per cell each. Tiles name their atlas with a letter; the
//! zone's index table maps letters to sheet uids, which a [`GameModel`]
//! resolves to loaded sheets.
//!
//! All placement goes through [`Zone::stamp`], which enforces cell
//! exclusivity, detaches the replaced tile's subscribers and raises a
//! [`ZoneEvent`]. Loading and storing the `.zone` text format lives in
//! [`crate::zonefile`].

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::components::mnemonic::{Mnemonic, is_sheet_letter};
use crate::components::tile::{Layer, Tile, TileVariant};
use crate::error::{MnemonicError, ZoneError};
use crate::events::Subscribers;
use crate::events::zone::ZoneEvent;
use crate::resources::sheetmodel::SheetModel;
use crate::resources::sheetstore::GameModel;
use crate::zonefile;

pub const DEFAULT_WIDTH: usize = 40;
pub const DEFAULT_HEIGHT: usize = 30;
pub const DEFAULT_NAME: &str = "Unnamed";
/// Letter given to the default sheet in a freshly created zone.
pub const DEFAULT_SHEET_LETTER: char = 'A';
/// Uid recorded for the default letter when no sheet is loaded at all.
pub const UNLOADED_SHEET_UID: u64 = 0;

/// Single-line, non-empty zone name.
fn clean_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        warn!("Empty zone name, using '{}'", DEFAULT_NAME);
        return DEFAULT_NAME.to_string();
    }
    cleaned.to_string()
}

/// Resolve `letter`/`index` through an index table to a sheet and its
/// template tile.
pub(crate) fn resolve_template<'g>(
    game: &'g dyn GameModel,
    sheet_index: &FxHashMap<char, u64>,
    letter: char,
    index: u32,
) -> Result<(&'g SheetModel, &'g Tile), ZoneError> {
    let uid = *sheet_index
        .get(&letter)
        .ok_or(ZoneError::UnknownSheet(letter))?;
    let sheet = game.sheet(uid).ok_or(ZoneError::SheetNotLoaded(uid))?;
    let template = sheet
        .tile(index)
        .ok_or(ZoneError::UnknownTile { uid, index })?;
    Ok((sheet, template))
}

/// One map: base grid, overlays and the sheet index table.
#[derive(Debug)]
pub struct Zone {
    name: String,
    width: usize,
    height: usize,
    base: Vec<Tile>,
    fixtures: Vec<Tile>,
    entities: Vec<Tile>,
    sheet_index: FxHashMap<char, u64>,
    subscribers: Subscribers<ZoneEvent>,
}

impl Zone {
    /// Create a `width` x `height` zone filled from the default sheet.
    ///
    /// The default sheet is registered under letter `A` and every base cell
    /// gets an instance of its cell 0. Without a default sheet, or when cell
    /// 0 is not a map tile, the grid is filled with bare `A000` map tiles.
    /// `A` then points at [`UNLOADED_SHEET_UID`] so the index table still
    /// covers every letter in the grid.
    pub fn new(game: &dyn GameModel, name: &str, width: usize, height: usize) -> Self {
        let name = clean_name(name);
        let width = width.max(1);
        let height = height.max(1);
        let mut sheet_index = FxHashMap::default();
        let template = match game.default_sheet() {
            Some(sheet) => {
                sheet_index.insert(DEFAULT_SHEET_LETTER, sheet.uid());
                sheet.tile(0).filter(|t| t.variant() == TileVariant::Map)
            }
            None => {
                warn!(
                    "Zone '{}': no default sheet, filling with bare tiles under {}:{}",
                    name, DEFAULT_SHEET_LETTER, UNLOADED_SHEET_UID
                );
                sheet_index.insert(DEFAULT_SHEET_LETTER, UNLOADED_SHEET_UID);
                None
            }
        };

        let mut zone = Self::from_parts(
            name,
            width,
            height,
            Vec::with_capacity(width * height),
            Vec::new(),
            Vec::new(),
            sheet_index,
        );
        for y in 0..height {
            for x in 0..width {
                let mut tile = match template {
                    Some(t) => t.instantiate(),
                    None => Tile::map(Mnemonic::unset(0)),
                };
                // Constant letter, always valid.
                let _ = tile.set_sheet(DEFAULT_SHEET_LETTER);
                tile.set_position(x, y);
                tile.set_zone_name(Some(zone.name.clone()));
                zone.base.push(tile);
            }
        }
        info!("Created zone '{}' {}x{}", zone.name, width, height);
        zone
    }

    /// `Unnamed` 40x30 zone filled from the default sheet.
    pub fn with_defaults(game: &dyn GameModel) -> Self {
        Self::new(game, DEFAULT_NAME, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Assemble a zone from already-positioned tiles. `base` must hold
    /// `width * height` map tiles in row-major order once filled.
    pub(crate) fn from_parts(
        name: String,
        width: usize,
        height: usize,
        base: Vec<Tile>,
        fixtures: Vec<Tile>,
        entities: Vec<Tile>,
        sheet_index: FxHashMap<char, u64>,
    ) -> Self {
        Self {
            name,
            width,
            height,
            base,
            fixtures,
            entities,
            sheet_index,
            subscribers: Subscribers::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the zone. Line breaks are replaced since the name is stored on
    /// a single line; a blank name becomes [`DEFAULT_NAME`].
    pub fn set_name(&mut self, name: &str) {
        self.name = clean_name(name);
        let owned = Some(self.name.clone());
        for tile in self.tiles_mut() {
            tile.set_zone_name(owned.clone());
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Letter to sheet-uid table.
    pub fn sheet_index(&self) -> &FxHashMap<char, u64> {
        &self.sheet_index
    }

    /// Index table sorted by letter.
    pub fn sorted_sheet_index(&self) -> BTreeMap<char, u64> {
        self.sheet_index.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Map `letter` to sheet `uid`, replacing any earlier mapping.
    pub fn set_sheet_key(&mut self, letter: char, uid: u64) -> Result<(), ZoneError> {
        if !is_sheet_letter(letter) {
            return Err(MnemonicError::LetterOutOfRange(letter).into());
        }
        if let Some(old) = self.sheet_index.insert(letter, uid) {
            if old != uid {
                debug!("Zone '{}': IDX {} {} -> {}", self.name, letter, old, uid);
            }
        }
        Ok(())
    }

    /// Drop a letter from the index table. Tiles still using it will fail
    /// to resolve.
    pub fn remove_sheet_key(&mut self, letter: char) -> Option<u64> {
        self.sheet_index.remove(&letter)
    }

    /// Letter under which sheet `uid` is registered, lowest letter first.
    pub fn key_for(&self, uid: u64) -> Option<char> {
        self.sheet_index
            .iter()
            .filter(|(_, v)| **v == uid)
            .map(|(k, _)| *k)
            .min()
    }

    /// Resolve a letter through the index table.
    pub fn sheet<'g>(&self, letter: char, game: &'g dyn GameModel) -> Result<&'g SheetModel, ZoneError> {
        let uid = *self
            .sheet_index
            .get(&letter)
            .ok_or(ZoneError::UnknownSheet(letter))?;
        game.sheet(uid).ok_or(ZoneError::SheetNotLoaded(uid))
    }

    /// Instantiate template `index` of the sheet registered under `letter`,
    /// with the letter stamped on.
    pub fn instantiate(
        &self,
        game: &dyn GameModel,
        letter: char,
        index: u32,
    ) -> Result<Tile, ZoneError> {
        let (_, template) = resolve_template(game, &self.sheet_index, letter, index)?;
        let mut tile = template.instantiate();
        tile.set_sheet(letter)?;
        Ok(tile)
    }

    fn check_bounds(&self, x: usize, y: usize) -> Result<(), ZoneError> {
        if x >= self.width || y >= self.height {
            return Err(ZoneError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Base tile at `(x, y)`.
    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.base.get(y * self.width + x)
    }

    /// Base layer, one slice per row.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.base.chunks(self.width)
    }

    /// Base layer in row-major order.
    pub fn base_tiles(&self) -> &[Tile] {
        &self.base
    }

    pub fn fixture(&self, x: usize, y: usize) -> Option<&Tile> {
        self.fixtures.iter().find(|t| t.position() == (x, y))
    }

    pub fn entity(&self, x: usize, y: usize) -> Option<&Tile> {
        self.entities.iter().find(|t| t.position() == (x, y))
    }

    pub fn fixtures(&self) -> &[Tile] {
        &self.fixtures
    }

    pub fn entities(&self) -> &[Tile] {
        &self.entities
    }

    /// Tile on `layer` at `(x, y)`.
    pub fn tile_in(&self, layer: Layer, x: usize, y: usize) -> Option<&Tile> {
        match layer {
            Layer::Base => self.tile(x, y),
            Layer::Fixture => self.fixture(x, y),
            Layer::Entity => self.entity(x, y),
        }
    }

    fn tile_in_mut(&mut self, layer: Layer, x: usize, y: usize) -> Option<&mut Tile> {
        match layer {
            Layer::Base => {
                if x >= self.width || y >= self.height {
                    return None;
                }
                self.base.get_mut(y * self.width + x)
            }
            Layer::Fixture => self.fixtures.iter_mut().find(|t| t.position() == (x, y)),
            Layer::Entity => self.entities.iter_mut().find(|t| t.position() == (x, y)),
        }
    }

    fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.base
            .iter_mut()
            .chain(self.fixtures.iter_mut())
            .chain(self.entities.iter_mut())
    }

    /// Place `tile` at `(x, y)` on the layer matching its variant.
    ///
    /// Whatever occupied that cell on that layer is replaced, retired and
    /// returned. The tile must carry a sheet letter; a letter missing from
    /// the index table is accepted with a warning.
    pub fn stamp(&mut self, x: usize, y: usize, mut tile: Tile) -> Result<Option<Tile>, ZoneError> {
        self.check_bounds(x, y)?;
        let Some(letter) = tile.sheet() else {
            return Err(ZoneError::UnsetSheet(tile.to_string()));
        };
        if !self.sheet_index.contains_key(&letter) {
            warn!(
                "Zone '{}' ({},{}): sheet letter '{}' is not in the index table",
                self.name, x, y, letter
            );
        }
        tile.set_position(x, y);
        tile.set_zone_name(Some(self.name.clone()));
        let layer = tile.layer();
        let new = tile.mnemonic();

        let old = match layer {
            Layer::Base => {
                let i = y * self.width + x;
                Some(std::mem::replace(&mut self.base[i], tile))
            }
            Layer::Fixture => Self::replace_overlay(&mut self.fixtures, x, y, tile),
            Layer::Entity => Self::replace_overlay(&mut self.entities, x, y, tile),
        };
        let old = old.map(|mut t| {
            t.retire();
            t.set_zone_name(None);
            t
        });
        debug!(
            "Zone '{}' ({},{}) {}: {:?} -> {}",
            self.name,
            x,
            y,
            layer,
            old.as_ref().map(|t| t.mnemonic().to_string()),
            new
        );
        self.subscribers.notify(&ZoneEvent::TileSwapped {
            layer,
            x,
            y,
            old: old.as_ref().map(Tile::mnemonic),
            new,
        });
        Ok(old)
    }

    fn replace_overlay(list: &mut Vec<Tile>, x: usize, y: usize, tile: Tile) -> Option<Tile> {
        match list.iter().position(|t| t.position() == (x, y)) {
            Some(i) => Some(std::mem::replace(&mut list[i], tile)),
            None => {
                list.push(tile);
                None
            }
        }
    }

    fn remove_overlay(&mut self, layer: Layer, x: usize, y: usize) -> bool {
        let list = match layer {
            Layer::Fixture => &mut self.fixtures,
            Layer::Entity => &mut self.entities,
            Layer::Base => return false,
        };
        let Some(i) = list.iter().position(|t| t.position() == (x, y)) else {
            return false;
        };
        let mut old = list.remove(i);
        old.retire();
        old.set_zone_name(None);
        self.subscribers.notify(&ZoneEvent::TileRemoved {
            layer,
            x,
            y,
            old: old.mnemonic(),
        });
        true
    }

    /// Remove the fixture at `(x, y)`. Returns whether one was there.
    pub fn remove_fixture(&mut self, x: usize, y: usize) -> bool {
        self.remove_overlay(Layer::Fixture, x, y)
    }

    /// Remove the entity at `(x, y)`. Returns whether one was there.
    pub fn remove_entity(&mut self, x: usize, y: usize) -> bool {
        self.remove_overlay(Layer::Entity, x, y)
    }

    /// Edit a placed tile in place and raise `TileChanged`.
    ///
    /// Returns `None` when the cell is empty on that layer.
    pub fn update_tile<R>(
        &mut self,
        layer: Layer,
        x: usize,
        y: usize,
        f: impl FnOnce(&mut Tile) -> R,
    ) -> Option<R> {
        let tile = self.tile_in_mut(layer, x, y)?;
        let result = f(tile);
        self.subscribers
            .notify(&ZoneEvent::TileChanged { layer, x, y });
        Some(result)
    }

    /// Subscribe to swap/change/remove notifications.
    pub fn subscribe(&mut self) -> Receiver<ZoneEvent> {
        self.subscribers.subscribe()
    }

    /// Read a zone from `reader`.
    pub fn load(game: &dyn GameModel, reader: impl BufRead) -> Result<Self, ZoneError> {
        zonefile::load(game, reader)
    }

    pub fn load_str(game: &dyn GameModel, text: &str) -> Result<Self, ZoneError> {
        zonefile::parse(game, text)
    }

    pub fn load_file(game: &dyn GameModel, path: impl AsRef<Path>) -> Result<Self, ZoneError> {
        zonefile::load_file(game, path)
    }

    /// Write the zone in `.zone` format.
    pub fn store(&self, writer: impl Write) -> std::io::Result<()> {
        zonefile::store(self, writer)
    }

    pub fn store_file(&self, path: impl AsRef<Path>) -> Result<(), ZoneError> {
        zonefile::store_file(self, path)
    }

    pub fn to_zone_string(&self) -> String {
        zonefile::to_string(self)
    }
}
