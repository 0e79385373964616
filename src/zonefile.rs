//! `.zone` text format.
//!
//! ```text
//! # name: Cave Entrance
//! # Sheet map
//! IDX:A:42
//!
//! # Base Tiles
//! A000 A000
//! A000 A001
//!
//! # Base Tile Flags
//! base.0 =
//! base.1 = B:DWall
//!
//! base.2 =
//! base.3 =
//!
//! # Fixture Tile Flags
//! item.1 = A005:W10
//!
//! # Entity Tile Flags
//! entity.3 = A006:C3
//! ```
//!
//! Cell keys use the row-major index `y * width + x`. Base flags are written
//! for every cell; overlay keys only for occupied cells. Everything after the
//! base grid is a [`PropertyBlock`], so stored values have their backslashes
//! escaped.
//!
//! Loading is lenient past the structural checks: cells that cannot be
//! resolved, malformed flags and overlays of the wrong kind are logged and
//! skipped, so one bad cell never blocks an otherwise readable map.

use std::io::{BufRead, Read, Write};
use std::path::Path;

use log::{debug, error, info, trace, warn};
use rustc_hash::FxHashMap;

use crate::components::mnemonic::{Mnemonic, is_sheet_letter};
use crate::components::tile::{Layer, Tile, TileVariant};
use crate::error::{ZoneError, ZoneFormatError};
use crate::properties::{PropertyBlock, escape};
use crate::resources::sheetstore::GameModel;
use crate::resources::zone::{DEFAULT_NAME, Zone, resolve_template};

const NAME_PREFIX: &str = "# name:";
const SHEET_MAP_HEADER: &str = "# Sheet map";
const IDX_PREFIX: &str = "IDX";
const BASE_TILES_HEADER: &str = "# Base Tiles";
const BASE_FLAGS_HEADER: &str = "# Base Tile Flags";
const FIXTURE_FLAGS_HEADER: &str = "# Fixture Tile Flags";
const ENTITY_FLAGS_HEADER: &str = "# Entity Tile Flags";

/// Read a whole zone from `reader`.
pub fn load(game: &dyn GameModel, mut reader: impl BufRead) -> Result<Zone, ZoneError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse(game, &text)
}

/// Read a zone from a file. A missing file is a [`ZoneError::Io`].
pub fn load_file(game: &dyn GameModel, path: impl AsRef<Path>) -> Result<Zone, ZoneError> {
    let path = path.as_ref();
    info!("Loading zone {:?}", path);
    let text = std::fs::read_to_string(path)?;
    parse(game, &text)
}

fn parse_idx_line(line: &str) -> Option<(char, u64)> {
    let mut parts = line.split(':').map(str::trim);
    if parts.next() != Some(IDX_PREFIX) {
        return None;
    }
    let letter = parts.next()?;
    let mut chars = letter.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return None;
    };
    if !is_sheet_letter(letter) {
        return None;
    }
    let uid = parts.next()?.parse().ok()?;
    Some((letter, uid))
}

fn starts_with_sheet_letter(line: &str) -> bool {
    line.chars().next().is_some_and(is_sheet_letter)
}

/// Parse zone text.
pub fn parse(game: &dyn GameModel, text: &str) -> Result<Zone, ZoneError> {
    let mut lines = text.lines().peekable();

    // 1. Name.
    let name = loop {
        let Some(line) = lines.next() else {
            error!("Zone file does not have '{}' defined", NAME_PREFIX);
            return Err(ZoneFormatError::MissingName.into());
        };
        if let Some(rest) = line.strip_prefix(NAME_PREFIX) {
            break rest.trim().to_string();
        }
    };
    let name = if name.is_empty() {
        warn!("Zone file has an empty name, using '{}'", DEFAULT_NAME);
        DEFAULT_NAME.to_string()
    } else {
        name
    };
    info!("Reading zone '{}'", name);

    // 2. Sheet index table.
    loop {
        match lines.peek() {
            None => return Err(ZoneFormatError::MissingIndexTable.into()),
            Some(line) if line.starts_with(BASE_TILES_HEADER) => {
                return Err(ZoneFormatError::MissingIndexTable.into());
            }
            Some(line) if line.starts_with(IDX_PREFIX) => break,
            Some(_) => {
                lines.next();
            }
        }
    }
    let mut sheet_index = FxHashMap::default();
    while let Some(line) = lines.next_if(|l| l.starts_with(IDX_PREFIX)) {
        match parse_idx_line(line) {
            Some((letter, uid)) => {
                debug!("Zone '{}': IDX {} -> {}", name, letter, uid);
                sheet_index.insert(letter, uid);
            }
            None => warn!("Zone '{}': skipping malformed index line '{}'", name, line),
        }
    }
    if sheet_index.is_empty() {
        return Err(ZoneFormatError::MissingIndexTable.into());
    }

    // 3. Base grid.
    loop {
        match lines.next() {
            None => return Err(ZoneFormatError::MissingBaseTiles.into()),
            Some(line) if line.starts_with(BASE_TILES_HEADER) => break,
            Some(_) => {}
        }
    }
    let mut rows: Vec<Vec<&str>> = Vec::new();
    while let Some(line) = lines.next_if(|l| starts_with_sheet_letter(l)) {
        rows.push(line.split_whitespace().collect());
    }
    if rows.is_empty() {
        return Err(ZoneFormatError::EmptyBaseTiles.into());
    }

    // 4. Properties.
    let rest: String = lines.flat_map(|l| [l, "\n"]).collect();
    let props = PropertyBlock::parse(&rest).map_err(ZoneFormatError::Properties)?;
    debug!("Zone '{}': {} properties", name, props.len());

    let builder = ZoneBuilder {
        game,
        name: &name,
        sheet_index: &sheet_index,
        width: rows[0].len(),
        height: rows.len(),
    };
    let base = builder.base_layer(&rows, &props);
    let fixtures = builder.overlay(Layer::Fixture, &props);
    let entities = builder.overlay(Layer::Entity, &props);
    info!(
        "Zone '{}' {}x{}: {} fixtures, {} entities",
        name,
        builder.width,
        builder.height,
        fixtures.len(),
        entities.len()
    );
    let (width, height) = (builder.width, builder.height);
    Ok(Zone::from_parts(
        name,
        width,
        height,
        base,
        fixtures,
        entities,
        sheet_index,
    ))
}

/// Shared state while turning parsed text into tiles.
struct ZoneBuilder<'a> {
    game: &'a dyn GameModel,
    name: &'a str,
    sheet_index: &'a FxHashMap<char, u64>,
    width: usize,
    height: usize,
}

impl ZoneBuilder<'_> {
    fn place(&self, tile: &mut Tile, x: usize, y: usize) {
        tile.set_position(x, y);
        tile.set_zone_name(Some(self.name.to_string()));
    }

    /// Mnemonic used for cells whose token is missing or unreadable.
    fn fallback_mnemonic(&self) -> Mnemonic {
        let letter = self.sheet_index.keys().min().copied().unwrap_or('A');
        Mnemonic::new(letter, 0).unwrap_or(Mnemonic::unset(0))
    }

    fn base_layer(&self, rows: &[Vec<&str>], props: &PropertyBlock) -> Vec<Tile> {
        let mut base = Vec::with_capacity(self.width * self.height);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != self.width {
                warn!(
                    "Zone '{}': base row {} has {} cells, expected {}",
                    self.name,
                    y,
                    row.len(),
                    self.width
                );
            }
            for x in 0..self.width {
                let mut tile = self.base_tile(row.get(x).copied(), x, y);
                self.place(&mut tile, x, y);
                let key = format!("{}{}", Layer::Base.prop_prefix(), y * self.width + x);
                if let Some(encoded) = props.get(&key) {
                    tile.apply_flags(encoded);
                }
                base.push(tile);
            }
        }
        base
    }

    fn base_tile(&self, token: Option<&str>, x: usize, y: usize) -> Tile {
        let mnemonic = match token.map(str::parse::<Mnemonic>) {
            Some(Ok(m)) if m.sheet().is_some() => m,
            Some(Ok(_)) | Some(Err(_)) => {
                warn!(
                    "Zone '{}' ({},{}): bad base tile '{}'",
                    self.name,
                    x,
                    y,
                    token.unwrap_or_default()
                );
                return Tile::map(self.fallback_mnemonic());
            }
            None => return Tile::map(self.fallback_mnemonic()),
        };
        let Some(letter) = mnemonic.sheet() else {
            return Tile::map(mnemonic);
        };
        match resolve_template(self.game, self.sheet_index, letter, mnemonic.index()) {
            Ok((_, template)) if template.variant() == TileVariant::Map => {
                let mut tile = template.instantiate();
                let _ = tile.set_sheet(letter);
                tile
            }
            Ok((sheet, template)) => {
                debug!(
                    "Zone '{}' ({},{}): {} is a {} template, used as a map tile",
                    self.name,
                    x,
                    y,
                    mnemonic,
                    template.variant().name()
                );
                let mut tile =
                    Tile::from_flags(TileVariant::Map, mnemonic, sheet.props_for(mnemonic.index()));
                tile.pin_defaults();
                tile
            }
            Err(e) => {
                warn!(
                    "Zone '{}' ({},{}): cannot resolve {}: {}",
                    self.name, x, y, mnemonic, e
                );
                Tile::map(mnemonic)
            }
        }
    }

    /// Collect `item.<i>` or `entity.<i>` entries in index order.
    fn overlay(&self, layer: Layer, props: &PropertyBlock) -> Vec<Tile> {
        let prefix = layer.prop_prefix();
        let cells = self.width * self.height;
        let mut entries: Vec<(usize, &str)> = props
            .iter()
            .filter_map(|(key, value)| {
                let raw = key.strip_prefix(prefix)?;
                match raw.trim().parse::<usize>() {
                    Ok(i) if i < cells => Some((i, value)),
                    _ => {
                        warn!(
                            "Zone '{}': ignoring {} key '{}' outside the {}x{} grid",
                            self.name, layer, key, self.width, self.height
                        );
                        None
                    }
                }
            })
            .collect();
        entries.sort_unstable_by_key(|(i, _)| *i);

        entries
            .into_iter()
            .filter_map(|(i, value)| self.overlay_tile(layer, i % self.width, i / self.width, value))
            .collect()
    }

    fn overlay_tile(&self, layer: Layer, x: usize, y: usize, value: &str) -> Option<Tile> {
        let value = value.trim();
        if value.is_empty() {
            trace!("Zone '{}' ({},{}): empty {} entry", self.name, x, y, layer);
            return None;
        }
        let (token, encoded) = value.split_once(':').unwrap_or((value, ""));
        let mnemonic = match token.parse::<Mnemonic>() {
            Ok(m) if m.sheet().is_some() => m,
            _ => {
                warn!(
                    "Zone '{}' ({},{}): bad {} tile '{}'",
                    self.name, x, y, layer, token
                );
                return None;
            }
        };
        let expected = TileVariant::for_layer(layer);
        let letter = mnemonic.sheet()?;
        let mut tile =
            match resolve_template(self.game, self.sheet_index, letter, mnemonic.index()) {
                Ok((_, template)) if template.variant() == expected => {
                    let mut tile = template.instantiate();
                    let _ = tile.set_sheet(letter);
                    tile
                }
                Ok((_, template)) => {
                    warn!(
                        "Zone '{}' ({},{}): {} is a {}, expected a {}; cell left empty",
                        self.name,
                        x,
                        y,
                        mnemonic,
                        template.variant().name(),
                        expected.name()
                    );
                    return None;
                }
                Err(e) => {
                    warn!(
                        "Zone '{}' ({},{}): cannot resolve {}: {}",
                        self.name, x, y, mnemonic, e
                    );
                    Tile::new(expected, mnemonic)
                }
            };
        self.place(&mut tile, x, y);
        tile.apply_flags(encoded);
        Some(tile)
    }
}

/// Write `zone` in `.zone` format.
pub fn store(zone: &Zone, mut w: impl Write) -> std::io::Result<()> {
    let width = zone.width();
    writeln!(w, "{} {}", NAME_PREFIX, zone.name())?;
    writeln!(w, "{}", SHEET_MAP_HEADER)?;
    for (letter, uid) in zone.sorted_sheet_index() {
        writeln!(w, "{}:{}:{}", IDX_PREFIX, letter, uid)?;
    }
    writeln!(w)?;

    writeln!(w, "{}", BASE_TILES_HEADER)?;
    for row in zone.rows() {
        let tokens: Vec<String> = row.iter().map(|t| t.mnemonic().to_string()).collect();
        writeln!(w, "{}", tokens.join(" "))?;
    }
    writeln!(w)?;

    writeln!(w, "{}", BASE_FLAGS_HEADER)?;
    for (y, row) in zone.rows().enumerate() {
        for (x, tile) in row.iter().enumerate() {
            let line = format!(
                "{}{} = {}",
                Layer::Base.prop_prefix(),
                y * width + x,
                escape(&tile.flags())
            );
            writeln!(w, "{}", line.trim_end())?;
        }
        writeln!(w)?;
    }

    for (header, layer, tiles) in [
        (FIXTURE_FLAGS_HEADER, Layer::Fixture, zone.fixtures()),
        (ENTITY_FLAGS_HEADER, Layer::Entity, zone.entities()),
    ] {
        writeln!(w, "{}", header)?;
        let mut sorted: Vec<&Tile> = tiles.iter().collect();
        sorted.sort_by_key(|t| (t.y(), t.x()));
        for tile in sorted {
            let i = tile.y() * width + tile.x();
            let encoded = escape(&tile.flags());
            if encoded.is_empty() {
                writeln!(w, "{}{} = {}", layer.prop_prefix(), i, tile.mnemonic())?;
            } else {
                writeln!(w, "{}{} = {}:{}", layer.prop_prefix(), i, tile.mnemonic(), encoded)?;
            }
        }
        writeln!(w)?;
    }
    w.flush()
}

/// Write `zone` to `path`, creating or replacing the file.
pub fn store_file(zone: &Zone, path: impl AsRef<Path>) -> Result<(), ZoneError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    store(zone, std::io::BufWriter::new(file))?;
    info!("Stored zone '{}' to {:?}", zone.name(), path);
    Ok(())
}

/// Render `zone` in `.zone` format.
pub fn to_string(zone: &Zone) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = store(zone, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tileproperty::PropertyKey;
    use crate::resources::sheetmodel::SheetModel;
    use crate::resources::sheetstore::SheetStore;

    fn game() -> SheetStore {
        let block = PropertyBlock::parse(
            "uid = 42\nflags.1 = B:DWall\nflags.5 = W10\nflags.6 = C3\n",
        )
        .unwrap();
        let mut store = SheetStore::new();
        store.insert(SheetModel::from_properties("test", None, block, (64, 64)).unwrap());
        store
    }

    const SIMPLE: &str = "# name: Cave\n# Sheet map\nIDX:A:42\n\n# Base Tiles\nA000 A000\nA000 A001\n\n";

    #[test]
    fn test_parse_idx_line() {
        assert_eq!(parse_idx_line("IDX:A:42"), Some(('A', 42)));
        assert_eq!(parse_idx_line("IDX:B: 7"), Some(('B', 7)));
        assert_eq!(parse_idx_line("IDX:a:42"), None);
        assert_eq!(parse_idx_line("IDX:AB:42"), None);
        assert_eq!(parse_idx_line("IDX:A:x"), None);
        assert_eq!(parse_idx_line("IDX:A"), None);
    }

    #[test]
    fn test_parse_minimal() {
        let game = game();
        let zone = parse(&game, SIMPLE).unwrap();
        assert_eq!(zone.name(), "Cave");
        assert_eq!((zone.width(), zone.height()), (2, 2));
        let wall = zone.tile(1, 1).unwrap();
        assert_eq!(wall.mnemonic().to_string(), "A001");
        assert_eq!(wall.blocking(), 99);
        assert_eq!(wall.description(), "Wall");
        assert_eq!(wall.position(), (1, 1));
        assert_eq!(wall.zone_name(), Some("Cave"));
    }

    #[test]
    fn test_base_flags_override_template() {
        let game = game();
        let text = format!("{SIMPLE}base.3 = B5:L9\nbase.0 = F3\n");
        let zone = parse(&game, &text).unwrap();
        assert_eq!(zone.tile(1, 1).unwrap().blocking(), 5);
        assert_eq!(zone.tile(1, 1).unwrap().luminous(), 9);
        assert_eq!(zone.tile(0, 0).unwrap().sound(), 3);
    }

    #[test]
    fn test_format_errors() {
        let game = game();
        let cases = [
            ("IDX:A:42\n# Base Tiles\nA000\n", ZoneFormatError::MissingName),
            ("# name: x\n# Base Tiles\nA000\n", ZoneFormatError::MissingIndexTable),
            ("# name: x\nIDX:A:42\nA000\n", ZoneFormatError::MissingBaseTiles),
            ("# name: x\nIDX:A:42\n# Base Tiles\n\nbase.0 =\n", ZoneFormatError::EmptyBaseTiles),
            ("# name: x\nIDX:zz\n# Base Tiles\nA000\n", ZoneFormatError::MissingIndexTable),
        ];
        for (text, expected) in cases {
            match parse(&game, text) {
                Err(ZoneError::Format(e)) => assert_eq!(e, expected, "{text:?}"),
                other => panic!("{text:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_unresolved_cells_are_kept() {
        let game = game();
        let text = "# name: x\nIDX:A:42\nIDX:B:999\n# Base Tiles\nA000 B003 C001 A900\n";
        let zone = parse(&game, text).unwrap();
        assert_eq!(zone.width(), 4);
        let tokens: Vec<String> = zone.rows().next().unwrap().iter().map(|t| t.mnemonic().to_string()).collect();
        assert_eq!(tokens, ["A000", "B003", "C001", "A900"]);
        assert!(zone.base_tiles().iter().all(|t| t.variant() == TileVariant::Map));
    }

    #[test]
    fn test_ragged_rows_are_padded_and_truncated() {
        let game = game();
        let text = "# name: x\nIDX:A:42\n# Base Tiles\nA001 A001 A001\nA001\nA001 A001 A001 A001\n";
        let zone = parse(&game, text).unwrap();
        assert_eq!((zone.width(), zone.height()), (3, 3));
        assert_eq!(zone.tile(2, 1).unwrap().mnemonic().to_string(), "A000");
        assert_eq!(zone.tile(2, 2).unwrap().mnemonic().to_string(), "A001");
        assert_eq!(zone.base_tiles().len(), 9);
    }

    #[test]
    fn test_overlays_and_mismatch() {
        let game = game();
        let text = format!(
            "{SIMPLE}item.1 = A005:W20:DSword\nitem.2 = A006:C1\nentity.3 = A006\nentity.0 = A005\nitem.9 = A005\n"
        );
        let zone = parse(&game, &text).unwrap();
        assert_eq!(zone.fixtures().len(), 1);
        let sword = zone.fixture(1, 0).unwrap();
        assert_eq!(sword.value(PropertyKey::Weapon), Some(20));
        assert_eq!(sword.description(), "Sword");
        assert_eq!(zone.entities().len(), 1);
        assert_eq!(zone.entity(1, 1).unwrap().value(PropertyKey::Npc), Some(3));
        assert!(zone.fixture(0, 1).is_none());
        assert!(zone.entity(0, 0).is_none());
    }

    #[test]
    fn test_store_layout() {
        let game = game();
        let mut zone = parse(&game, SIMPLE).unwrap();
        let tile = zone.instantiate(&game, 'A', 5).unwrap();
        zone.stamp(1, 0, tile).unwrap();
        let text = to_string(&zone);
        let expected = "\
# name: Cave
# Sheet map
IDX:A:42

# Base Tiles
A000 A000
A000 A001

# Base Tile Flags
base.0 =
base.1 =

base.2 =
base.3 = B99:DWall

# Fixture Tile Flags
item.1 = A005:W10

# Entity Tile Flags

";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_store_escapes_backslashes() {
        let game = game();
        let mut zone = parse(&game, SIMPLE).unwrap();
        zone.update_tile(Layer::Base, 0, 0, |t| t.set_description(r"C:\temp\new"));
        let text = to_string(&zone);
        assert!(text.contains(r"base.0 = DC \\temp\\new"), "{text}");
        let back = parse(&game, &text).unwrap();
        assert_eq!(back.tile(0, 0).unwrap().description(), r"C \temp\new");
    }

    #[test]
    fn test_store_then_parse() {
        let game = game();
        let mut zone = parse(&game, SIMPLE).unwrap();
        zone.set_sheet_key('B', 42).unwrap();
        let tile = zone.instantiate(&game, 'B', 6).unwrap();
        zone.stamp(0, 1, tile).unwrap();
        zone.update_tile(Layer::Base, 0, 0, |t| t.set_description("start"));

        let back = parse(&game, &to_string(&zone)).unwrap();
        assert_eq!(back.sorted_sheet_index(), zone.sorted_sheet_index());
        assert_eq!(back.tile(0, 0).unwrap().description(), "start");
        let npc = back.entity(0, 1).unwrap();
        assert_eq!(npc.mnemonic().to_string(), "B006");
        assert_eq!(npc.value(PropertyKey::Npc), Some(3));
        assert_eq!(to_string(&back), to_string(&zone));
    }
}
