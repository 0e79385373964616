//! Tile atlas model.
//!
//! A [`SheetModel`] is one PNG atlas of uniform square cells plus a sibling
//! `.properties` file:
//!
//! ```text
//! uid = 5839201938475
//! size = 16
//! name = Caves
//! author = mark
//! flags.12 = B:DCave wall
//! flags.40 = W10:Dsword
//! ```
//!
//! `width`/`height` in the properties file are advisory; the geometry always
//! comes from the image. Every cell gets a template [`Tile`] built from its
//! `flags.<index>` string. Templates are shared and must be instantiated
//! before placement.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::components::mnemonic::{Mnemonic, atlas_cell};
use crate::components::tile::{Tile, TileVariant};
use crate::error::SheetError;
use crate::properties::PropertyBlock;

/// Default cell size in pixels when the properties file has none.
pub const DEFAULT_TILE_SIZE: u32 = 16;
const DEFAULT_AUTHOR: &str = "Unknown";
const FLAGS_PREFIX: &str = "flags.";

/// Sibling properties file for an atlas image: `caves.png` → `caves.properties`.
pub fn properties_path_for(png: &Path) -> PathBuf {
    png.with_extension("properties")
}

fn invalid(key: &'static str) -> impl Fn(String) -> SheetError {
    move |value| SheetError::InvalidValue {
        key: key.to_string(),
        value,
    }
}

/// One tile atlas and its per-cell default flags.
#[derive(Debug)]
pub struct SheetModel {
    uid: u64,
    size: u32,
    width: u32,
    height: u32,
    name: String,
    author: String,
    path: Option<PathBuf>,
    image_size: (u32, u32),
    properties: PropertyBlock,
    tiles: Vec<Tile>,
}

impl SheetModel {
    /// Load an on-disk atlas and its sibling `.properties` file.
    pub fn from_png(png: impl AsRef<Path>) -> Result<Self, SheetError> {
        let png = png.as_ref();
        info!("Loading sheet {:?}", png);
        let props_path = properties_path_for(png);
        let text = std::fs::read_to_string(&props_path).map_err(|source| SheetError::Io {
            path: props_path.clone(),
            source,
        })?;
        let properties = PropertyBlock::parse(&text).map_err(SheetError::Properties)?;
        let image_size = image::image_dimensions(png)?;
        let fallback = png
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_properties(&fallback, Some(png.to_path_buf()), properties, image_size)
    }

    /// Build an atlas from embedded bytes (a packaged game resource).
    pub fn from_resource(name: &str, png: &[u8], properties: &str) -> Result<Self, SheetError> {
        let image_size = image::io::Reader::new(Cursor::new(png))
            .with_guessed_format()
            .map_err(|source| SheetError::Io {
                path: PathBuf::from(name),
                source,
            })?
            .into_dimensions()?;
        let properties = PropertyBlock::parse(properties).map_err(SheetError::Properties)?;
        Self::from_properties(name, None, properties, image_size)
    }

    /// Build an atlas from already-parsed properties and the image's pixel size.
    ///
    /// `fallback_name` is used when the properties have no `name`.
    pub fn from_properties(
        fallback_name: &str,
        path: Option<PathBuf>,
        properties: PropertyBlock,
        image_size: (u32, u32),
    ) -> Result<Self, SheetError> {
        let uid = properties.get_parsed::<u64>("uid").map_err(invalid("uid"))?.unwrap_or(0);
        let size = properties
            .get_parsed::<u32>("size")
            .map_err(invalid("size"))?
            .unwrap_or(DEFAULT_TILE_SIZE);
        if size == 0 {
            return Err(SheetError::InvalidValue {
                key: "size".to_string(),
                value: "0".to_string(),
            });
        }
        let name = properties
            .get("name")
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(fallback_name)
            .to_string();
        let author = properties
            .get("author")
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(DEFAULT_AUTHOR)
            .to_string();

        let (px_w, px_h) = image_size;
        let width = px_w / size;
        let height = px_h / size;
        if px_w % size != 0 {
            warn!(
                "Image width for sheet '{}' is not a multiple of size:{}, so it might look 'off'.",
                name, size
            );
        }
        if px_h % size != 0 {
            warn!(
                "Image height for sheet '{}' is not a multiple of size:{}, so it might look 'off'.",
                name, size
            );
        }
        for (key, actual) in [("width", width), ("height", height)] {
            if let Ok(Some(declared)) = properties.get_parsed::<u32>(key) {
                if declared != actual {
                    debug!(
                        "Sheet '{}' declares {}={} but the image gives {}",
                        name, key, declared, actual
                    );
                }
            }
        }

        let tiles = (0..width * height)
            .map(|index| {
                let flags = properties
                    .get(&format!("{FLAGS_PREFIX}{index}"))
                    .unwrap_or_default();
                Tile::from_flags(TileVariant::classify(flags), Mnemonic::unset(index), flags)
            })
            .collect();

        info!(
            "Sheet '{}' uid:{} is {}x{} tiles of {}px",
            name, uid, width, height, size
        );
        Ok(Self {
            uid,
            size,
            width,
            height,
            name,
            author,
            path,
            image_size,
            properties,
            tiles,
        })
    }

    /// Write a starter `.properties` file next to `png`, then load the sheet.
    pub fn create_sheet(
        png: impl AsRef<Path>,
        name: &str,
        uid: u64,
        size: u32,
        author: &str,
    ) -> Result<Self, SheetError> {
        let png = png.as_ref();
        let mut props = PropertyBlock::new();
        props.set("name", name);
        props.set("size", size.to_string());
        props.set("author", author);
        props.set("uid", uid.to_string());
        let props_path = properties_path_for(png);
        props.save(&props_path).map_err(|source| SheetError::Io {
            path: props_path.clone(),
            source,
        })?;
        info!("Created properties file for: {:?}", props_path);
        Self::from_png(png)
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Cell size in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Changes the recorded cell size only; geometry is not recomputed.
    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Atlas width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Atlas height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_count(&self) -> u32 {
        self.width * self.height
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    /// Image path for sheets loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Image size in pixels.
    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    /// Shared template tile for atlas cell `index`.
    pub fn tile(&self, index: u32) -> Option<&Tile> {
        self.tiles.get(index as usize)
    }

    /// Template tile at atlas column/row.
    pub fn tile_at(&self, cx: u32, cy: u32) -> Option<&Tile> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        self.tile(cy * self.width + cx)
    }

    /// Independent copy of the template at `index`, ready to be stamped.
    pub fn instantiate(&self, index: u32) -> Option<Tile> {
        self.tile(index).map(Tile::instantiate)
    }

    /// Raw default flag string for cell `index`; empty when none.
    pub fn props_for(&self, index: u32) -> &str {
        self.properties
            .get(&format!("{FLAGS_PREFIX}{index}"))
            .unwrap_or_default()
    }

    /// Atlas column/row of cell `index`.
    pub fn cell_of(&self, index: u32) -> (u32, u32) {
        atlas_cell(index, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tileproperty::PropertyKey;

    fn props(text: &str) -> PropertyBlock {
        PropertyBlock::parse(text).unwrap()
    }

    #[test]
    fn test_geometry_from_image() {
        let sheet = SheetModel::from_properties(
            "test",
            None,
            props("uid = 42\nsize = 16\nname = Caves\nauthor = mark\n"),
            (128, 64),
        )
        .unwrap();
        assert_eq!(sheet.uid(), 42);
        assert_eq!(sheet.width(), 8);
        assert_eq!(sheet.height(), 4);
        assert_eq!(sheet.tile_count(), 32);
        assert_eq!(sheet.name(), "Caves");
        assert_eq!(sheet.author(), "mark");
    }

    #[test]
    fn test_defaults_when_keys_missing() {
        let sheet = SheetModel::from_properties("fallback", None, props(""), (40, 33)).unwrap();
        assert_eq!(sheet.uid(), 0);
        assert_eq!(sheet.size(), DEFAULT_TILE_SIZE);
        assert_eq!(sheet.name(), "fallback");
        assert_eq!(sheet.author(), "Unknown");
        // Non-multiple image sizes are tolerated.
        assert_eq!((sheet.width(), sheet.height()), (2, 2));
    }

    #[test]
    fn test_advisory_geometry_is_ignored() {
        let sheet =
            SheetModel::from_properties("s", None, props("width = 10\nheight = 10\n"), (32, 16))
                .unwrap();
        assert_eq!((sheet.width(), sheet.height()), (2, 1));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SheetModel::from_properties("s", None, props("uid = abc\n"), (16, 16)).unwrap_err();
        assert!(matches!(err, SheetError::InvalidValue { ref key, .. } if key == "uid"));
        let err = SheetModel::from_properties("s", None, props("size = 0\n"), (16, 16)).unwrap_err();
        assert!(matches!(err, SheetError::InvalidValue { ref key, .. } if key == "size"));
    }

    #[test]
    fn test_templates_from_flags() {
        let sheet = SheetModel::from_properties(
            "s",
            None,
            props("flags.1 = B:DWall\nflags.2 = W10\nflags.3 = C4\n"),
            (64, 16),
        )
        .unwrap();
        assert_eq!(sheet.props_for(0), "");
        assert_eq!(sheet.props_for(1), "B:DWall");

        let wall = sheet.tile(1).unwrap();
        assert_eq!(wall.variant(), TileVariant::Map);
        assert_eq!(wall.blocking(), 99);
        assert_eq!(wall.description(), "Wall");
        assert_eq!(wall.sheet(), None);
        assert_eq!(wall.index(), 1);

        assert_eq!(sheet.tile(2).unwrap().variant(), TileVariant::Fixture);
        assert_eq!(sheet.tile(3).unwrap().variant(), TileVariant::Entity);
        assert!(sheet.tile(4).is_none());
    }

    #[test]
    fn test_tile_addressing() {
        let sheet = SheetModel::from_properties("s", None, props(""), (64, 48)).unwrap();
        for index in 0..sheet.tile_count() {
            let (cx, cy) = sheet.cell_of(index);
            assert_eq!(cx, index % sheet.width());
            assert_eq!(cy, index / sheet.width());
            assert_eq!(sheet.tile_at(cx, cy).unwrap().index(), index);
        }
        assert!(sheet.tile_at(4, 0).is_none());
    }

    #[test]
    fn test_instantiate_is_independent() {
        let sheet = SheetModel::from_properties("s", None, props("flags.0 = W10\n"), (16, 16)).unwrap();
        let mut placed = sheet.instantiate(0).unwrap();
        placed.set_value(PropertyKey::Weapon, 99);
        assert_eq!(sheet.tile(0).unwrap().value(PropertyKey::Weapon), Some(10));
    }

    #[test]
    fn test_setters_do_not_touch_geometry() {
        let mut sheet = SheetModel::from_properties("s", None, props(""), (64, 64)).unwrap();
        sheet.set_size(32);
        sheet.set_name("Renamed");
        sheet.set_author("someone");
        assert_eq!(sheet.size(), 32);
        assert_eq!((sheet.width(), sheet.height()), (4, 4));
        assert_eq!(sheet.name(), "Renamed");
    }

    #[test]
    fn test_properties_path_for() {
        assert_eq!(
            properties_path_for(Path::new("sheets/caves.png")),
            PathBuf::from("sheets/caves.properties")
        );
    }
}
