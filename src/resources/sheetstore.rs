//! Sheet registry and the sheet-resolution seam used by zones.
//!
//! Zones never touch the file system to find an atlas. They resolve a sheet
//! uid through a [`GameModel`], which the surrounding application supplies.
//! [`SheetStore`] is the stock implementation: a map of loaded sheets by uid.

use std::path::Path;

use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::resources::sheetmodel::SheetModel;

/// Resolves sheet uids to loaded atlases.
pub trait GameModel {
    /// Sheet with the given uid, if loaded.
    fn sheet(&self, uid: u64) -> Option<&SheetModel>;

    /// Sheet used to fill new zones.
    fn default_sheet(&self) -> Option<&SheetModel>;
}

/// Registry of loaded sheets by uid.
#[derive(Debug, Default)]
pub struct SheetStore {
    pub map: FxHashMap<u64, SheetModel>,
    default_uid: Option<u64>,
}

impl SheetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        SheetStore {
            map: FxHashMap::default(),
            default_uid: None,
        }
    }

    /// Load every `*.png` in `dir` that has a sibling `.properties` file.
    ///
    /// Sheets that fail to load are logged and skipped. The sheet with the
    /// lowest file name becomes the default.
    pub fn load_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let mut pngs: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        pngs.sort();

        let mut store = Self::new();
        for png in pngs {
            match SheetModel::from_png(&png) {
                Ok(sheet) => store.insert(sheet),
                Err(e) => warn!("Skipping sheet {:?}: {}", png, e),
            }
        }
        info!("Loaded {} sheet(s) from {:?}", store.len(), dir);
        Ok(store)
    }

    /// Get a sheet by uid.
    pub fn get(&self, uid: u64) -> Option<&SheetModel> {
        self.map.get(&uid)
    }

    pub fn get_mut(&mut self, uid: u64) -> Option<&mut SheetModel> {
        self.map.get_mut(&uid)
    }

    /// Insert a sheet under its uid. The first sheet inserted becomes the
    /// default.
    pub fn insert(&mut self, sheet: SheetModel) {
        let uid = sheet.uid();
        if let Some(old) = self.map.insert(uid, sheet) {
            warn!("Sheet uid:{} '{}' replaced by a newer load", uid, old.name());
        }
        if self.default_uid.is_none() {
            self.default_uid = Some(uid);
        }
    }

    /// Make `uid` the default sheet. Returns false when it is not loaded.
    pub fn set_default(&mut self, uid: u64) -> bool {
        if !self.map.contains_key(&uid) {
            return false;
        }
        self.default_uid = Some(uid);
        true
    }

    /// Loaded uids in ascending order.
    pub fn uids(&self) -> Vec<u64> {
        let mut uids: Vec<u64> = self.map.keys().copied().collect();
        uids.sort_unstable();
        uids
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear all loaded sheets.
    pub fn clear(&mut self) {
        self.map.clear();
        self.default_uid = None;
    }
}

impl GameModel for SheetStore {
    fn sheet(&self, uid: u64) -> Option<&SheetModel> {
        self.get(uid)
    }

    fn default_sheet(&self) -> Option<&SheetModel> {
        self.default_uid.and_then(|uid| self.get(uid))
    }
}
