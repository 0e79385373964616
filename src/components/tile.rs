//! Tiles: positioned references to an atlas cell carrying game properties.
//!
//! A single [`Tile`] type covers the three layers of a zone. The
//! [`TileVariant`] decides which properties a tile carries and which flag
//! codes it understands:
//!
//! | variant   | layer   | extra flags (after `B`, `L`, `F`) |
//! |-----------|---------|-----------------------------------|
//! | `Map`     | base    | none                              |
//! | `Fixture` | fixture | `T` `U` `W` `A` `I` `S`           |
//! | `Entity`  | entity  | `C` `E` `R` `U`                   |
//!
//! The flag tables are plain data ([`TileVariant::keys`]); parsing walks the
//! table instead of dispatching per variant.
//!
//! Tiles owned by a sheet are shared templates. Use [`Tile::instantiate`] to
//! get an independent copy before placing one in a zone.

use std::fmt;

use crossbeam_channel::Receiver;
use log::{debug, error, trace, warn};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::components::flags::{self, DESCRIPTION_CODE, Fragment};
use crate::components::mnemonic::Mnemonic;
use crate::components::tileproperty::{
    IntegerTileProperty, MAX_PERCENT, PropertyKey, TileProperty, UNSET,
};
use crate::error::MnemonicError;
use crate::events::Subscribers;
use crate::events::tile::TileEvent;

/// Properties every tile carries, in canonical encoding order.
pub const COMMON_KEYS: &[PropertyKey] = &[
    PropertyKey::Blocking,
    PropertyKey::Luminous,
    PropertyKey::Sound,
];

const FIXTURE_KEYS: &[PropertyKey] = &[
    PropertyKey::Track,
    PropertyKey::Umbra,
    PropertyKey::Weapon,
    PropertyKey::Ablation,
    PropertyKey::Inventory,
    PropertyKey::Storage,
];

const ENTITY_KEYS: &[PropertyKey] = &[
    PropertyKey::Npc,
    PropertyKey::Enemy,
    PropertyKey::Rolling,
    PropertyKey::Umbra,
];

/// Flag codes that mark a sheet cell as an entity.
const ENTITY_CODES: &[char] = &['C', 'E', 'R'];
/// Flag codes that mark a sheet cell as a fixture. `N` is "other non-map".
const FIXTURE_CODES: &[char] = &['A', 'I', 'N', 'S', 'T', 'U', 'W'];

/// Replace the characters a flag string cannot hold with spaces.
fn flag_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            flags::SEPARATOR | '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

/// Zone layer a tile lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Base,
    Fixture,
    Entity,
}

impl Layer {
    /// Key prefix used for this layer in the zone properties block.
    pub const fn prop_prefix(self) -> &'static str {
        match self {
            Layer::Base => "base.",
            Layer::Fixture => "item.",
            Layer::Entity => "entity.",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Base => "base",
            Layer::Fixture => "fixture",
            Layer::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// Kind of tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileVariant {
    /// Base-layer ground tile.
    Map,
    /// Overlay object: pickups, weapons, storage, track, drop shadows.
    Fixture,
    /// Mobile actor: NPC, enemy, rolling entity.
    Entity,
}

impl TileVariant {
    pub const fn layer(self) -> Layer {
        match self {
            TileVariant::Map => Layer::Base,
            TileVariant::Fixture => Layer::Fixture,
            TileVariant::Entity => Layer::Entity,
        }
    }

    pub const fn for_layer(layer: Layer) -> Self {
        match layer {
            Layer::Base => TileVariant::Map,
            Layer::Fixture => TileVariant::Fixture,
            Layer::Entity => TileVariant::Entity,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TileVariant::Map => "MapTile",
            TileVariant::Fixture => "FixtureTile",
            TileVariant::Entity => "EntityTile",
        }
    }

    /// Variant-specific properties, in canonical encoding order.
    pub const fn extra_keys(self) -> &'static [PropertyKey] {
        match self {
            TileVariant::Map => &[],
            TileVariant::Fixture => FIXTURE_KEYS,
            TileVariant::Entity => ENTITY_KEYS,
        }
    }

    /// Full flag table: common keys then variant keys.
    pub fn keys(self) -> impl Iterator<Item = PropertyKey> {
        COMMON_KEYS
            .iter()
            .chain(self.extra_keys().iter())
            .copied()
    }

    /// Decide what kind of tile a sheet cell holds from its default flags.
    pub fn classify(default_flags: &str) -> Self {
        let codes: SmallVec<[char; 8]> = flags::split(default_flags)
            .filter_map(|f| f.chars().next())
            .filter(|c| *c != DESCRIPTION_CODE)
            .collect();
        if codes.iter().any(|c| ENTITY_CODES.contains(c)) {
            TileVariant::Entity
        } else if codes.iter().any(|c| FIXTURE_CODES.contains(c)) {
            TileVariant::Fixture
        } else {
            TileVariant::Map
        }
    }
}

/// A positioned game object referencing a sheet-atlas cell.
#[derive(Debug)]
pub struct Tile {
    variant: TileVariant,
    mnemonic: Mnemonic,
    x: usize,
    y: usize,
    description: String,
    /// Description of the sheet template this tile was copied from.
    default_description: String,
    /// Name of the owning zone, if placed.
    zone: Option<String>,
    properties: SmallVec<[IntegerTileProperty; 10]>,
    subscribers: Subscribers<TileEvent>,
}

impl Tile {
    /// New tile with every property at its default.
    pub fn new(variant: TileVariant, mnemonic: Mnemonic) -> Self {
        Self {
            variant,
            mnemonic,
            x: 0,
            y: 0,
            description: String::new(),
            default_description: String::new(),
            zone: None,
            properties: variant.keys().map(PropertyKey::property).collect(),
            subscribers: Subscribers::new(),
        }
    }

    /// New tile with `flags` applied on top of the defaults.
    pub fn from_flags(variant: TileVariant, mnemonic: Mnemonic, encoded: &str) -> Self {
        let mut tile = Self::new(variant, mnemonic);
        tile.apply_flags(encoded);
        tile
    }

    pub fn map(mnemonic: Mnemonic) -> Self {
        Self::new(TileVariant::Map, mnemonic)
    }

    pub fn fixture(mnemonic: Mnemonic) -> Self {
        Self::new(TileVariant::Fixture, mnemonic)
    }

    pub fn entity(mnemonic: Mnemonic) -> Self {
        Self::new(TileVariant::Entity, mnemonic)
    }

    /// Independent, placeable copy of this tile.
    ///
    /// Properties are deep-copied. The copy has no zone, no sheet letter,
    /// sits at `(0, 0)` and has no subscribers; the caller stamps position
    /// and letter. The copied values become the copy's defaults, so
    /// [`Tile::flags`] can record a later reset below them.
    pub fn instantiate(&self) -> Tile {
        trace!("Instantiate {} from {}", self.variant.name(), self);
        let mut copy = Tile {
            variant: self.variant,
            mnemonic: Mnemonic::unset(self.mnemonic.index()),
            x: 0,
            y: 0,
            description: self.description.clone(),
            default_description: self.default_description.clone(),
            zone: None,
            properties: self.properties.clone(),
            subscribers: Subscribers::new(),
        };
        copy.pin_defaults();
        copy
    }

    /// Record the current values and description as defaults wherever no
    /// default is recorded yet.
    pub(crate) fn pin_defaults(&mut self) {
        for property in self.properties.iter_mut() {
            property.pin_default();
        }
        if self.default_description.is_empty() {
            self.default_description = self.description.clone();
        }
    }

    pub fn variant(&self) -> TileVariant {
        self.variant
    }

    pub fn layer(&self) -> Layer {
        self.variant.layer()
    }

    pub fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    pub fn sheet(&self) -> Option<char> {
        self.mnemonic.sheet()
    }

    pub fn index(&self) -> u32 {
        self.mnemonic.index()
    }

    /// Replace the whole mnemonic from text such as `B12`.
    ///
    /// Invalid text is logged and rejected; the previous reference is kept.
    pub fn set_mnemonic(&mut self, text: &str) -> Result<(), MnemonicError> {
        let mnemonic = text.parse::<Mnemonic>().inspect_err(|e| {
            error!("Tile {}: cannot set mnemonic '{}': {}", self, text, e);
        })?;
        if mnemonic != self.mnemonic {
            self.mnemonic = mnemonic;
            self.subscribers
                .notify(&TileEvent::MnemonicChanged(self.mnemonic));
        }
        Ok(())
    }

    /// Stamp the sheet letter. Out-of-range letters are rejected and logged.
    pub fn set_sheet(&mut self, sheet: char) -> Result<(), MnemonicError> {
        if self.mnemonic.sheet() == Some(sheet) {
            return Ok(());
        }
        self.mnemonic.set_sheet(sheet)?;
        self.subscribers
            .notify(&TileEvent::MnemonicChanged(self.mnemonic));
        Ok(())
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn set_position(&mut self, x: usize, y: usize) {
        self.x = x;
        self.y = y;
    }

    pub fn zone_name(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub(crate) fn set_zone_name(&mut self, zone: Option<String>) {
        self.zone = zone;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the free-text description.
    ///
    /// Flag separators and line breaks cannot be stored in a flag string and
    /// are replaced with spaces.
    pub fn set_description(&mut self, text: &str) {
        let cleaned = flag_safe(text);
        let cleaned = cleaned.trim();
        if cleaned != text {
            warn!(
                "Tile {}: description '{}' stored as '{}'",
                self,
                text.escape_debug(),
                cleaned
            );
        }
        self.description = cleaned.to_string();
    }

    /// All properties of this tile in canonical order.
    pub fn properties(&self) -> &[IntegerTileProperty] {
        &self.properties
    }

    pub fn property(&self, key: PropertyKey) -> Option<&IntegerTileProperty> {
        self.properties.iter().find(|p| p.key() == key)
    }

    /// Current value of `key`, or `None` when this variant lacks it.
    pub fn value(&self, key: PropertyKey) -> Option<i32> {
        self.property(key).map(IntegerTileProperty::value)
    }

    /// Store a clamped value and notify subscribers on change.
    ///
    /// Returns true when the stored value changed.
    pub fn set_value(&mut self, key: PropertyKey, value: i32) -> bool {
        let Some(property) = self.properties.iter_mut().find(|p| p.key() == key) else {
            warn!(
                "{} {} has no {} property",
                self.variant.name(),
                self.mnemonic,
                key.flag_name()
            );
            return false;
        };
        if !property.set_value(value) {
            return false;
        }
        let value = property.value();
        self.subscribers
            .notify(&TileEvent::PropertyChanged { key, value });
        true
    }

    /// Unset every property.
    pub fn reset_properties(&mut self) {
        let keys: SmallVec<[PropertyKey; 10]> = self.properties.iter().map(|p| p.key()).collect();
        for key in keys {
            self.set_value(key, UNSET);
        }
    }

    fn value_or_unset(&self, key: PropertyKey) -> i32 {
        self.value(key).unwrap_or(UNSET)
    }

    pub fn blocking(&self) -> i32 {
        self.value_or_unset(PropertyKey::Blocking)
    }

    pub fn luminous(&self) -> i32 {
        self.value_or_unset(PropertyKey::Luminous)
    }

    pub fn sound(&self) -> i32 {
        self.value_or_unset(PropertyKey::Sound)
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking() > 0
    }

    pub fn is_weapon(&self) -> bool {
        self.value_or_unset(PropertyKey::Weapon) >= 0
    }

    pub fn is_inventory_item(&self) -> bool {
        self.value_or_unset(PropertyKey::Inventory) >= 0
    }

    pub fn is_track(&self) -> bool {
        self.value_or_unset(PropertyKey::Track) >= 0
    }

    pub fn is_rolling(&self) -> bool {
        self.value_or_unset(PropertyKey::Rolling) >= 0
    }

    pub fn can_ablate(&self) -> bool {
        self.value_or_unset(PropertyKey::Ablation) >= 0
    }

    /// Wear the tile down (negative `amount`) or repair it, within `0..=99`.
    ///
    /// Does nothing for tiles that cannot ablate.
    pub fn apply_ablation(&mut self, amount: i32) {
        if !self.can_ablate() {
            return;
        }
        let current = self.value_or_unset(PropertyKey::Ablation);
        let next = current.saturating_add(amount).clamp(0, MAX_PERCENT);
        self.set_value(PropertyKey::Ablation, next);
    }

    fn key_for_code(&self, code: char) -> Option<PropertyKey> {
        self.properties
            .iter()
            .map(|p| p.key())
            .find(|k| k.code() == code)
    }

    /// Apply a colon-separated flag string on top of the current values.
    ///
    /// Unknown codes are ignored. A malformed numeric payload is logged and
    /// that flag is skipped; the rest of the string still applies. The
    /// description is taken as written, except for line breaks.
    pub fn apply_flags(&mut self, encoded: &str) {
        for fragment in flags::split(encoded) {
            match flags::parse_fragment(fragment) {
                Ok(Fragment::Description(text)) => {
                    let cleaned = flag_safe(text);
                    if cleaned != text {
                        debug!(
                            "{} {}: line break in description '{}'",
                            self.variant.name(),
                            self.mnemonic,
                            text.escape_debug()
                        );
                    }
                    self.description = cleaned;
                }
                Ok(Fragment::Value { code, value }) => {
                    let Some(key) = self.key_for_code(code) else {
                        trace!(
                            "{} {}: ignoring flag '{}'",
                            self.variant.name(),
                            self.mnemonic,
                            fragment
                        );
                        continue;
                    };
                    match value.or(key.bare_value()) {
                        Some(v) => {
                            trace!("{} {}: {} = {}", self.variant.name(), self.mnemonic, key.flag_name(), v);
                            self.set_value(key, v);
                        }
                        None => debug!(
                            "{} {}: bare flag '{}' has no default, ignored",
                            self.variant.name(),
                            self.mnemonic,
                            fragment
                        ),
                    }
                }
                Err(e) => warn!(
                    "Zone '{}' ({},{}) tile {}: skipping flag: {}",
                    self.zone.as_deref().unwrap_or("-"),
                    self.x,
                    self.y,
                    self.mnemonic,
                    e
                ),
            }
        }
    }

    /// Encode set properties (canonical order) then the description.
    ///
    /// A tile with every property unset and no description encodes to an
    /// empty string. A description cleared on a copy of a described
    /// template is written as a bare `D`.
    pub fn flags(&self) -> String {
        let mut fragments: SmallVec<[String; 12]> =
            self.properties.iter().map(TileProperty::flag_lump).collect();
        if !self.description.is_empty() || !self.default_description.is_empty() {
            fragments.push(format!("{}{}", DESCRIPTION_CODE, self.description));
        }
        flags::join(fragments)
    }

    /// Subscribe to this tile's property and mnemonic changes.
    pub fn subscribe(&mut self) -> Receiver<TileEvent> {
        self.subscribers.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Release subscribers once the tile leaves a zone.
    pub fn retire(&mut self) {
        self.subscribers.clear();
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({},{})",
            self.variant.name(),
            self.mnemonic,
            self.x,
            self.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::TryRecvError;

    fn m(text: &str) -> Mnemonic {
        text.parse().unwrap()
    }

    #[test]
    fn test_property_tables() {
        let map = Tile::map(m("A000"));
        assert_eq!(map.properties().len(), 3);
        let fixture = Tile::fixture(m("A000"));
        assert_eq!(fixture.properties().len(), 9);
        let entity = Tile::entity(m("A000"));
        assert_eq!(entity.properties().len(), 7);
        assert!(map.value(PropertyKey::Weapon).is_none());
        assert_eq!(fixture.value(PropertyKey::Weapon), Some(UNSET));
    }

    #[test]
    fn test_default_tile_encodes_empty() {
        for variant in [TileVariant::Map, TileVariant::Fixture, TileVariant::Entity] {
            let t = Tile::new(variant, m("A001"));
            assert_eq!(t.flags(), "");
            let back = Tile::from_flags(variant, m("A001"), &t.flags());
            assert!(back.properties().iter().all(|p| p.is_default()));
        }
    }

    #[test]
    fn test_common_flags_parse() {
        let t = Tile::from_flags(TileVariant::Map, m("A002"), "B:L40:F12:Dold stone wall");
        assert_eq!(t.blocking(), 99);
        assert_eq!(t.luminous(), 40);
        assert_eq!(t.sound(), 12);
        assert_eq!(t.description(), "old stone wall");
        assert!(t.is_blocking());
    }

    #[test]
    fn test_explicit_blocking_value() {
        let t = Tile::from_flags(TileVariant::Map, m("A002"), "B25");
        assert_eq!(t.blocking(), 25);
    }

    #[test]
    fn test_fixture_flags_parse() {
        let t = Tile::from_flags(
            TileVariant::Fixture,
            m("B010"),
            "A50:I7:S3:T2:U:W10",
        );
        assert_eq!(t.value(PropertyKey::Ablation), Some(50));
        assert_eq!(t.value(PropertyKey::Inventory), Some(7));
        assert_eq!(t.value(PropertyKey::Storage), Some(3));
        assert_eq!(t.value(PropertyKey::Track), Some(2));
        assert_eq!(t.value(PropertyKey::Umbra), Some(99));
        assert_eq!(t.value(PropertyKey::Weapon), Some(10));
        assert!(t.is_weapon());
        assert!(t.is_inventory_item());
        assert!(t.is_track());
    }

    #[test]
    fn test_entity_flags_parse() {
        let t = Tile::from_flags(TileVariant::Entity, m("C001"), "C5:E9:R4:U20");
        assert_eq!(t.value(PropertyKey::Npc), Some(5));
        assert_eq!(t.value(PropertyKey::Enemy), Some(9));
        assert_eq!(t.value(PropertyKey::Rolling), Some(4));
        assert_eq!(t.value(PropertyKey::Umbra), Some(20));
        assert!(t.is_rolling());
    }

    #[test]
    fn test_unknown_and_foreign_flags_ignored() {
        // 'W' is a fixture code; a map tile ignores it. 'Z' is unknown everywhere.
        let t = Tile::from_flags(TileVariant::Map, m("A000"), "W10:Z3:L5");
        assert_eq!(t.luminous(), 5);
        assert_eq!(t.flags(), "L5");
    }

    #[test]
    fn test_malformed_flag_is_skipped() {
        let t = Tile::from_flags(TileVariant::Fixture, m("A000"), "Wxx:L7:I3");
        assert_eq!(t.value(PropertyKey::Weapon), Some(UNSET));
        assert_eq!(t.luminous(), 7);
        assert_eq!(t.value(PropertyKey::Inventory), Some(3));
    }

    #[test]
    fn test_bare_flag_without_default_ignored() {
        let t = Tile::from_flags(TileVariant::Fixture, m("A000"), "W");
        assert_eq!(t.value(PropertyKey::Weapon), Some(UNSET));
    }

    #[test]
    fn test_encode_canonical_order() {
        let t = Tile::from_flags(
            TileVariant::Fixture,
            m("A005"),
            "Dcrate:S4:W10:L3:B",
        );
        assert_eq!(t.flags(), "B99:L3:W10:S4:Dcrate");
        let e = Tile::from_flags(TileVariant::Entity, m("A005"), "U:E2:C1");
        assert_eq!(e.flags(), "C1:E2:U99");
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let mut t = Tile::fixture(m("A005"));
        t.set_value(PropertyKey::Weapon, 10);
        t.set_value(PropertyKey::Ablation, 0);
        t.set_value(PropertyKey::Sound, 321);
        t.set_description("rusty sword");
        let back = Tile::from_flags(TileVariant::Fixture, m("A005"), &t.flags());
        assert_eq!(back.properties(), t.properties());
        assert_eq!(back.description(), "rusty sword");
        assert_eq!(back.flags(), t.flags());
    }

    #[test]
    fn test_values_are_clamped() {
        let mut t = Tile::fixture(m("A000"));
        t.set_value(PropertyKey::Track, 500);
        assert_eq!(t.value(PropertyKey::Track), Some(99));
        t.set_value(PropertyKey::Track, -50);
        assert_eq!(t.value(PropertyKey::Track), Some(UNSET));
        let t = Tile::from_flags(TileVariant::Map, m("A000"), "L500");
        assert_eq!(t.luminous(), 99);
    }

    #[test]
    fn test_set_description_sanitizes() {
        let mut t = Tile::map(m("A000"));
        t.set_description("a:b\nc ");
        assert_eq!(t.description(), "a b c");
        assert_eq!(t.flags(), "Da b c");
    }

    #[test]
    fn test_instantiate_resets_identity() {
        let mut template = Tile::from_flags(TileVariant::Fixture, Mnemonic::unset(5), "W10:Dsword");
        let _rx = template.subscribe();
        template.set_position(3, 4);
        template.set_zone_name(Some("cave".into()));

        let mut copy = template.instantiate();
        assert_eq!(copy.sheet(), None);
        assert_eq!(copy.index(), 5);
        assert_eq!(copy.position(), (0, 0));
        assert_eq!(copy.zone_name(), None);
        assert_eq!(copy.subscriber_count(), 0);
        assert_eq!(copy.description(), "sword");
        assert_eq!(copy.value(PropertyKey::Weapon), Some(10));

        // Deep copy: editing the copy leaves the template alone.
        copy.set_value(PropertyKey::Weapon, 50);
        assert_eq!(template.value(PropertyKey::Weapon), Some(10));
    }

    #[test]
    fn test_reset_below_template_is_encoded() {
        let template = Tile::from_flags(TileVariant::Fixture, Mnemonic::unset(1), "B:W10:DWall");
        let mut placed = template.instantiate();
        assert_eq!(placed.flags(), "B99:W10:DWall");

        placed.set_value(PropertyKey::Weapon, UNSET);
        placed.set_value(PropertyKey::Blocking, UNSET);
        placed.set_description("");
        assert_eq!(placed.flags(), "B-1:W-1:D");

        let mut back = template.instantiate();
        back.apply_flags(&placed.flags());
        assert_eq!(back.blocking(), UNSET);
        assert_eq!(back.value(PropertyKey::Weapon), Some(UNSET));
        assert_eq!(back.description(), "");
        assert_eq!(back.flags(), placed.flags());
    }

    #[test]
    fn test_copy_of_copy_keeps_template_defaults() {
        let template = Tile::from_flags(TileVariant::Fixture, Mnemonic::unset(5), "W10:Dsword");
        let mut placed = template.instantiate();
        placed.set_value(PropertyKey::Weapon, UNSET);
        placed.set_description("");
        let copy = placed.instantiate();
        assert_eq!(copy.property(PropertyKey::Weapon).unwrap().default_value(), 10);
        assert_eq!(copy.flags(), "W-1:D");
    }

    #[test]
    fn test_loaded_description_is_verbatim() {
        let t = Tile::from_flags(TileVariant::Map, m("A000"), "L3: D  two  words ");
        assert_eq!(t.luminous(), 3);
        assert_eq!(t.description(), "  two  words ");

        let t = Tile::from_flags(TileVariant::Map, m("A000"), "Dline\nbreak\rhere");
        assert_eq!(t.description(), "line break here");
        assert_eq!(t.flags(), "Dline break here");
    }

    #[test]
    fn test_property_change_notifies_once() {
        let mut t = Tile::map(m("A000"));
        let rx = t.subscribe();
        assert!(t.set_value(PropertyKey::Luminous, 30));
        assert!(!t.set_value(PropertyKey::Luminous, 30));
        assert_eq!(
            rx.try_recv(),
            Ok(TileEvent::PropertyChanged {
                key: PropertyKey::Luminous,
                value: 30
            })
        );
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_set_mnemonic_validation_and_notify() {
        let mut t = Tile::map(m("A001"));
        let rx = t.subscribe();
        assert!(t.set_mnemonic("a002").is_err());
        assert_eq!(t.mnemonic().to_string(), "A001");
        assert!(t.set_sheet('[').is_err());
        assert_eq!(t.sheet(), Some('A'));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        t.set_mnemonic("B2").unwrap();
        assert_eq!(t.mnemonic().to_string(), "B002");
        assert_eq!(rx.try_recv(), Ok(TileEvent::MnemonicChanged(m("B002"))));
    }

    #[test]
    fn test_apply_ablation() {
        let mut t = Tile::fixture(m("A000"));
        t.apply_ablation(-10);
        assert_eq!(t.value(PropertyKey::Ablation), Some(UNSET));

        t.set_value(PropertyKey::Ablation, 5);
        t.apply_ablation(-10);
        assert_eq!(t.value(PropertyKey::Ablation), Some(0));
        t.apply_ablation(500);
        assert_eq!(t.value(PropertyKey::Ablation), Some(99));
    }

    #[test]
    fn test_retire_disconnects() {
        let mut t = Tile::map(m("A000"));
        let rx = t.subscribe();
        t.retire();
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(TileVariant::classify(""), TileVariant::Map);
        assert_eq!(TileVariant::classify("B:L4:Dwall"), TileVariant::Map);
        assert_eq!(TileVariant::classify("W10"), TileVariant::Fixture);
        assert_eq!(TileVariant::classify("U"), TileVariant::Fixture);
        assert_eq!(TileVariant::classify("U:C3"), TileVariant::Entity);
        // Description text never classifies.
        assert_eq!(TileVariant::classify("DWeapon rack"), TileVariant::Map);
    }

    #[test]
    fn test_reset_properties() {
        let mut t = Tile::from_flags(TileVariant::Entity, m("A000"), "B:C4");
        t.reset_properties();
        assert!(t.properties().iter().all(|p| p.is_default()));
    }
}
