//! Typed, range-clamped tile properties.
//!
//! Every editable tile attribute is an explicit property object rather than a
//! bare field: it knows its flag code, label, range and how to encode itself
//! as a flag fragment. Editors enumerate a tile's properties through
//! [`Tile::properties`](crate::components::tile::Tile::properties) instead of
//! reflecting on fields.
//!
//! All built-in properties are integers where `-1` means "not set". A value at
//! its default is never written to disk.

use arrayvec::ArrayString;
use log::trace;
use serde::{Deserialize, Serialize};

/// Value meaning "not set" for every built-in property.
pub const UNSET: i32 = -1;
/// Upper bound for percentage-like properties.
pub const MAX_PERCENT: i32 = 99;
/// Upper bound for game-index properties.
pub const MAX_INDEX: i32 = 999;

/// Presentation hint for editors. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditStyle {
    #[default]
    TextField,
    Slider,
    Spinner,
}

/// Identity of a built-in property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    /// Movement obstruction, `B`.
    Blocking,
    /// Light emission, `L`.
    Luminous,
    /// Sound-effect index, `F`.
    Sound,
    /// Track element that moves rolling things, `T`.
    Track,
    /// Drop shadow, `U`.
    Umbra,
    /// Weapon damage, `W`.
    Weapon,
    /// Wear that degrades over time, `A`.
    Ablation,
    /// Inventory item index, `I`.
    Inventory,
    /// Storage index, `S`.
    Storage,
    /// NPC id, `C`.
    Npc,
    /// Enemy id, `E`.
    Enemy,
    /// Rolling/rail state, `R`.
    Rolling,
}

impl PropertyKey {
    /// One-letter code used in the flag string.
    pub const fn code(self) -> char {
        match self {
            PropertyKey::Blocking => 'B',
            PropertyKey::Luminous => 'L',
            PropertyKey::Sound => 'F',
            PropertyKey::Track => 'T',
            PropertyKey::Umbra => 'U',
            PropertyKey::Weapon => 'W',
            PropertyKey::Ablation => 'A',
            PropertyKey::Inventory => 'I',
            PropertyKey::Storage => 'S',
            PropertyKey::Npc => 'C',
            PropertyKey::Enemy => 'E',
            PropertyKey::Rolling => 'R',
        }
    }

    /// Four-letter flag name, also the fallback label.
    pub const fn flag_name(self) -> &'static str {
        match self {
            PropertyKey::Blocking => "BLOK",
            PropertyKey::Luminous => "LUMN",
            PropertyKey::Sound => "SNDF",
            PropertyKey::Track => "TRAK",
            PropertyKey::Umbra => "SHAD",
            PropertyKey::Weapon => "WEAP",
            PropertyKey::Ablation => "WEAR",
            PropertyKey::Inventory => "INVT",
            PropertyKey::Storage => "STOR",
            PropertyKey::Npc => "CHAR",
            PropertyKey::Enemy => "ENMY",
            PropertyKey::Rolling => "ROLL",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PropertyKey::Blocking => "Blocking",
            PropertyKey::Luminous => "Luminous",
            PropertyKey::Sound => "Sound FX",
            PropertyKey::Track => "Track",
            PropertyKey::Umbra => "Drop Shadow",
            PropertyKey::Weapon => "Weapon Damage",
            PropertyKey::Ablation => "Wear",
            PropertyKey::Inventory => "Inventory Item",
            PropertyKey::Storage => "Storage",
            PropertyKey::Npc => "NPC",
            PropertyKey::Enemy => "Enemy",
            PropertyKey::Rolling => "Rolling",
        }
    }

    pub const fn max_value(self) -> i32 {
        match self {
            PropertyKey::Blocking
            | PropertyKey::Luminous
            | PropertyKey::Track
            | PropertyKey::Umbra
            | PropertyKey::Ablation => MAX_PERCENT,
            PropertyKey::Sound
            | PropertyKey::Weapon
            | PropertyKey::Inventory
            | PropertyKey::Storage
            | PropertyKey::Npc
            | PropertyKey::Enemy
            | PropertyKey::Rolling => MAX_INDEX,
        }
    }

    /// Value assigned by a bare flag with no payload (`B`, `U`).
    pub const fn bare_value(self) -> Option<i32> {
        match self {
            PropertyKey::Blocking | PropertyKey::Umbra => Some(MAX_PERCENT),
            _ => None,
        }
    }

    pub const fn edit_style(self) -> EditStyle {
        match self.max_value() {
            MAX_PERCENT => EditStyle::Slider,
            _ => EditStyle::Spinner,
        }
    }

    /// Fresh property at its default value.
    pub fn property(self) -> IntegerTileProperty {
        IntegerTileProperty::new(self)
    }
}

/// Common surface of a tile property.
pub trait TileProperty {
    fn key(&self) -> PropertyKey;

    /// Four-letter flag name, e.g. `BLOK`.
    fn flag(&self) -> &str;

    /// Human readable label; the flag name when no label was set.
    fn label(&self) -> &str;

    fn description(&self) -> &str;

    fn is_default(&self) -> bool;

    /// `<code><value>` fragment for saving.
    ///
    /// Empty when the property is unset and its sheet default is unset too.
    /// An unset value over a set default is written as `<code>-1`, since a
    /// loader starts from the sheet default.
    fn flag_lump(&self) -> String;
}

/// Integer property clamped to `[min_value, max_value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerTileProperty {
    key: PropertyKey,
    flag: ArrayString<4>,
    label: String,
    description: String,
    value: i32,
    min_value: i32,
    max_value: i32,
    /// Value of the sheet template the property was copied from.
    default_value: i32,
    edit_style: EditStyle,
}

impl IntegerTileProperty {
    pub fn new(key: PropertyKey) -> Self {
        let mut flag = ArrayString::new();
        flag.push_str(key.flag_name());
        Self {
            key,
            flag,
            label: key.label().to_string(),
            description: String::new(),
            value: UNSET,
            min_value: UNSET,
            max_value: key.max_value(),
            default_value: UNSET,
            edit_style: key.edit_style(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn min_value(&self) -> i32 {
        self.min_value
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    pub fn default_value(&self) -> i32 {
        self.default_value
    }

    /// Take the current value as the default, unless a default is already
    /// recorded.
    pub(crate) fn pin_default(&mut self) {
        if self.default_value == UNSET {
            self.default_value = self.value;
        }
    }

    pub fn edit_style(&self) -> EditStyle {
        self.edit_style
    }

    pub fn set_edit_style(&mut self, style: EditStyle) {
        self.edit_style = style;
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Store `value` clamped to the property range.
    ///
    /// Returns true when the stored value actually changed; callers only
    /// notify on change.
    pub fn set_value(&mut self, value: i32) -> bool {
        let clamped = value.clamp(self.min_value, self.max_value);
        if clamped == self.value {
            return false;
        }
        trace!(
            "{} value change: old={} new={} (requested {})",
            self.flag, self.value, clamped, value
        );
        self.value = clamped;
        true
    }

    /// Put the property back to its default. Returns true when it changed.
    pub fn reset(&mut self) -> bool {
        self.set_value(self.default_value)
    }
}

impl TileProperty for IntegerTileProperty {
    fn key(&self) -> PropertyKey {
        self.key
    }

    fn flag(&self) -> &str {
        self.flag.as_str()
    }

    fn label(&self) -> &str {
        if self.label.trim().is_empty() {
            self.flag.as_str()
        } else {
            &self.label
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_default(&self) -> bool {
        self.value == self.default_value
    }

    fn flag_lump(&self) -> String {
        if self.value == UNSET && self.default_value == UNSET {
            String::new()
        } else {
            format!("{}{}", self.key.code(), self.value)
        }
    }
}
