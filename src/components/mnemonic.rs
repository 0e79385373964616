//! Sheet-cell references.
//!
//! A [`Mnemonic`] names one cell of one atlas: a sheet letter `A..=Z` that is
//! resolved through a zone's index table, and a row-major atlas index. The
//! canonical text form pads the index to three digits (`A007`).
//!
//! Template tiles owned by a [`SheetModel`](crate::resources::sheetmodel::SheetModel)
//! have no sheet letter yet; they render with the `_` sentinel until a zone
//! stamps one on.

use std::fmt;
use std::str::FromStr;

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::MnemonicError;

/// Sentinel rendered in place of an unset sheet letter.
pub const UNSET_SHEET: char = '_';

/// Returns true when `c` is a valid sheet letter.
pub fn is_sheet_letter(c: char) -> bool {
    c.is_ascii_uppercase()
}

/// Sheet letter plus atlas index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mnemonic {
    sheet: Option<char>,
    index: u32,
}

impl Mnemonic {
    /// Create a mnemonic, validating the sheet letter.
    pub fn new(sheet: char, index: u32) -> Result<Self, MnemonicError> {
        if !is_sheet_letter(sheet) {
            return Err(MnemonicError::LetterOutOfRange(sheet));
        }
        Ok(Self {
            sheet: Some(sheet),
            index,
        })
    }

    /// A reference to atlas cell `index` with no sheet letter assigned.
    pub fn unset(index: u32) -> Self {
        Self { sheet: None, index }
    }

    pub fn sheet(&self) -> Option<char> {
        self.sheet
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Replace the sheet letter.
    ///
    /// Out-of-range letters are rejected and logged; the previous letter is
    /// kept.
    pub fn set_sheet(&mut self, sheet: char) -> Result<(), MnemonicError> {
        if !is_sheet_letter(sheet) {
            error!("Sheet code '{}' is out of range A-Z for {}", sheet, self);
            return Err(MnemonicError::LetterOutOfRange(sheet));
        }
        self.sheet = Some(sheet);
        Ok(())
    }

    pub fn clear_sheet(&mut self) {
        self.sheet = None;
    }

    pub fn with_index(self, index: u32) -> Self {
        Self { index, ..self }
    }

    /// Atlas column/row of this cell for a sheet `sheet_width` tiles wide.
    pub fn cell(&self, sheet_width: u32) -> (u32, u32) {
        atlas_cell(self.index, sheet_width)
    }
}

/// Row-major atlas addressing: `cx = index % width`, `cy = index / width`.
///
/// A zero-width sheet maps everything to column 0.
pub fn atlas_cell(index: u32, sheet_width: u32) -> (u32, u32) {
    if sheet_width == 0 {
        return (0, index);
    }
    (index % sheet_width, index / sheet_width)
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.sheet.unwrap_or(UNSET_SHEET), self.index)
    }
}

impl FromStr for Mnemonic {
    type Err = MnemonicError;

    /// Parse `<letter><digits>`; short indexes like `A0` are accepted and
    /// padded on output.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let Some(letter) = chars.next() else {
            return Err(MnemonicError::Empty);
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MnemonicError::BadIndex(s.to_string()));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| MnemonicError::BadIndex(s.to_string()))?;
        if letter == UNSET_SHEET {
            return Ok(Self::unset(index));
        }
        Self::new(letter, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_three_digits() {
        assert_eq!(Mnemonic::new('A', 7).unwrap().to_string(), "A007");
        assert_eq!(Mnemonic::new('Z', 0).unwrap().to_string(), "Z000");
        assert_eq!(Mnemonic::new('C', 123).unwrap().to_string(), "C123");
    }

    #[test]
    fn test_display_unset_sheet() {
        assert_eq!(Mnemonic::unset(5).to_string(), "_005");
    }

    #[test]
    fn test_parse_short_index_is_padded() {
        let m: Mnemonic = "A0".parse().unwrap();
        assert_eq!(m.sheet(), Some('A'));
        assert_eq!(m.index(), 0);
        assert_eq!(m.to_string(), "A000");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<Mnemonic>(), Err(MnemonicError::Empty));
        assert_eq!(
            "a001".parse::<Mnemonic>(),
            Err(MnemonicError::LetterOutOfRange('a'))
        );
        assert!(matches!(
            "A".parse::<Mnemonic>(),
            Err(MnemonicError::BadIndex(_))
        ));
        assert!(matches!(
            "A0x1".parse::<Mnemonic>(),
            Err(MnemonicError::BadIndex(_))
        ));
    }

    #[test]
    fn test_set_sheet_out_of_range_keeps_previous() {
        let mut m = Mnemonic::new('B', 3).unwrap();
        assert!(m.set_sheet('[').is_err());
        assert!(m.set_sheet('@').is_err());
        assert_eq!(m.sheet(), Some('B'));
        m.set_sheet('Q').unwrap();
        assert_eq!(m.to_string(), "Q003");
    }

    #[test]
    fn test_atlas_cell_row_major() {
        for index in 0..64 {
            let (cx, cy) = atlas_cell(index, 8);
            assert_eq!(cy * 8 + cx, index);
            assert!(cx < 8);
        }
        assert_eq!(atlas_cell(10, 4), (2, 2));
        assert_eq!(Mnemonic::new('A', 9).unwrap().cell(4), (1, 2));
    }
}
