//! `key = value` property blocks.
//!
//! Sheet `.properties` files and the tail of a `.zone` file share the same
//! line format:
//!
//! ```text
//! # comment
//! uid = 42
//! flags.3 = B:L40
//! base.0 =
//! ```
//!
//! Parsing goes through `configparser` with `=` as the only delimiter, so flag
//! strings keep their colons. Lines starting with `#` or `!` are comments.
//! Backslash escapes written by Java-style property writers (`B\:L40`) are
//! undone on read.

use std::path::Path;

use configparser::ini::Ini;
use rustc_hash::FxHashMap;

/// Parsed key/value pairs. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBlock {
    values: FxHashMap<String, String>,
}

fn new_ini() -> Ini {
    let mut defaults = Ini::new_cs().defaults();
    defaults.comment_symbols = Vec::new();
    defaults.delimiters = vec!['='];
    defaults.case_sensitive = true;
    Ini::new_from_defaults(defaults)
}

fn is_comment(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with('#') || t.starts_with('!')
}

impl PropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse property text. Section headers, if any, are flattened.
    pub fn parse(text: &str) -> Result<Self, String> {
        let body: String = text
            .lines()
            .filter(|l| !is_comment(l))
            .flat_map(|l| [l, "\n"])
            .collect();
        let mut ini = new_ini();
        let sections = ini.read(body)?;
        let mut values = FxHashMap::default();
        for entries in sections.into_values() {
            for (key, value) in entries {
                values.insert(key, unescape(value.as_deref().unwrap_or_default()));
            }
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key` parsed as `T`; `Ok(None)` when absent.
    pub fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, String> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| raw.to_string()),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Write the block to `path`, creating or replacing the file.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut ini = new_ini();
        let section = ini.defaults().default_section;
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        for key in keys {
            ini.set(&section, key, Some(escape(&self.values[key])));
        }
        ini.write(path)
    }
}

/// Escape backslashes so [`unescape`] gives `value` back.
pub(crate) fn escape(value: &str) -> String {
    value.replace('\\', "\\\\")
}

/// Undo Java-style property escapes.
pub fn unescape(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_colons_in_values() {
        let block = PropertyBlock::parse("item.1 = A005:W10\nbase.0 = B:L40\n").unwrap();
        assert_eq!(block.get("item.1"), Some("A005:W10"));
        assert_eq!(block.get("base.0"), Some("B:L40"));
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let text = "# Base Tile Flags\n\n! bang comment\nuid=42\n\n";
        let block = PropertyBlock::parse(text).unwrap();
        assert_eq!(block.len(), 1);
        assert_eq!(block.get_parsed::<u64>("uid"), Ok(Some(42)));
    }

    #[test]
    fn test_empty_value_reads_as_empty_string() {
        let block = PropertyBlock::parse("base.0 =\n").unwrap();
        assert_eq!(block.get("base.0"), Some(""));
    }

    #[test]
    fn test_hash_inside_value_is_not_a_comment() {
        let block = PropertyBlock::parse("item.4 = A001:DRoom #4\n").unwrap();
        assert_eq!(block.get("item.4"), Some("A001:DRoom #4"));
    }

    #[test]
    fn test_java_escapes_undone() {
        let block = PropertyBlock::parse("flags.3=B\\:L40\\:DA\\=B\n").unwrap();
        assert_eq!(block.get("flags.3"), Some("B:L40:DA=B"));
        assert_eq!(unescape("caf\\u00e9"), "café");
        assert_eq!(unescape("a\\\\b"), "a\\b");
    }

    #[test]
    fn test_get_parsed_reports_bad_value() {
        let block = PropertyBlock::parse("size = big\n").unwrap();
        assert_eq!(block.get_parsed::<u32>("size"), Err("big".to_string()));
        assert_eq!(block.get_parsed::<u32>("missing"), Ok(None));
    }

    #[test]
    fn test_save_and_parse_back() {
        let dir = std::env::temp_dir().join("deepzone_properties_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sheet.properties");

        let mut block = PropertyBlock::new();
        block.set("name", "Caves");
        block.set("uid", "1234567890123");
        block.set("flags.2", "B:Dback\\slash");
        block.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back = PropertyBlock::parse(&text).unwrap();
        assert_eq!(back.get("name"), Some("Caves"));
        assert_eq!(back.get("uid"), Some("1234567890123"));
        assert_eq!(back.get("flags.2"), Some("B:Dback\\slash"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
