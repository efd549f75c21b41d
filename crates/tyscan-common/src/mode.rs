//! Scan-mode selection.
//!
//! A `ScanMode` is a flag word selecting which declaration kinds and
//! decorations the scanner materializes. The configured mode is combined by
//! bitwise OR with the mode required by every registered processor, so a
//! processor can never observe less than it asked for.

use bitflags::bitflags;

bitflags! {
    /// Bitset selecting what the scanner extracts.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ScanMode: u16 {
        /// Declared types.
        const TYPES = 1 << 0;
        /// Methods of named types.
        const METHODS = 1 << 1;
        /// Struct fields (including promoted fields).
        const FIELDS = 1 << 2;
        /// Documentation comments from dependency packages.
        const DOCS = 1 << 3;
        /// Comments attached to declarations in scanned packages.
        const COMMENTS = 1 << 4;
        /// Package-level constants.
        const CONSTS = 1 << 5;
        /// Package-level variables.
        const VARIABLES = 1 << 6;
        /// Package-level functions.
        const FUNCTIONS = 1 << 7;
        /// Enum-like grouping: constants typed by a named in-package type
        /// record that type as their parent.
        const ENUMS = 1 << 8;
    }
}

impl ScanMode {
    /// The default preset: everything except dependency docs.
    pub const DEFAULT: Self = Self::TYPES
        .union(Self::METHODS)
        .union(Self::FIELDS)
        .union(Self::COMMENTS)
        .union(Self::CONSTS)
        .union(Self::VARIABLES)
        .union(Self::FUNCTIONS)
        .union(Self::ENUMS);

    /// Parse a single flag name as accepted by the CLI and config surface.
    pub fn from_flag(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "types" => Some(Self::TYPES),
            "methods" => Some(Self::METHODS),
            "fields" => Some(Self::FIELDS),
            "docs" => Some(Self::DOCS),
            "comments" => Some(Self::COMMENTS),
            "consts" => Some(Self::CONSTS),
            "variables" => Some(Self::VARIABLES),
            "functions" => Some(Self::FUNCTIONS),
            "enums" => Some(Self::ENUMS),
            "default" => Some(Self::DEFAULT),
            _ => None,
        }
    }

    /// Parse a comma-separated flag list (`"types,methods,docs"`).
    ///
    /// Returns the unknown flag name on failure so callers can report it.
    pub fn parse_list(list: &str) -> Result<Self, String> {
        let mut mode = Self::empty();
        for part in list.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match Self::from_flag(part) {
                Some(flag) => mode |= flag,
                None => return Err(part.to_string()),
            }
        }
        Ok(mode)
    }
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset_excludes_docs() {
        assert!(!ScanMode::DEFAULT.contains(ScanMode::DOCS));
        assert!(ScanMode::DEFAULT.contains(ScanMode::TYPES));
        assert!(ScanMode::DEFAULT.contains(ScanMode::ENUMS));
    }

    #[test]
    fn test_parse_list() {
        let mode = ScanMode::parse_list("types, methods,docs").unwrap();
        assert_eq!(
            mode,
            ScanMode::TYPES | ScanMode::METHODS | ScanMode::DOCS
        );
    }

    #[test]
    fn test_parse_list_unknown_flag() {
        let err = ScanMode::parse_list("types,wibble").unwrap_err();
        assert_eq!(err, "wibble");
    }

    #[test]
    fn test_modes_combine_by_or() {
        let configured = ScanMode::TYPES;
        let required = ScanMode::METHODS | ScanMode::FIELDS;
        assert_eq!(
            configured | required,
            ScanMode::TYPES | ScanMode::METHODS | ScanMode::FIELDS
        );
    }
}
