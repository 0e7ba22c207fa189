//! Cell identifiers shared between a rendered diagram and its overlay data.
//!
//! This module provides the [`CellId`] type, backed by a process-wide string
//! interner so identifiers are `Copy` and cheap to hash and compare.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for cell identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Stable identifier of a diagram cell.
///
/// The diagram renderer stamps it on addressable nodes and the overlay data
/// producer stamps the same value on the content meant for that node.
///
/// # Examples
///
/// ```
/// use palimpsest_core::identifier::CellId;
///
/// let id = CellId::new("app-42");
/// assert_eq!(id, "app-42");
/// assert_eq!(id, CellId::from("app-42"));
/// assert_eq!(id.to_string(), "app-42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(DefaultSymbol);

impl CellId {
    /// Creates a `CellId` from a string slice, interning it on first use.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Calls `f` with the string form of this identifier without allocating.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let interner = interner();
        f(interner.resolve(self.0).unwrap_or_default())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|name| f.write_str(name))
    }
}

impl std::str::FromStr for CellId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for CellId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CellId {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl PartialEq<str> for CellId {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        self.with_str(|name| name == other)
    }
}

impl PartialEq<&str> for CellId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_id() {
        assert_eq!(CellId::new("cell-a"), CellId::new("cell-a"));
        assert_ne!(CellId::new("cell-a"), CellId::new("cell-b"));
    }

    #[test]
    fn test_string_comparison() {
        let id = CellId::new("node::7");
        assert!(id == "node::7");
        assert!(id != "node::8");
    }

    #[test]
    fn test_display_round_trips_name() {
        let id: CellId = "ü-unicode".into();
        assert_eq!(id.to_string(), "ü-unicode");
    }

    #[test]
    fn test_from_str() {
        let id: CellId = "parsed".parse().unwrap();
        assert_eq!(id, CellId::from(String::from("parsed")));
    }

    #[test]
    fn test_with_str_borrows_name() {
        let id = CellId::new("borrowed");
        assert_eq!(id.with_str(str::len), 8);
    }
}
