//! Short and long names of transformation options.
//!
//! Transformation segments in delivery URLs use single-letter keys (`w_100`),
//! while callers usually spell options out (`width`). [`OptionNames`] maps
//! between the two. Keys it doesn't know about are passed through untouched,
//! so options added by the service later keep working.
use std::collections::HashMap;

/// Pairs of `(short, long)` option names.
const OPTION_NAMES: [(&str, &str); 16] = [
    ("a", "angle"),
    ("b", "background"),
    ("c", "crop"),
    ("d", "default_image"),
    ("e", "effect"),
    ("f", "fetch_format"),
    ("g", "gravity"),
    ("h", "height"),
    ("l", "overlay"),
    ("p", "prefix"),
    ("q", "quality"),
    ("r", "radius"),
    ("t", "named_transformation"),
    ("w", "width"),
    ("x", "x"),
    ("y", "y"),
];

/// Immutable bidirectional lookup between short and long option names.
///
/// # Example
///
/// ```rust
/// use cloudinary_client::OptionNames;
///
/// let names = OptionNames::new();
///
/// assert_eq!(names.resolve_short("width"), "w");
/// assert_eq!(names.resolve_long("w"), "width");
///
/// // Unknown keys are passed through.
/// assert_eq!(names.resolve_short("resource_type"), "resource_type");
/// ```
#[derive(Debug, Clone)]
pub struct OptionNames {
    to_long: HashMap<&'static str, &'static str>,
    to_short: HashMap<&'static str, &'static str>,
}

impl OptionNames {
    /// Builds the lookup tables.
    pub fn new() -> Self {
        let to_long = OPTION_NAMES.iter().copied().collect();
        let to_short = OPTION_NAMES
            .iter()
            .map(|&(short, long)| (long, short))
            .collect();

        Self { to_long, to_short }
    }

    /// Returns the long form of `key`, or `key` itself when it has none.
    pub fn resolve_long<'a>(&self, key: &'a str) -> &'a str {
        self.to_long.get(key).copied().unwrap_or(key)
    }

    /// Returns the short form of `key`, or `key` itself when it has none.
    pub fn resolve_short<'a>(&self, key: &'a str) -> &'a str {
        self.to_short.get(key).copied().unwrap_or(key)
    }
}

impl Default for OptionNames {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn short_to_long_and_back_is_identity() {
        let names = OptionNames::new();
        for (short, _) in OPTION_NAMES {
            assert_eq!(names.resolve_short(names.resolve_long(short)), short);
        }
    }

    #[test]
    fn long_to_short_and_back_is_identity() {
        let names = OptionNames::new();
        for (_, long) in OPTION_NAMES {
            assert_eq!(names.resolve_long(names.resolve_short(long)), long);
        }
    }

    #[test]
    fn table_entries() {
        let names = OptionNames::new();
        assert_eq!(names.resolve_long("c"), "crop");
        assert_eq!(names.resolve_long("t"), "named_transformation");
        assert_eq!(names.resolve_short("fetch_format"), "f");
        assert_eq!(names.resolve_short("x"), "x");
    }

    #[test]
    fn unknown_keys_pass_through() {
        let names = OptionNames::new();
        for key in ["resource_type", "secure", "type", "opacity", ""] {
            assert_eq!(names.resolve_long(key), key);
            assert_eq!(names.resolve_short(key), key);
        }
    }
}
