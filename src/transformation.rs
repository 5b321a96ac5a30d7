use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::option_names::OptionNames;

/// Options that steer URL assembly rather than describing a transformation.
const CONTROL_KEYS: [&str; 3] = ["secure", "resource_type", "type"];

/// Display and transformation options for a delivery URL.
///
/// Keys may be given in short (`w`) or long (`width`) form. Keys are kept in
/// lexical order so that equal option sets always render the same URL.
///
/// `secure`, `resource_type` and `type` are understood by the URL builder and
/// never end up in the transformation segment.
///
/// # Example
///
/// ```rust
/// use cloudinary_client::Options;
///
/// let options = Options::new().width(100).height(140).crop("fill");
/// assert_eq!(options.get("width"), Some("100"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    /// Create an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary option. Unknown keys are rendered as given.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    /// Resize width.
    pub fn width(self, width: u32) -> Self {
        self.set("width", width)
    }

    /// Resize height.
    pub fn height(self, height: u32) -> Self {
        self.set("height", height)
    }

    /// Crop mode, such as `fill`, `fit` or `thumb`.
    pub fn crop(self, crop: &str) -> Self {
        self.set("crop", crop)
    }

    /// Crop anchor, such as `face` or `north_west`.
    pub fn gravity(self, gravity: &str) -> Self {
        self.set("gravity", gravity)
    }

    /// Delivery quality, 1 to 100.
    pub fn quality(self, quality: u8) -> Self {
        self.set("quality", quality)
    }

    /// Rotation in degrees.
    pub fn angle(self, angle: i32) -> Self {
        self.set("angle", angle)
    }

    /// Corner radius.
    pub fn radius(self, radius: u32) -> Self {
        self.set("radius", radius)
    }

    /// Effect, such as `grayscale` or `sepia:50`.
    pub fn effect(self, effect: &str) -> Self {
        self.set("effect", effect)
    }

    /// Output format for fetched images.
    pub fn fetch_format(self, format: &str) -> Self {
        self.set("fetch_format", format)
    }

    /// Apply a transformation saved on the account under `name`.
    pub fn named_transformation(self, name: &str) -> Self {
        self.set("named_transformation", name)
    }

    /// Serve from the private CDN over `https`.
    pub fn secure(self, secure: bool) -> Self {
        self.set("secure", secure)
    }

    /// Resource type path segment; defaults to `image`.
    pub fn resource_type(self, resource_type: &str) -> Self {
        self.set("resource_type", resource_type)
    }

    /// Delivery type path segment; defaults to `upload`.
    pub fn delivery_type(self, delivery_type: &str) -> Self {
        self.set("type", delivery_type)
    }

    /// Returns the value of `key` exactly as it was set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether `secure` was set to anything other than empty, `false` or `0`.
    pub fn is_secure(&self) -> bool {
        self.get("secure")
            .is_some_and(|value| !matches!(value, "" | "false" | "0"))
    }

    /// Returns `true` when no option is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn transformation_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(key, _)| !CONTROL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// A rendered transformation: ordered `key_value` pairs with short keys.
///
/// Displays as the comma-joined path segment, e.g. `h_140,w_100`, and parses
/// back from the same syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformation {
    params: Vec<(String, String)>,
}

impl Transformation {
    /// Renders the transformation entries of `options`, in lexical order of
    /// the keys as given, with each key reduced to its short form.
    pub fn from_options(options: &Options, names: &OptionNames) -> Self {
        let params = options
            .transformation_entries()
            .map(|(key, value)| (names.resolve_short(key).to_string(), value.to_string()))
            .collect();

        Self { params }
    }

    /// Expands the transformation into [`Options`] keyed by long names.
    pub fn to_options(&self, names: &OptionNames) -> Options {
        self.params
            .iter()
            .fold(Options::new(), |options, (key, value)| {
                options.set(names.resolve_long(key), value)
            })
    }

    /// Returns `true` when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromStr for Transformation {
    type Err = &'static str;

    fn from_str(params: &str) -> Result<Self, Self::Err> {
        let params = params
            .split(',')
            .filter(|param| !param.is_empty())
            .map(|param| match param.split_once('_') {
                Some((key, value)) if !key.is_empty() => {
                    Ok((key.to_string(), value.to_string()))
                }
                _ => Err("Invalid parameter"),
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { params })
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params_iter = self.params.iter();

        if let Some((key, value)) = params_iter.next() {
            write!(f, "{key}_{value}")?;
            for (key, value) in params_iter {
                write!(f, ",{key}_{value}")?;
            }
        }

        Ok(())
    }
}
