use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::{
    config::Config,
    option_names::OptionNames,
    transformation::{Options, Transformation},
};

const DEFAULT_FORMAT: &str = "jpg";
const DEFAULT_RESOURCE_TYPE: &str = "image";
const DEFAULT_DELIVERY_TYPE: &str = "upload";

/// Characters escaped in the public id path segment. `/` is kept so that
/// folder-style ids stay readable, and `%` is kept so that ids which are
/// already percent-encoded pass through unchanged.
const PUBLIC_ID: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Errors building a delivery URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    /// No public id was given.
    #[error("a public id is required")]
    MissingPublicId,

    /// A secure URL was asked for but no private CDN is configured.
    #[error("secure URLs require a private CDN to be configured")]
    MissingPrivateCdn,
}

/// Builds delivery URLs for assets of one account.
///
/// URLs take the shape
/// `{cdn_base}/{cloud_name}/{resource_type}/{type}/{transformation}/{public_id}.{format}`,
/// skipping empty segments. Building is pure; the same inputs always give the
/// same URL.
///
/// # Example
///
/// ```rust
/// use cloudinary_client::{ApiSecret, Config, Credentials, Options, UrlBuilder};
///
/// let credentials = Credentials::new("demo", "1234", ApiSecret::new("abcd"))?;
/// let config = Config::builder(credentials).build()?;
/// let urls = UrlBuilder::new(&config);
///
/// assert_eq!(
///     urls.build_url("sample", &Options::new().width(100).height(140))?,
///     "http://res.cloudinary.com/demo/image/upload/h_140,w_100/sample.jpg"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    cloud_name: String,
    public_base: String,
    private_base: Option<String>,
    default_image: String,
    names: OptionNames,
}

impl UrlBuilder {
    /// Create a [`UrlBuilder`] for the account described by `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_names(config, OptionNames::new())
    }

    /// Create a [`UrlBuilder`] that resolves option names with `names`.
    pub fn with_names(config: &Config, names: OptionNames) -> Self {
        Self {
            cloud_name: config.cloud_name().to_string(),
            public_base: config.cdn_base().to_string(),
            private_base: config.private_cdn().map(ToOwned::to_owned),
            default_image: config.default_image().to_string(),
            names,
        }
    }

    /// The option names used to shorten transformation keys.
    pub fn names(&self) -> &OptionNames {
        &self.names
    }

    /// Builds the delivery URL of `public_id`.
    ///
    /// A trailing `.<ext>` on `public_id` sets the delivered format, which
    /// otherwise defaults to `jpg`.
    pub fn build_url(&self, public_id: &str, options: &Options) -> Result<String, UrlError> {
        if public_id.is_empty() {
            return Err(UrlError::MissingPublicId);
        }

        let base = if options.is_secure() {
            self.private_base
                .as_deref()
                .ok_or(UrlError::MissingPrivateCdn)?
        } else {
            self.public_base.as_str()
        };

        let (id, format) = split_format(public_id);
        let transformation = Transformation::from_options(options, &self.names).to_string();
        let file_name = format!("{}.{format}", utf8_percent_encode(id, PUBLIC_ID));

        let segments = [
            self.cloud_name.as_str(),
            options
                .get("resource_type")
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_RESOURCE_TYPE),
            options
                .get("type")
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_DELIVERY_TYPE),
            transformation.as_str(),
            file_name.as_str(),
        ];

        let path = segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");

        Ok(format!("{base}/{path}"))
    }

    /// Like [`UrlBuilder::build_url`], but returns the placeholder image path
    /// when there is no public id.
    pub fn url_or_placeholder(
        &self,
        public_id: Option<&str>,
        options: &Options,
    ) -> Result<String, UrlError> {
        match public_id.filter(|id| !id.is_empty()) {
            Some(public_id) => self.build_url(public_id, options),
            None => Ok(self.default_image.clone()),
        }
    }
}

/// Splits `public_id` into the bare id and its format.
///
/// The format is the text after the last `.` when that text is made of word
/// characters only; otherwise the whole input is the id and the format is
/// `jpg`.
fn split_format(public_id: &str) -> (&str, &str) {
    match public_id.rsplit_once('.') {
        Some((id, ext))
            if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            (id, ext)
        }
        _ => (public_id, DEFAULT_FORMAT),
    }
}
