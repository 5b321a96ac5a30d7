//! Account configuration: credentials, delivery bases and API endpoint.
use std::env;

use url::Url;

use crate::credentials::{ApiSecret, Credentials, CredentialsError};

const ENV_URL: &str = "CLOUDINARY_URL";
const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
const ENV_API_KEY: &str = "CLOUDINARY_API_KEY";
const ENV_API_SECRET: &str = "CLOUDINARY_API_SECRET";
const ENV_PRIVATE_CDN: &str = "CLOUDINARY_PRIVATE_CDN";
const ENV_DEFAULT_IMAGE: &str = "CLOUDINARY_DEFAULT_IMAGE";

/// Public delivery base.
pub const DEFAULT_CDN_BASE: &str = "http://res.cloudinary.com";
/// Upload API base; requests go to `{api_base}/{cloud_name}/{resource_type}/{action}`.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";
/// Placeholder returned when there is no asset to point at.
pub const DEFAULT_IMAGE: &str = "/images/blank.gif";

/// Errors raised while assembling a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Credentials were given but incomplete.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// Required environment variables were not set.
    #[error("configuration is incomplete, missing: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),

    /// A configured base or `CLOUDINARY_URL` could not be used.
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl {
        /// Setting that was rejected.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    credentials: Credentials,
    cdn_base: String,
    api_base: String,
    private_cdn: Option<String>,
    default_image: String,
}

impl Config {
    /// Returns a [`ConfigBuilder`] seeded with `credentials` and the default
    /// bases.
    pub fn builder(credentials: Credentials) -> ConfigBuilder {
        ConfigBuilder {
            credentials,
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            private_cdn: None,
            default_image: DEFAULT_IMAGE.to_string(),
        }
    }

    /// Load configuration from the environment.
    ///
    /// Either `CLOUDINARY_URL` (`cloudinary://<api_key>:<api_secret>@<cloud_name>`)
    /// or the individual `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY` and
    /// `CLOUDINARY_API_SECRET` variables must be set; individual variables win
    /// over the URL. `CLOUDINARY_PRIVATE_CDN` and `CLOUDINARY_DEFAULT_IMAGE` are
    /// optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        parse_config(|key| env::var(key).ok())
    }

    /// Account credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Shortcut for the credentials' cloud name.
    pub fn cloud_name(&self) -> &str {
        self.credentials.cloud_name()
    }

    /// Public delivery base, without a trailing slash.
    pub fn cdn_base(&self) -> &str {
        &self.cdn_base
    }

    /// Upload API base, without a trailing slash.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Private CDN base for secure URLs, if configured.
    pub fn private_cdn(&self) -> Option<&str> {
        self.private_cdn.as_deref()
    }

    /// Placeholder image path.
    pub fn default_image(&self) -> &str {
        &self.default_image
    }
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    credentials: Credentials,
    cdn_base: String,
    api_base: String,
    private_cdn: Option<String>,
    default_image: String,
}

impl ConfigBuilder {
    /// Configure the public delivery base.
    pub fn set_cdn_base(self, cdn_base: impl Into<String>) -> Self {
        Self {
            cdn_base: cdn_base.into(),
            ..self
        }
    }

    /// Configure the upload API base.
    pub fn set_api_base(self, api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..self
        }
    }

    /// Configure the private CDN used for secure URLs.
    ///
    /// A bare host such as `demo-res.cloudinary.com` is served over `https`.
    pub fn set_private_cdn(self, private_cdn: impl Into<String>) -> Self {
        Self {
            private_cdn: Some(private_cdn.into()),
            ..self
        }
    }

    /// Configure the placeholder image path.
    pub fn set_default_image(self, default_image: impl Into<String>) -> Self {
        Self {
            default_image: default_image.into(),
            ..self
        }
    }

    /// Validate the bases and build the [`Config`].
    pub fn build(self) -> Result<Config, ConfigError> {
        let cdn_base = normalize_base("cdn_base", &self.cdn_base)?;
        let api_base = normalize_base("api_base", &self.api_base)?;
        let private_cdn = self
            .private_cdn
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| {
                if value.contains("://") {
                    normalize_base("private_cdn", value)
                } else {
                    normalize_base("private_cdn", &format!("https://{value}"))
                }
            })
            .transpose()?;

        Ok(Config {
            credentials: self.credentials,
            cdn_base,
            api_base,
            private_cdn,
            default_image: self.default_image,
        })
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let read = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let from_url = read(ENV_URL)
        .map(|value| parse_cloudinary_url(&value))
        .transpose()?
        .unwrap_or_default();

    let cloud_name = read(ENV_CLOUD_NAME).or(from_url.cloud_name);
    let api_key = read(ENV_API_KEY).or(from_url.api_key);
    let api_secret = read(ENV_API_SECRET).or(from_url.api_secret);

    let mut missing = Vec::new();
    if cloud_name.is_none() {
        missing.push(ENV_CLOUD_NAME);
    }
    if api_key.is_none() {
        missing.push(ENV_API_KEY);
    }
    if api_secret.is_none() {
        missing.push(ENV_API_SECRET);
    }

    let (Some(cloud_name), Some(api_key), Some(api_secret)) = (cloud_name, api_key, api_secret)
    else {
        return Err(ConfigError::MissingEnv(missing));
    };

    let credentials = Credentials::new(cloud_name, api_key, ApiSecret::new(api_secret))?;
    let mut builder = Config::builder(credentials);
    if let Some(private_cdn) = read(ENV_PRIVATE_CDN) {
        builder = builder.set_private_cdn(private_cdn);
    }
    if let Some(default_image) = read(ENV_DEFAULT_IMAGE) {
        builder = builder.set_default_image(default_image);
    }

    builder.build()
}

#[derive(Debug, Default)]
struct UrlCredentials {
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

fn parse_cloudinary_url(raw: &str) -> Result<UrlCredentials, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        name: ENV_URL,
        reason,
    };

    let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if url.scheme() != "cloudinary" {
        return Err(invalid(format!(
            "expected the cloudinary:// scheme, got {}://",
            url.scheme()
        )));
    }

    let decode = |value: &str| {
        percent_encoding::percent_decode_str(value)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|err| invalid(err.to_string()))
    };

    let non_empty = |value: String| Some(value).filter(|value| !value.is_empty());

    Ok(UrlCredentials {
        cloud_name: url.host_str().map(ToOwned::to_owned).and_then(non_empty),
        api_key: non_empty(decode(url.username())?),
        api_secret: url.password().map(decode).transpose()?.and_then(non_empty),
    })
}

fn normalize_base(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let base = raw.trim().trim_end_matches('/');
    let url = Url::parse(base).map_err(|err| ConfigError::InvalidUrl {
        name,
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            name,
            reason: "must start with http:// or https://".to_string(),
        });
    }

    Ok(base.to_string())
}
