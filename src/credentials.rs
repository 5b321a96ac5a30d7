/// Shared secret used for signing API requests.
///
/// The secret is never sent to the service and never printed by `Debug`.
#[derive(Clone)]
pub struct ApiSecret(String);

impl PartialEq for ApiSecret {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;

        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for ApiSecret {}

impl std::fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSecret").finish()
    }
}

impl ApiSecret {
    /// Wraps a secret string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Account credentials: cloud name, API key and API secret.
///
/// All three are required. Construction fails with every missing field named,
/// so a misconfigured application stops before any request is built.
///
/// # Example
///
/// ```rust
/// use cloudinary_client::{ApiSecret, Credentials};
///
/// let credentials = Credentials::new("demo", "1234", ApiSecret::new("abcd")).unwrap();
/// assert_eq!(credentials.cloud_name(), "demo");
///
/// // Blank values count as missing.
/// assert!(Credentials::new("demo", " ", ApiSecret::new("abcd")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    cloud_name: String,
    api_key: String,
    api_secret: ApiSecret,
}

impl Credentials {
    /// Validates and creates a new set of [`Credentials`].
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: ApiSecret,
    ) -> Result<Self, CredentialsError> {
        let cloud_name = cloud_name.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();

        let mut missing = Vec::new();
        if cloud_name.is_empty() {
            missing.push("cloud_name");
        }
        if api_key.is_empty() {
            missing.push("api_key");
        }
        if api_secret.is_blank() {
            missing.push("api_secret");
        }

        if !missing.is_empty() {
            return Err(CredentialsError::Missing(missing));
        }

        Ok(Self {
            cloud_name,
            api_key,
            api_secret,
        })
    }

    /// The account's cloud name.
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// The public API key, sent with every signed request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The API secret.
    pub fn api_secret(&self) -> &ApiSecret {
        &self.api_secret
    }
}

/// Error returned when credentials are incomplete.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CredentialsError {
    /// The listed fields were missing or blank.
    #[error("missing required credentials: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}
