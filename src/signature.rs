use std::collections::HashMap;

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::credentials::ApiSecret;

/// Parameters that take part in a request signature, in signing order.
///
/// Anything else in a request (`file`, `api_key`, ...) is left out of the
/// signature.
pub const SIGNATURE_KEYS: [&str; 8] = [
    "callback",
    "eager",
    "format",
    "public_id",
    "tags",
    "timestamp",
    "transformation",
    "type",
];

/// Unordered request parameters, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(HashMap<String, String>);

impl RequestParams {
    /// Create an empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set `key` only when a value is given.
    pub fn insert_opt(
        &mut self,
        key: impl Into<String>,
        value: Option<impl Into<String>>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Returns the value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate over all parameters in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds the string that gets hashed: signable `key=value` records
    /// joined with `&`, with the secret appended to the end.
    fn string_to_sign(&self, secret: &[u8]) -> Vec<u8> {
        let records: Vec<String> = SIGNATURE_KEYS
            .iter()
            .filter_map(|&key| {
                self.get(key)
                    .filter(|value| !value.is_empty())
                    .map(|value| format!("{key}={}", urlencoding::encode(value)))
            })
            .collect();

        let mut data = records.join("&").into_bytes();
        data.extend_from_slice(secret);
        data
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Computes the request signature for `params` with `secret`.
///
/// The result is the lowercase hex SHA-1 digest of the signable parameters
/// followed by the secret.
///
/// # Example
///
/// ```rust
/// use cloudinary_client::{sign, RequestParams};
///
/// let params: RequestParams = [
///     ("timestamp", "1315060510"),
///     ("public_id", "sample"),
///     ("file", "foo bar"),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(
///     sign(&params, "abcd"),
///     "c3470533147774275dd37996cc4d0e68fd03cd4f"
/// );
/// ```
pub fn sign(params: &RequestParams, secret: &str) -> String {
    digest(params, secret.as_bytes())
}

fn digest(params: &RequestParams, secret: &[u8]) -> String {
    hex::encode(Sha1::digest(params.string_to_sign(secret)))
}

/// Signs and verifies request parameters with an [`ApiSecret`].
#[derive(Debug, Clone)]
pub struct Signer {
    secret: ApiSecret,
}

impl Signer {
    /// Create a new [`Signer`] with the provided [`ApiSecret`].
    pub const fn new(secret: ApiSecret) -> Self {
        Self { secret }
    }

    /// Returns the signature for `params`.
    pub fn sign(&self, params: &RequestParams) -> String {
        digest(params, self.secret.as_bytes())
    }

    /// Verify a given signature against `params`.
    ///
    /// The comparison runs in constant time, and is case-insensitive on the
    /// hex digits.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cloudinary_client::{ApiSecret, RequestParams, Signer};
    ///
    /// let signer = Signer::new(ApiSecret::new("abcd"));
    ///
    /// let mut params = RequestParams::new();
    /// params.insert("timestamp", "1315060510");
    /// params.insert("public_id", "sample");
    /// params.insert("type", "upload");
    ///
    /// assert!(signer.verify(&params, "9c549a22def9e2690384973d77b3ff79d7b734d7"));
    /// assert!(!signer.verify(&params, "not a signature"));
    /// ```
    pub fn verify(&self, params: &RequestParams, signature: &str) -> bool {
        let expected = self.sign(params);
        let signature = signature.to_ascii_lowercase();
        if signature.len() != expected.len() {
            tracing::warn!("signature has unexpected length");
            return false;
        }

        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}
