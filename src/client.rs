use std::{
    io,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::{
    config::Config,
    delivery::{UrlBuilder, UrlError},
    file_input::FileInput,
    media_type::file_part_media_type,
    option_names::OptionNames,
    signature::{RequestParams, Signer},
    transformation::{Options, Transformation},
};

const DEFAULT_RESOURCE_TYPE: &str = "image";
const DEFAULT_DELIVERY_TYPE: &str = "upload";

/// Errors from upload and destroy calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A delivery URL could not be built.
    #[error(transparent)]
    Url(#[from] UrlError),

    /// No public id was given where one is required.
    #[error("a public id is required")]
    MissingPublicId,

    /// The file to upload has no content.
    #[error("the file to upload is empty")]
    EmptyFile,

    /// A local file could not be read.
    #[error("could not read {}: {source}", .path.display())]
    ReadFile {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The request could not be built or the service could not be reached.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    ///
    /// `body` holds the service's error message when it sent one.
    #[error(
        "request rejected with HTTP {status}: {}",
        .body.as_ref().map_or("no error body", |body| body.message())
    )]
    Api {
        /// Response status.
        status: StatusCode,
        /// Parsed error body, if the response had one.
        body: Option<ErrorBody>,
    },

    /// A success response could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// The service's error body, when the service rejected the request and
    /// explained why.
    ///
    /// Returns `None` both for rejections without a body and for requests that
    /// never got a response.
    pub fn error_body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Whether the service itself rejected the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

/// Error body returned by the service: `{"error": {"message": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

impl ErrorBody {
    /// The service's error message.
    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Error details inside an [`ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message.
    pub message: String,
}

/// Successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Public delivery URL.
    pub url: String,
    /// Delivery URL over `https`.
    pub secure_url: String,
    /// Public id assigned to the asset.
    pub public_id: String,
    /// Asset version.
    pub version: u64,
    /// Width in pixels, for images.
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in pixels, for images.
    #[serde(default)]
    pub height: Option<u32>,
    /// Stored format.
    #[serde(default)]
    pub format: Option<String>,
    /// Stored resource type.
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Any other fields the service returned.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Successful destroy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyResponse {
    /// Outcome reported by the service, e.g. `ok` or `not found`.
    pub result: String,
}

/// Options for [`Client::upload`].
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    public_id: Option<String>,
    format: Option<String>,
    tags: Vec<String>,
    resource_type: Option<String>,
    delivery_type: Option<String>,
    callback: Option<String>,
    eager: Vec<Options>,
    transformation: Option<Options>,
    timestamp: Option<u64>,
}

impl UploadOptions {
    /// Create empty upload options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Public id to store the asset under; the service picks one otherwise.
    pub fn public_id(self, public_id: impl Into<String>) -> Self {
        Self {
            public_id: Some(public_id.into()),
            ..self
        }
    }

    /// Format to convert the asset to on upload.
    pub fn format(self, format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            ..self
        }
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Resource type endpoint to upload to; defaults to `image`.
    pub fn resource_type(self, resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            ..self
        }
    }

    /// Delivery type of the stored asset, e.g. `private`.
    pub fn delivery_type(self, delivery_type: impl Into<String>) -> Self {
        Self {
            delivery_type: Some(delivery_type.into()),
            ..self
        }
    }

    /// URL the service redirects or posts to after the upload.
    pub fn callback(self, callback: impl Into<String>) -> Self {
        Self {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// Add a derived version to generate eagerly.
    pub fn eager(mut self, options: Options) -> Self {
        self.eager.push(options);
        self
    }

    /// Transformation applied to the original before storing it.
    pub fn transformation(self, options: Options) -> Self {
        Self {
            transformation: Some(options),
            ..self
        }
    }

    /// Signing timestamp in seconds since the epoch; defaults to now.
    pub fn timestamp(self, timestamp: u64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }
}

/// Options for [`Client::destroy`].
#[derive(Debug, Clone, Default)]
pub struct DestroyOptions {
    resource_type: Option<String>,
    delivery_type: Option<String>,
    timestamp: Option<u64>,
}

impl DestroyOptions {
    /// Create empty destroy options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource type endpoint; defaults to `image`.
    pub fn resource_type(self, resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            ..self
        }
    }

    /// Delivery type of the asset; defaults to `upload`.
    pub fn delivery_type(self, delivery_type: impl Into<String>) -> Self {
        Self {
            delivery_type: Some(delivery_type.into()),
            ..self
        }
    }

    /// Signing timestamp in seconds since the epoch; defaults to now.
    pub fn timestamp(self, timestamp: u64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }
}

/// Upload contents once local files have been read.
enum Payload {
    File {
        bytes: Bytes,
        file_name: Option<String>,
        content_type: Option<String>,
    },
    Url(Url),
}

/// Client for the upload API.
///
/// Cloning is cheap and clones share the underlying connection pool, so one
/// client can serve many concurrent uploads.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
    signer: Signer,
    names: OptionNames,
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    http: reqwest::Client,
    config: Config,
    names: OptionNames,
}

impl ClientBuilder {
    /// Create a new [`ClientBuilder`] with the provided [`Config`].
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            names: OptionNames::new(),
        }
    }

    /// Configure the HTTP `client`.
    pub fn set_client(self, http: reqwest::Client) -> Self {
        Self { http, ..self }
    }

    /// Configure the option names used to render transformations.
    pub fn set_option_names(self, names: OptionNames) -> Self {
        Self { names, ..self }
    }

    /// Build the [`Client`].
    pub fn build(self) -> Client {
        let signer = Signer::new(self.config.credentials().api_secret().clone());

        Client {
            http: self.http,
            config: self.config,
            signer,
            names: self.names,
        }
    }
}

impl Client {
    /// The configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A [`UrlBuilder`] for this client's account.
    pub fn url_builder(&self) -> UrlBuilder {
        UrlBuilder::with_names(&self.config, self.names.clone())
    }

    /// Shortcut for building one delivery URL.
    pub fn build_url(&self, public_id: &str, options: &Options) -> Result<String, Error> {
        Ok(self.url_builder().build_url(public_id, options)?)
    }

    /// Uploads `file`.
    ///
    /// Local files and in-memory bytes are sent as `multipart/form-data`;
    /// remote URLs are handed to the service to fetch.
    #[instrument(skip_all, fields(public_id = ?options.public_id), err)]
    pub async fn upload(
        &self,
        file: impl Into<FileInput>,
        options: UploadOptions,
    ) -> Result<UploadResponse, Error> {
        let file = file.into();
        let file_name = file.file_name();
        let payload = match file {
            FileInput::LocalPath(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| Error::ReadFile {
                        path: path.clone(),
                        source,
                    })?;
                Payload::File {
                    bytes: Bytes::from(bytes),
                    file_name,
                    content_type: None,
                }
            }
            FileInput::InMemoryBytes {
                bytes,
                content_type,
                ..
            } => Payload::File {
                bytes,
                file_name,
                content_type,
            },
            FileInput::RemoteUrl(url) => Payload::Url(url),
        };

        let request = self.build_upload_request(payload, &options)?;
        self.execute(request).await
    }

    /// Uploads several files concurrently.
    ///
    /// Results are returned in the order the uploads were given.
    pub async fn upload_all<I, F>(&self, uploads: I) -> Vec<Result<UploadResponse, Error>>
    where
        I: IntoIterator<Item = (F, UploadOptions)>,
        F: Into<FileInput>,
    {
        futures_util::future::join_all(
            uploads
                .into_iter()
                .map(|(file, options)| self.upload(file, options)),
        )
        .await
    }

    /// Deletes the asset stored under `public_id`.
    #[instrument(skip(self, options), err)]
    pub async fn destroy(
        &self,
        public_id: &str,
        options: DestroyOptions,
    ) -> Result<DestroyResponse, Error> {
        let request = self.build_destroy_request(public_id, &options)?;
        self.execute(request).await
    }

    fn endpoint(&self, resource_type: Option<&str>, action: &str) -> String {
        format!(
            "{}/{}/{}/{action}",
            self.config.api_base(),
            self.config.cloud_name(),
            resource_type
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_RESOURCE_TYPE),
        )
    }

    fn upload_params(&self, options: &UploadOptions) -> RequestParams {
        let mut params = RequestParams::new();
        params
            .insert(
                "timestamp",
                options.timestamp.unwrap_or_else(unix_timestamp).to_string(),
            )
            .insert_opt("public_id", options.public_id.clone())
            .insert_opt("format", options.format.clone())
            .insert_opt("type", options.delivery_type.clone())
            .insert_opt("callback", options.callback.clone());

        if !options.tags.is_empty() {
            params.insert("tags", options.tags.join(","));
        }
        if !options.eager.is_empty() {
            let eager: Vec<String> = options
                .eager
                .iter()
                .map(|eager| Transformation::from_options(eager, &self.names).to_string())
                .collect();
            params.insert("eager", eager.join("|"));
        }
        if let Some(transformation) = &options.transformation {
            params.insert(
                "transformation",
                Transformation::from_options(transformation, &self.names).to_string(),
            );
        }

        params
    }

    /// Request fields: the parameters plus `api_key` and `signature`, sorted
    /// by name.
    fn signed_fields(&self, params: &RequestParams) -> Vec<(String, String)> {
        let signature = self.signer.sign(params);

        let mut fields: Vec<(String, String)> = params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        fields.push((
            "api_key".to_string(),
            self.config.credentials().api_key().to_string(),
        ));
        fields.push(("signature".to_string(), signature));
        fields.sort();
        fields
    }

    fn build_upload_request(
        &self,
        payload: Payload,
        options: &UploadOptions,
    ) -> Result<reqwest::Request, Error> {
        let endpoint = self.endpoint(options.resource_type.as_deref(), "upload");
        let fields = self.signed_fields(&self.upload_params(options));

        let request = match payload {
            Payload::File {
                bytes,
                file_name,
                content_type,
            } => {
                if bytes.is_empty() {
                    return Err(Error::EmptyFile);
                }

                let media_type =
                    file_part_media_type(content_type.as_deref(), file_name.as_deref(), &bytes);
                let len = bytes.len() as u64;
                let mut part = Part::stream_with_length(bytes, len).mime_str(&media_type)?;
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name);
                }

                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (key, value)| form.text(key, value))
                    .part("file", part);

                self.http.post(endpoint).multipart(form)
            }
            Payload::Url(url) => {
                let mut fields = fields;
                fields.push(("file".to_string(), url.to_string()));
                self.http.post(endpoint).form(&fields)
            }
        };

        Ok(request.build()?)
    }

    fn build_destroy_request(
        &self,
        public_id: &str,
        options: &DestroyOptions,
    ) -> Result<reqwest::Request, Error> {
        if public_id.is_empty() {
            return Err(Error::MissingPublicId);
        }

        let mut params = RequestParams::new();
        params
            .insert("public_id", public_id)
            .insert(
                "timestamp",
                options.timestamp.unwrap_or_else(unix_timestamp).to_string(),
            )
            .insert(
                "type",
                options
                    .delivery_type
                    .as_deref()
                    .filter(|value| !value.is_empty())
                    .unwrap_or(DEFAULT_DELIVERY_TYPE),
            );

        let endpoint = self.endpoint(options.resource_type.as_deref(), "destroy");
        let fields = self.signed_fields(&params);

        Ok(self.http.post(endpoint).form(&fields).build()?)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T, Error> {
        let url = request.url().clone();

        let response = match self.http.execute(request).await {
            Err(err) => {
                tracing::error!(err = %err, url = %url, "failed to reach upload API");
                return Err(Error::Http(err));
            }

            Ok(response) => response,
        };

        let status = response.status();
        let body = match response.bytes().await {
            Err(err) => {
                tracing::error!(err = %err, url = %url, "failed to read response body");
                return Err(Error::Http(err));
            }

            Ok(body) => body,
        };

        interpret_response(status, &body)
    }
}

/// Turns a response into the success type, or an [`Error::Api`] carrying the
/// error body when there is one.
fn interpret_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, Error> {
    if status.is_success() {
        return serde_json::from_slice(body).map_err(|err| {
            tracing::error!(err = %err, "could not decode success response");
            Error::Decode(err)
        });
    }

    let body = serde_json::from_slice::<ErrorBody>(body).ok();
    match &body {
        Some(body) => tracing::warn!(%status, message = body.message(), "request rejected"),
        None => tracing::warn!(%status, "request rejected without an error body"),
    }

    Err(Error::Api { status, body })
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::credentials::{ApiSecret, Credentials};

    fn client() -> Client {
        let credentials = Credentials::new("demo", "1234", ApiSecret::new("abcd")).unwrap();
        let config = Config::builder(credentials)
            .set_api_base("https://api.example.com/v1_1")
            .build()
            .unwrap();
        ClientBuilder::new(config).build()
    }

    fn form_fields(request: &reqwest::Request) -> Vec<(String, String)> {
        let body = request.body().and_then(|body| body.as_bytes()).unwrap();
        url::form_urlencoded::parse(body).into_owned().collect()
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn upload_params_are_signed() {
        let client = client();
        let options = UploadOptions::new().public_id("sample").timestamp(1315060510);
        let fields = client.signed_fields(&client.upload_params(&options));

        assert_eq!(
            fields,
            vec![
                ("api_key".to_string(), "1234".to_string()),
                ("public_id".to_string(), "sample".to_string()),
                (
                    "signature".to_string(),
                    "c3470533147774275dd37996cc4d0e68fd03cd4f".to_string()
                ),
                ("timestamp".to_string(), "1315060510".to_string()),
            ]
        );
    }

    #[test]
    fn upload_params_render_tags_and_transformations() {
        let client = client();
        let options = UploadOptions::new()
            .tag("cats")
            .tag("pets")
            .eager(Options::new().width(100))
            .eager(Options::new().crop("thumb").set("h", 50))
            .transformation(Options::new().angle(90))
            .timestamp(1);
        let params = client.upload_params(&options);

        assert_eq!(params.get("tags"), Some("cats,pets"));
        assert_eq!(params.get("eager"), Some("w_100|c_thumb,h_50"));
        assert_eq!(params.get("transformation"), Some("a_90"));
        assert_eq!(params.get("public_id"), None);
    }

    #[test]
    fn remote_url_upload_is_form_encoded() {
        let client = client();
        let url: Url = "https://example.com/cat.png".parse().unwrap();
        let options = UploadOptions::new().public_id("cat").timestamp(1315060510);
        let request = client
            .build_upload_request(Payload::Url(url), &options)
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/v1_1/demo/image/upload"
        );

        let fields = form_fields(&request);
        assert_eq!(field(&fields, "file"), Some("https://example.com/cat.png"));
        assert_eq!(field(&fields, "api_key"), Some("1234"));
        assert_eq!(field(&fields, "public_id"), Some("cat"));

        let params: RequestParams = [("public_id", "cat"), ("timestamp", "1315060510")]
            .into_iter()
            .collect();
        assert_eq!(
            field(&fields, "signature"),
            Some(crate::sign(&params, "abcd").as_str())
        );
    }

    #[test]
    fn bytes_upload_is_multipart() {
        let client = client();
        let payload = Payload::File {
            bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            file_name: Some("cat.png".to_string()),
            content_type: Some("text/plain".to_string()),
        };
        let options = UploadOptions::new().resource_type("raw").timestamp(1);
        let request = client.build_upload_request(payload, &options).unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/v1_1/demo/raw/upload"
        );
        let content_type = request
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        assert!(request
            .headers()
            .contains_key(reqwest::header::CONTENT_LENGTH));
    }

    #[test]
    fn empty_file_is_rejected() {
        let client = client();
        let payload = Payload::File {
            bytes: Bytes::new(),
            file_name: None,
            content_type: None,
        };
        let err = client
            .build_upload_request(payload, &UploadOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyFile));
    }

    #[test]
    fn destroy_request_shape() {
        let client = client();
        let request = client
            .build_destroy_request("sample", &DestroyOptions::new().timestamp(1315060510))
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/v1_1/demo/image/destroy"
        );
        let fields = form_fields(&request);
        assert_eq!(field(&fields, "type"), Some("upload"));
        assert_eq!(
            field(&fields, "signature"),
            Some("9c549a22def9e2690384973d77b3ff79d7b734d7")
        );
    }

    #[test]
    fn empty_destroy_types_use_defaults() {
        let client = client();
        let options = DestroyOptions::new()
            .resource_type("")
            .delivery_type("")
            .timestamp(1315060510);
        let request = client.build_destroy_request("sample", &options).unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/v1_1/demo/image/destroy"
        );
        let fields = form_fields(&request);
        assert_eq!(field(&fields, "type"), Some("upload"));
        assert_eq!(
            field(&fields, "signature"),
            Some("9c549a22def9e2690384973d77b3ff79d7b734d7")
        );
    }

    #[test]
    fn empty_upload_resource_type_uses_default() {
        let client = client();
        let url: Url = "https://example.com/cat.png".parse().unwrap();
        let options = UploadOptions::new().resource_type("").timestamp(1);
        let request = client
            .build_upload_request(Payload::Url(url), &options)
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn destroy_requires_public_id() {
        let err = client()
            .build_destroy_request("", &DestroyOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::MissingPublicId));
    }

    #[test]
    fn success_response_is_decoded() {
        let body = br#"{
            "url": "http://res.cloudinary.com/demo/image/upload/v1/sample.jpg",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/sample.jpg",
            "public_id": "sample",
            "version": 1,
            "width": 864,
            "height": 576,
            "bytes": 120253
        }"#;
        let response: UploadResponse = interpret_response(StatusCode::OK, body).unwrap();

        assert_eq!(response.public_id, "sample");
        assert_eq!(response.version, 1);
        assert_eq!(response.width, Some(864));
        assert_eq!(response.format, None);
        assert_eq!(response.extra.get("bytes"), Some(&serde_json::json!(120253)));
    }

    #[test]
    fn error_response_keeps_message() {
        let body = br#"{"error": {"message": "Invalid Signature"}}"#;
        let err = interpret_response::<UploadResponse>(StatusCode::UNAUTHORIZED, body).unwrap_err();

        assert!(err.is_rejected());
        assert_eq!(err.error_body().map(ErrorBody::message), Some("Invalid Signature"));
        assert_eq!(
            err.to_string(),
            "request rejected with HTTP 401 Unauthorized: Invalid Signature"
        );
    }

    #[test]
    fn error_response_without_body() {
        let err =
            interpret_response::<DestroyResponse>(StatusCode::BAD_GATEWAY, b"").unwrap_err();

        assert!(err.is_rejected());
        assert_eq!(err.error_body(), None);
    }

    #[test]
    fn malformed_success_is_a_decode_error() {
        let err = interpret_response::<DestroyResponse>(StatusCode::OK, b"<html>").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
