//! # Overview
//!
//! This crate is a client for Cloudinary-style media services: it signs and
//! sends upload and destroy requests, and builds delivery URLs that carry
//! image transformations.
//!
//! Signing and URL building are plain functions of their inputs and can be
//! used without the HTTP client.
//!
//! # Building delivery URLs
//!
//! ```rust
//! use cloudinary_client::{ApiSecret, Config, Credentials, Options, UrlBuilder};
//!
//! let credentials = Credentials::new("demo", "1234", ApiSecret::new("abcd"))?;
//! let config = Config::builder(credentials).build()?;
//! let urls = UrlBuilder::new(&config);
//!
//! let url = urls.build_url("sample", &Options::new().width(100).height(140))?;
//! assert_eq!(
//!     url,
//!     "http://res.cloudinary.com/demo/image/upload/h_140,w_100/sample.jpg"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Uploading and deleting
//!
//! ```rust,no_run
//! use cloudinary_client::{ClientBuilder, Config, DestroyOptions, FileInput, UploadOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new(Config::from_env()?).build();
//!
//!     let uploaded = client
//!         .upload(
//!             FileInput::parse("https://www.rustacean.net/assets/rustacean-orig-noshadow.png"),
//!             UploadOptions::new().public_id("ferris").tag("mascots"),
//!         )
//!         .await?;
//!     println!("uploaded to {}", uploaded.secure_url);
//!
//!     client.destroy("ferris", DestroyOptions::new()).await?;
//!
//!     Ok(())
//! }
//! ```
#![warn(
    clippy::all,
    nonstandard_style,
    future_incompatible,
    missing_docs,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

mod client;
pub mod config;
mod credentials;
mod delivery;
mod file_input;
pub mod media_type;
mod option_names;
mod signature;
mod transformation;

pub use client::{
    Client, ClientBuilder, DestroyOptions, DestroyResponse, Error, ErrorBody, ErrorDetail,
    UploadOptions, UploadResponse,
};
pub use config::{Config, ConfigBuilder, ConfigError};
pub use credentials::{ApiSecret, Credentials, CredentialsError};
pub use delivery::{UrlBuilder, UrlError};
pub use file_input::FileInput;
pub use option_names::OptionNames;
pub use signature::{sign, RequestParams, Signer, SIGNATURE_KEYS};
pub use transformation::{Options, Transformation};
