use std::path::{Path, PathBuf};

use bytes::Bytes;
use url::Url;

/// Schemes the service fetches by itself when given as the upload `file`.
const REMOTE_SCHEMES: [&str; 5] = ["http", "https", "ftp", "s3", "data"];

/// What to upload.
///
/// Resolve the caller's input into one of these once, at the call boundary;
/// the client then knows whether to send a multipart body or a URL field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInput {
    /// A file on the local filesystem, read when the upload is sent.
    LocalPath(PathBuf),

    /// File contents already in memory.
    InMemoryBytes {
        /// File contents.
        bytes: Bytes,
        /// Name sent with the file part, if any.
        file_name: Option<String>,
        /// Declared content type; `text/plain` is ignored.
        content_type: Option<String>,
    },

    /// A URL the service downloads from.
    RemoteUrl(Url),
}

impl FileInput {
    /// Interprets `input` as a remote URL when it has a supported scheme, and
    /// as a local path otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cloudinary_client::FileInput;
    ///
    /// assert!(matches!(
    ///     FileInput::parse("https://example.com/cat.png"),
    ///     FileInput::RemoteUrl(_)
    /// ));
    /// assert!(matches!(
    ///     FileInput::parse("./cat.png"),
    ///     FileInput::LocalPath(_)
    /// ));
    /// ```
    pub fn parse(input: &str) -> Self {
        match Url::parse(input) {
            Ok(url) if REMOTE_SCHEMES.contains(&url.scheme()) => Self::RemoteUrl(url),
            _ => Self::LocalPath(PathBuf::from(input)),
        }
    }

    /// In-memory contents with a file name.
    pub fn bytes(bytes: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        Self::InMemoryBytes {
            bytes: bytes.into(),
            file_name: Some(file_name.into()),
            content_type: None,
        }
    }

    /// The file name sent with a multipart file part.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::LocalPath(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Self::InMemoryBytes { file_name, .. } => file_name.clone(),
            Self::RemoteUrl(_) => None,
        }
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        Self::LocalPath(path)
    }
}

impl From<&Path> for FileInput {
    fn from(path: &Path) -> Self {
        Self::LocalPath(path.to_path_buf())
    }
}

impl From<Url> for FileInput {
    fn from(url: Url) -> Self {
        Self::RemoteUrl(url)
    }
}

impl From<Bytes> for FileInput {
    fn from(bytes: Bytes) -> Self {
        Self::InMemoryBytes {
            bytes,
            file_name: None,
            content_type: None,
        }
    }
}

impl From<Vec<u8>> for FileInput {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_remote_schemes() {
        for input in [
            "http://example.com/a.png",
            "https://example.com/a.png",
            "ftp://example.com/a.png",
            "s3://bucket/a.png",
            "data:image/png;base64,iVBORw0KGgo=",
        ] {
            assert!(
                matches!(FileInput::parse(input), FileInput::RemoteUrl(_)),
                "{input} should be remote"
            );
        }
    }

    #[test]
    fn parse_local_paths() {
        assert_eq!(
            FileInput::parse("/tmp/a.png"),
            FileInput::LocalPath(PathBuf::from("/tmp/a.png"))
        );
        assert_eq!(
            FileInput::parse("C:\\photos\\a.png"),
            FileInput::LocalPath(PathBuf::from("C:\\photos\\a.png"))
        );
        assert_eq!(
            FileInput::parse("file:///tmp/a.png"),
            FileInput::LocalPath(PathBuf::from("file:///tmp/a.png"))
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(
            FileInput::from(PathBuf::from("/tmp/cat.png")).file_name(),
            Some("cat.png".to_string())
        );
        assert_eq!(
            FileInput::bytes(vec![1, 2, 3], "dog.gif").file_name(),
            Some("dog.gif".to_string())
        );
        assert_eq!(FileInput::from(vec![1, 2, 3]).file_name(), None);
        assert_eq!(
            FileInput::parse("https://example.com/a.png").file_name(),
            None
        );
    }
}
