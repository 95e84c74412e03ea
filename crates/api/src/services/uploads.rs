//! Image uploads stored on local disk under `UPLOAD_DIR`.
//!
//! Files land in a per-kind directory with a random UUID name that keeps the
//! original extension. The stored reference is the path relative to the
//! upload root, served back at `/uploads/<reference>`.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Accepted image content types and the extension used when the client
/// sends none.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// What an uploaded image is for. Decides its directory and size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Catalog product photo.
    Product,
    /// Proof of bank transfer.
    PaymentProof,
    /// Profile picture.
    Avatar,
}

impl UploadKind {
    /// Subdirectory under the upload root.
    #[must_use]
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Product => "produk",
            Self::PaymentProof => "bukti_pembayaran",
            Self::Avatar => "profil",
        }
    }

    /// Maximum accepted size in bytes.
    #[must_use]
    pub const fn max_bytes(self) -> usize {
        match self {
            Self::Product | Self::PaymentProof => 5 * 1024 * 1024,
            Self::Avatar => 2 * 1024 * 1024,
        }
    }
}

/// Errors from storing or removing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Content type or extension is not an accepted image format.
    #[error("only JPEG, PNG, GIF and WebP images are allowed")]
    UnsupportedType,
    /// File exceeds the kind's limit.
    #[error("file is larger than {max_mb} MB")]
    TooLarge { max_mb: usize },
    /// The file part was empty.
    #[error("uploaded file is empty")]
    Empty,
    /// Filesystem failure.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes and deletes uploaded images.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The upload root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and every kind's directory.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if a directory cannot be created.
    pub async fn ensure_dirs(&self) -> Result<(), UploadError> {
        for kind in [UploadKind::Product, UploadKind::PaymentProof, UploadKind::Avatar] {
            tokio::fs::create_dir_all(self.root.join(kind.dir())).await?;
        }
        Ok(())
    }

    /// Validate and store an image, returning its reference.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the file is empty, too large, not an accepted
    /// image type, or cannot be written.
    pub async fn save(
        &self,
        kind: UploadKind,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        let extension = validate(kind, file_name, content_type, bytes.len())?;
        let reference = format!("{}/{}.{extension}", kind.dir(), Uuid::new_v4());

        let path = self.root.join(&reference);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(reference = %reference, size = bytes.len(), "Upload stored");
        Ok(reference)
    }

    /// Remove a previously stored file. Failures are logged, not returned.
    pub async fn remove(&self, reference: &str) {
        let Some(path) = self.resolve(reference) else {
            tracing::warn!(reference = %reference, "Refusing to remove upload outside root");
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(reference = %reference, "Upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(reference = %reference, error = %e, "Failed to remove upload"),
        }
    }

    /// Map a stored reference to a path, rejecting anything that escapes the root.
    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference);
        relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
            .then(|| self.root.join(relative))
    }
}

/// Check size and type, returning the extension to store under.
fn validate(
    kind: UploadKind,
    file_name: Option<&str>,
    content_type: Option<&str>,
    len: usize,
) -> Result<String, UploadError> {
    if len == 0 {
        return Err(UploadError::Empty);
    }
    if len > kind.max_bytes() {
        return Err(UploadError::TooLarge {
            max_mb: kind.max_bytes() / (1024 * 1024),
        });
    }

    let type_extension = content_type
        .map(|ct| ct.trim().to_ascii_lowercase())
        .and_then(|ct| {
            ALLOWED_TYPES
                .iter()
                .find(|(mime, _)| *mime == ct)
                .map(|(_, ext)| *ext)
        })
        .ok_or(UploadError::UnsupportedType)?;

    let name_extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match name_extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        Some(_) => Err(UploadError::UnsupportedType),
        None => Ok(type_extension.to_owned()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_per_kind() {
        assert_eq!(UploadKind::Product.max_bytes(), 5 * 1024 * 1024);
        assert_eq!(UploadKind::PaymentProof.max_bytes(), 5 * 1024 * 1024);
        assert_eq!(UploadKind::Avatar.max_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_validate_keeps_original_extension() {
        let ext = validate(UploadKind::Product, Some("Toga.JPEG"), Some("image/jpeg"), 10).unwrap();
        assert_eq!(ext, "jpeg");
    }

    #[test]
    fn test_validate_falls_back_to_content_type() {
        let ext = validate(UploadKind::Avatar, None, Some("image/webp"), 10).unwrap();
        assert_eq!(ext, "webp");
    }

    #[test]
    fn test_validate_rejects_non_images() {
        assert!(matches!(
            validate(UploadKind::Product, Some("a.pdf"), Some("application/pdf"), 10),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            validate(UploadKind::Product, Some("a.exe"), Some("image/png"), 10),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            validate(UploadKind::Product, Some("a.png"), None, 10),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn test_validate_size() {
        assert!(matches!(
            validate(UploadKind::Avatar, Some("a.png"), Some("image/png"), 3 * 1024 * 1024),
            Err(UploadError::TooLarge { max_mb: 2 })
        ));
        assert!(matches!(
            validate(UploadKind::Avatar, Some("a.png"), Some("image/png"), 0),
            Err(UploadError::Empty)
        ));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = UploadStore::new("/srv/uploads");
        assert!(store.resolve("produk/a.png").is_some());
        assert!(store.resolve("../etc/passwd").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("selempangku-uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&root);

        let reference = store
            .save(UploadKind::PaymentProof, Some("bukti.png"), Some("image/png"), b"\x89PNG")
            .await
            .unwrap();
        assert!(reference.starts_with("bukti_pembayaran/"));
        assert!(reference.ends_with(".png"));
        assert!(root.join(&reference).exists());

        store.remove(&reference).await;
        assert!(!root.join(&reference).exists());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
