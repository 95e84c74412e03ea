//! Multipart form parsing for the endpoints that accept an image.
//!
//! Text parts are collected by name; file parts are kept whole so the upload
//! store can check type and size before anything touches disk. An empty file
//! part (a form submitted with no file chosen) counts as no file.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
};

use crate::error::AppError;
use crate::services::uploads::{UploadKind, UploadStore};

/// A file part from a multipart form.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A fully-read `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl FormData {
    /// The first non-blank text value among `names`, trimmed.
    ///
    /// Several names are accepted so older clients that send the Indonesian
    /// field names keep working.
    #[must_use]
    pub fn text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Like [`Self::text`], owned.
    #[must_use]
    pub fn text_owned(&self, names: &[&str]) -> Option<String> {
        self.text(names).map(str::to_owned)
    }

    /// A required text value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with `message` if every name is missing
    /// or blank.
    pub fn require(&self, names: &[&str], message: &str) -> Result<&str, AppError> {
        self.text(names)
            .ok_or_else(|| AppError::Validation(message.to_owned()))
    }

    /// The first file part among `names`.
    #[must_use]
    pub fn file(&self, names: &[&str]) -> Option<&FilePart> {
        names.iter().find_map(|name| self.files.get(*name))
    }

    /// Store the file part among `names`, if any, returning its reference.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` if the file is rejected or cannot be written.
    pub async fn save_file(
        &self,
        store: &UploadStore,
        kind: UploadKind,
        names: &[&str],
    ) -> Result<Option<String>, AppError> {
        let Some(part) = self.file(names) else {
            return Ok(None);
        };
        let reference = store
            .save(
                kind,
                part.file_name.as_deref(),
                part.content_type.as_deref(),
                &part.bytes,
            )
            .await?;
        Ok(Some(reference))
    }

    #[cfg(test)]
    pub(crate) fn with_text(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_owned(), value.to_owned());
        self
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if field.file_name().is_some() {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                if file_name.is_none() && bytes.is_empty() {
                    continue;
                }
                form.files.entry(name).or_insert(FilePart {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await?;
                form.fields.entry(name).or_insert(value);
            }
        }

        Ok(form)
    }
}
