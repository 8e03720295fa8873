use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::forms::{Form, Submission};
use crate::domain::{
    entities::Media,
    error::ApiError,
    ports::Transport,
    request::{member_path, ApiRequest, FilePart},
};

/// Form field the backend expects uploads under.
pub const UPLOAD_FIELD: &str = "media";

/// What the operator sees about a file before it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePreview {
    pub name: String,
    pub size: u64,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Upload {
    preview: FilePreview,
    bytes: Vec<u8>,
}

/// Pending media changes of an edit screen.
///
/// New files are queued for upload, existing media can be marked for deletion.
/// Nothing reaches the server until [`MediaEditor::submit`].
#[derive(Debug, Clone, Default)]
pub struct MediaEdit {
    existing: Vec<Media>,
    uploads: Vec<Upload>,
    marked: BTreeSet<i64>,
}

impl MediaEdit {
    pub fn new(existing: Vec<Media>) -> Self {
        Self {
            existing,
            ..Default::default()
        }
    }

    /// Read a local file and queue it for upload.
    pub fn attach(&mut self, path: &Path) -> Result<FilePreview> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
        let preview = FilePreview {
            name: file_name(path),
            size: bytes.len() as u64,
            mime: guess_mime(path),
        };
        self.uploads.push(Upload {
            preview: preview.clone(),
            bytes,
        });
        Ok(preview)
    }

    /// Queue raw bytes, e.g. from a clipboard or test.
    pub fn attach_bytes(&mut self, name: &str, bytes: Vec<u8>) -> FilePreview {
        let preview = FilePreview {
            name: name.to_string(),
            size: bytes.len() as u64,
            mime: guess_mime(Path::new(name)),
        };
        self.uploads.push(Upload {
            preview: preview.clone(),
            bytes,
        });
        preview
    }

    /// Mark an already uploaded media item for deletion. Unknown ids are ignored.
    pub fn mark_for_deletion(&mut self, media_id: i64) -> bool {
        if self.existing.iter().any(|m| m.id == media_id) {
            self.marked.insert(media_id)
        } else {
            debug!(media_id, "not an existing media item, ignored");
            false
        }
    }

    pub fn unmark(&mut self, media_id: i64) -> bool {
        self.marked.remove(&media_id)
    }

    pub fn has_uploads(&self) -> bool {
        !self.uploads.is_empty()
    }

    pub fn marked(&self) -> impl Iterator<Item = i64> + '_ {
        self.marked.iter().copied()
    }

    /// Existing media that will survive the submit.
    pub fn kept(&self) -> Vec<&Media> {
        self.existing
            .iter()
            .filter(|m| !self.marked.contains(&m.id))
            .collect()
    }

    pub fn file_parts(&self) -> Vec<FilePart> {
        self.uploads
            .iter()
            .map(|u| FilePart {
                field: UPLOAD_FIELD.to_string(),
                file_name: u.preview.name.clone(),
                mime: u.preview.mime.clone(),
                bytes: u.bytes.clone(),
            })
            .collect()
    }
}

/// Preview a local file without queueing it.
pub fn preview(path: &Path) -> Result<FilePreview> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat attachment: {}", path.display()))?;
    Ok(FilePreview {
        name: file_name(path),
        size: meta.len(),
        mime: guess_mime(path),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// MediaEditor
// ─────────────────────────────────────────────────────────────────────────────

/// Applies an edit screen's changes in order: queued deletions first, one by
/// one, then the field update. A failed deletion aborts before the update.
pub struct MediaEditor {
    transport: Arc<dyn Transport>,
}

impl MediaEditor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn submit(
        &self,
        resource: &str,
        id: i64,
        form: &impl Form,
        edit: &MediaEdit,
    ) -> Result<serde_json::Value, ApiError> {
        let submission = form.submission(Some(edit))?;

        for media_id in edit.marked() {
            let path = format!("{}/media/{}/", resource.trim_matches('/'), media_id);
            self.transport.send(ApiRequest::delete(path)).await?;
            debug!(resource, id, media_id, "media deleted");
        }

        let path = member_path(resource, id);
        let request = match submission {
            Submission::Json(body) => ApiRequest::patch_json(path, &body)?,
            Submission::Multipart(body) => ApiRequest::patch_multipart(path, body),
        };
        let result = self.transport.send(request).await?;
        info!(resource, id, uploads = edit.uploads.len(), "edit submitted");
        Ok(result)
    }
}
