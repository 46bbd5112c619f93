//! Local files attached to a chat turn.

use crate::error::AttachmentError;
use crate::session::Attachment;
use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};

pub const MAX_FILES: usize = 4;
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Accepted MIME types; a trailing `/*` matches the whole family.
const ALLOWED_TYPES: [&str; 4] = ["image/*", "application/pdf", "application/zip", "text/*"];

/// Read and validate every attachment given for one turn.
pub fn load_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    if paths.len() > MAX_FILES {
        return Err(AttachmentError::TooMany { max: MAX_FILES }.into());
    }
    paths.iter().map(PathBuf::as_path).map(read_attachment).collect()
}

/// Inline a local file as a data-URL attachment.
pub fn read_attachment(path: &Path) -> Result<Attachment> {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let size = std::fs::metadata(path)
        .with_context(|| format!("read attachment {}", path.display()))?
        .len();
    if size > MAX_FILE_SIZE {
        return Err(AttachmentError::TooLarge { name }.into());
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("read attachment {}", path.display()))?;
    let kind = detect_mime(&bytes, path);
    if !is_allowed(&kind) {
        return Err(AttachmentError::Unsupported { kind }.into());
    }

    Ok(Attachment {
        name,
        url: format!("data:{kind};base64,{}", STANDARD.encode(&bytes)),
        kind,
        size: bytes.len() as u64,
    })
}

/// Content sniffing first, the file extension second.
pub fn detect_mime(bytes: &[u8], path: &Path) -> String {
    infer::get(bytes)
        .map(|info| info.mime_type().to_string())
        .or_else(|| mime_from_extension(path).map(str::to_string))
        .unwrap_or_else(|| "application/octet-stream".into())
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        "zip" => Some("application/zip"),
        "txt" | "md" | "log" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "html" | "htm" => Some("text/html"),
        "json" => Some("application/json"),
        _ => None,
    }
}

fn is_allowed(kind: &str) -> bool {
    ALLOWED_TYPES.iter().any(|allowed| match allowed.strip_suffix("/*") {
        Some(family) => kind
            .split_once('/')
            .is_some_and(|(prefix, _)| prefix == family),
        None => kind == *allowed,
    })
}

/// Append the `[Attached files: ...]` marker so the model knows what was sent.
pub fn with_attachment_marker(text: &str, attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return text.to_string();
    }
    let names: Vec<&str> = attachments.iter().map(|a| a.name.as_str()).collect();
    format!("{text} [Attached files: {}]", names.join(", "))
        .trim_start()
        .to_string()
}
