//! Pasted images → vault attachments.
//!
//! Images pasted into the editor are written to the vault's attachment
//! folder under a timestamped name, and links to them are inserted at the
//! caret in the vault's preferred link style.

use crate::host::{DocumentStore, VaultPreferences};
use chrono::NaiveDateTime;

/// One clipboard item handed over by the editor's paste hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastedImage {
    /// MIME type, e.g. `image/png`.
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl PastedImage {
    pub fn new(mime: &str, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.to_string(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// File extension from the MIME subtype (`image/svg+xml` → `.svg`),
    /// `.png` when there is none.
    pub fn extension(&self) -> String {
        self.mime
            .split_once('/')
            .map(|(_, sub)| sub.split(['+', ';']).next().unwrap_or_default().trim())
            .filter(|sub| !sub.is_empty())
            .map_or_else(|| ".png".to_string(), |sub| format!(".{sub}"))
    }
}

/// Folder part of a vault path (`""` for the vault root).
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

fn file_name(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Folder pasted images go to, for a note at `source_path`.
pub fn attachment_folder(prefs: &VaultPreferences, source_path: &str) -> String {
    let source_dir = parent_dir(source_path);
    let setting = prefs
        .attachment_folder
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if setting.is_empty() {
        return source_dir.to_string();
    }
    match setting.strip_prefix("./") {
        Some(rel) if source_dir.is_empty() => rel.to_string(),
        Some("") => source_dir.to_string(),
        Some(rel) => format!("{source_dir}/{rel}"),
        None => setting.to_string(),
    }
}

/// `Pasted image 20240131_235959[ 2][ (3)].png`
fn attachment_name(stamp: &str, index: Option<usize>, attempt: Option<u32>, ext: &str) -> String {
    let mut name = format!("Pasted image {stamp}");
    if let Some(i) = index {
        name.push_str(&format!(" {i}"));
    }
    if let Some(n) = attempt {
        name.push_str(&format!(" ({n})"));
    }
    name.push_str(ext);
    name
}

/// Link text for a saved attachment.
pub fn link_for(path: &str, source_path: &str, use_markdown_links: bool) -> String {
    if use_markdown_links {
        let source_dir = parent_dir(source_path);
        let rel = if source_dir.is_empty() {
            path
        } else {
            path.strip_prefix(source_dir)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(path)
        };
        format!("![]({rel})")
    } else {
        format!("![[{}]]", file_name(path))
    }
}

/// Save `images` for the note at `source_path` and return the link text to
/// insert (newline separated). Images that fail to save are logged and
/// left out.
pub async fn save_pasted_images(
    store: &dyn DocumentStore,
    source_path: &str,
    images: &[PastedImage],
    now: NaiveDateTime,
) -> String {
    let images: Vec<&PastedImage> = images.iter().filter(|i| i.is_image()).collect();
    if images.is_empty() {
        return String::new();
    }
    let prefs = store.preferences();
    let folder = attachment_folder(&prefs, source_path);
    if !folder.is_empty()
        && store.resolve(&folder).is_none()
        && let Err(e) = store.create_folder(&folder).await
    {
        log::warn!("could not create attachment folder {folder}: {e}");
    }

    let stamp = now.format("%Y%m%d_%H%M%S").to_string();
    let numbered = images.len() > 1;
    let mut links = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let index = numbered.then_some(i + 1);
        let ext = image.extension();
        let mut path = join(&folder, &attachment_name(&stamp, index, None, &ext));
        let mut attempt = 1;
        while store.resolve(&path).is_some() {
            attempt += 1;
            path = join(&folder, &attachment_name(&stamp, index, Some(attempt), &ext));
        }
        match store.create_binary(&path, &image.bytes).await {
            Ok(()) => links.push(link_for(&path, source_path, prefs.use_markdown_links)),
            Err(e) => log::error!("could not save pasted image {path}: {e}"),
        }
    }
    links.join("\n")
}
