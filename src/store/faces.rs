//! Reference photos, one JPEG per user under `<data>/faces/`.

use anyhow::{Context, Result};
use image::DynamicImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid username")]
    InvalidUsername,
    #[error("username already exists")]
    AlreadyExists,
    #[error("uploaded file is not a readable image")]
    BadImage(#[source] image::ImageError),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Usernames become file names, so only `[A-Za-z0-9_.-]` is accepted and a
/// leading dot is refused.
pub fn validate_username(username: &str) -> Result<(), StoreError> {
    let ok = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && !username.starts_with('.')
        && username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if ok { Ok(()) } else { Err(StoreError::InvalidUsername) }
}

#[derive(Debug, Clone)]
pub struct FaceStore {
    root: PathBuf,
}

impl FaceStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).with_context(|| format!("Failed to create {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    fn path_for(&self, username: &str) -> PathBuf {
        self.root.join(format!("{}.jpg", username))
    }

    pub fn exists(&self, username: &str) -> bool {
        validate_username(username).is_ok() && self.path_for(username).exists()
    }

    /// Decodes the upload and stores it re-encoded as JPEG. The file is
    /// written under a temporary name first so a half-written photo is never
    /// picked up by a concurrent login.
    pub fn register(&self, username: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_username(username)?;
        let path = self.path_for(username);
        if path.exists() {
            return Err(StoreError::AlreadyExists);
        }
        let img = image::load_from_memory(bytes).map_err(StoreError::BadImage)?;
        let jpeg = encode_jpeg(&img)?;

        let tmp = self.root.join(format!(".{}.jpg.part", username));
        std::fs::write(&tmp, &jpeg).with_context(|| format!("Failed to write {:?}", tmp))?;
        // hard_link fails if the target appeared meanwhile, unlike rename
        let linked = std::fs::hard_link(&tmp, &path);
        let _ = std::fs::remove_file(&tmp);
        match linked {
            Ok(()) => {
                info!("Registered face photo for {} ({} bytes)", username, jpeg.len());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(StoreError::AlreadyExists),
            Err(e) => Err(StoreError::Io(anyhow::Error::new(e).context(format!("Failed to store {:?}", path)))),
        }
    }

    pub fn load(&self, username: &str) -> Result<Option<DynamicImage>> {
        if !self.exists(username) {
            return Ok(None);
        }
        let path = self.path_for(username);
        let img = image::open(&path).with_context(|| format!("Failed to open stored photo {:?}", path))?;
        Ok(Some(img))
    }

    pub fn remove(&self, username: &str) -> Result<bool> {
        if !self.exists(username) {
            return Ok(false);
        }
        let path = self.path_for(username);
        std::fs::remove_file(&path).with_context(|| format!("Failed to delete {:?}", path))?;
        info!("Removed face photo for {}", username);
        Ok(true)
    }

    /// Registered usernames, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut users = Vec::new();
        for entry in std::fs::read_dir(&self.root).with_context(|| format!("Failed to list {:?}", self.root))? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(user) = name.strip_suffix(".jpg") {
                if validate_username(user).is_ok() {
                    users.push(user.to_string());
                }
            }
        }
        users.sort();
        Ok(users)
    }
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), 92)
        .encode_image(&img.to_rgb8())
        .context("Failed to encode JPEG")?;
    Ok(buf)
}
