use axum::extract::Multipart;
use bytes::Bytes;
use image::DynamicImage;

use crate::api::error::{ApiError, ApiResult};

/// Fields of the `multipart/form-data` body shared by every upload route.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub username: Option<String>,
    pub file: Option<Bytes>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("username") => {
                    let text = field.text().await?;
                    let text = text.trim();
                    if !text.is_empty() {
                        form.username = Some(text.to_string());
                    }
                }
                Some("file") | Some("image") => form.file = Some(field.bytes().await?),
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn require_username(&self) -> ApiResult<&str> {
        self.username
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Field 'username' wajib diisi.".to_string()))
    }

    pub fn require_file(&self) -> ApiResult<&Bytes> {
        match &self.file {
            Some(b) if !b.is_empty() => Ok(b),
            _ => Err(ApiError::BadRequest("Field 'file' wajib diisi.".to_string())),
        }
    }

}

/// Decoding a large upload is CPU work; call this from `spawn_blocking`.
pub fn decode_image(bytes: &[u8]) -> ApiResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|_| ApiError::BadRequest("File bukan gambar yang valid.".to_string()))
}
