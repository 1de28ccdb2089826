use crate::config::Config;
use crate::models::MediaKind;
use actix_multipart::{Field, Multipart};
use actix_web::web::{self, BytesMut};
use futures_util::StreamExt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Unsupported media file extension")]
    UnsupportedExtension,
    #[error("File is too large. Maximum size is {0}MB.")]
    TooLarge(u64),
    #[error("Invalid UTF-8 in form field.")]
    InvalidUtf8,
    #[error("Multipart error: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blocking task error: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

/// An upload already persisted under MEDIA_PATH. Stored names are
/// `{uuid}.{ext}`, so concurrent uploads of identically-named files can
/// never collide.
#[derive(Debug)]
pub struct SavedMedia {
    pub filename: String,
    pub kind: MediaKind,
}

#[derive(Debug, Default)]
pub struct PostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media: Option<SavedMedia>,
}

impl PostForm {
    /// A post needs at least one of title, content, or media. Empty strings
    /// count as absent.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.media.is_none()
    }
}

#[derive(Debug, Default)]
pub struct ProfileForm {
    pub username: Option<String>,
    /// Present-but-empty clears the bio, so emptiness is preserved here.
    pub bio: Option<String>,
    pub profile_image: Option<SavedMedia>,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Reads the multipart post-creation form: `title`, `content` text fields and
/// at most one `image`/`video` file field. The first file field wins; later
/// file fields are ignored. An unclassifiable extension is an error rather
/// than a silently dropped upload.
pub async fn read_post_form(
    config: &Config,
    mut payload: Multipart,
) -> Result<PostForm, UploadError> {
    let mut form = PostForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        match field_name.as_str() {
            "title" => form.title = non_empty(read_text_field(&mut field).await?),
            "content" => form.content = non_empty(read_text_field(&mut field).await?),
            "image" | "video" => {
                if form.media.is_none() {
                    form.media = Some(save_media_field(config, &mut field).await?);
                }
            }
            _ => (),
        }
    }

    Ok(form)
}

/// Reads the multipart profile-update form: `username`, `bio` text fields and
/// an optional `profile_image` file field. A file with an unclassifiable
/// extension does not replace the avatar.
pub async fn read_profile_form(
    config: &Config,
    mut payload: Multipart,
) -> Result<ProfileForm, UploadError> {
    let mut form = ProfileForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        match field_name.as_str() {
            "username" => form.username = non_empty(read_text_field(&mut field).await?),
            "bio" => form.bio = Some(read_text_field(&mut field).await?),
            "profile_image" => {
                let has_valid_extension = field
                    .content_disposition()
                    .get_filename()
                    .and_then(MediaKind::from_filename)
                    .is_some();
                if form.profile_image.is_none() && has_valid_extension {
                    form.profile_image = Some(save_media_field(config, &mut field).await?);
                }
            }
            _ => (),
        }
    }

    Ok(form)
}

async fn read_text_field(field: &mut Field) -> Result<String, UploadError> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.next().await {
        data.extend_from_slice(&chunk?);
    }
    String::from_utf8(data.to_vec()).map_err(|_| UploadError::InvalidUtf8)
}

/// Streams a file field to disk under a fresh UUID key, enforcing the upload
/// size cap while writing. A partial file left by an oversized upload is
/// removed before the error is returned.
async fn save_media_field(config: &Config, field: &mut Field) -> Result<SavedMedia, UploadError> {
    let original_filename = field
        .content_disposition()
        .get_filename()
        .unwrap_or_default()
        .to_string();

    let ext = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or(UploadError::UnsupportedExtension)?;
    let kind = MediaKind::from_filename(&original_filename)
        .ok_or(UploadError::UnsupportedExtension)?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
    let media_dir = PathBuf::from(&config.media_path);
    let final_path = media_dir.join(&stored_name);

    let max_bytes = config.max_upload_size_bytes();
    let mut file_size: u64 = 0;

    web::block(move || fs::create_dir_all(&media_dir)).await??;

    let mut f = web::block({
        let final_path_clone = final_path.clone();
        move || fs::File::create(final_path_clone)
    })
    .await??;

    while let Some(chunk) = field.next().await {
        let data = chunk?;
        file_size += data.len() as u64;
        if file_size > max_bytes {
            drop(f);
            let _ = fs::remove_file(&final_path);
            return Err(UploadError::TooLarge(config.max_upload_size_mb));
        }
        f = web::block(move || f.write_all(&data).map(|_| f)).await??;
    }

    Ok(SavedMedia {
        filename: stored_name,
        kind,
    })
}
