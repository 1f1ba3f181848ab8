//! Multipart upload plumbing shared by the file endpoints.
//!
//! Uploads are held in memory as `Bytes` for the lifetime of one request.

use axum::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;

use crate::errors::AppError;

#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Reads the first file field whose name is in `field_names`.
///
/// `check_filename` runs before the body is read, so a rejected upload is never buffered.
pub async fn read_upload<F>(
    multipart: &mut Multipart,
    field_names: &[&str],
    check_filename: F,
) -> Result<Option<Upload>, AppError>
where
    F: Fn(&str) -> Result<(), AppError>,
{
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let accepted = field
            .name()
            .is_some_and(|name| field_names.contains(&name));
        if !accepted {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        check_filename(&filename)?;

        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(bad_multipart)?;

        return Ok(Some(Upload {
            filename,
            content_type,
            data,
        }));
    }

    Ok(None)
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart upload: {}", e.body_text()))
}
