use std::io::ErrorKind;

use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    forms::{allowed_file, secure_filename},
    State,
};

use super::RouteError;

const COVER_NOT_FOUND: &str = "Cover not found";

fn content_type(file_name: &str) -> &'static str {
    file_name
        .rsplit_once('.')
        .and_then(|(_, ext)| image::ImageFormat::from_extension(ext))
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

pub(crate) async fn cover(
    state: State,
    Path(file_name): Path<String>,
) -> Result<Response, RouteError> {
    // Only names the upload handler could have produced are served
    if secure_filename(&file_name) != file_name || !allowed_file(&file_name) {
        return Err(RouteError::NotFound(COVER_NOT_FOUND));
    }

    let path = state.config.uploads.dir.join(&file_name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RouteError::NotFound(COVER_NOT_FOUND))
        }
        Err(e) => return Err(RouteError::CoverRead(e)),
    };

    Ok(([(header::CONTENT_TYPE, content_type(&file_name))], bytes).into_response())
}
