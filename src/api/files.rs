//! Static files under the media root (covers, thumbnails, originals).

use actix_files::NamedFile;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::MediaStorage;

/// Hidden entries such as the upload staging area are never served.
fn is_public(relative: &str) -> bool {
    !relative.is_empty()
        && relative
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .all(|segment| !segment.starts_with('.'))
}

/// Serve a file stored under the media root.
pub async fn serve_media(
    req: HttpRequest,
    storage: web::Data<MediaStorage>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let relative = path.into_inner();
    if !is_public(&relative) {
        return Err(AppError::NotFound(format!("File {}", relative)));
    }

    let absolute = storage.absolute(&relative);
    debug!(path = %absolute.display(), "Serving media file");

    match NamedFile::open_async(&absolute).await {
        Ok(file) if absolute.is_file() => Ok(file.into_response(&req)),
        Ok(_) => Err(AppError::NotFound(format!("File {}", relative))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound(format!("File {}", relative)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Configure file routes. Mounted at the application root, not under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/media/{path:.*}").route(web::get().to(serve_media)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_paths_are_private() {
        assert!(is_public("thumbnails/content/1_cover.jpg"));
        assert!(!is_public(".incoming/abc/part_0"));
        assert!(!is_public("videos/../.incoming/x"));
        assert!(!is_public(""));
    }
}
