//! Range-aware file responses.
//!
//! Bodies are streamed straight from the file handle; when the client goes
//! away actix drops the stream, which closes the file.

use std::io::SeekFrom;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use actix_web::body::SizedStream;
use actix_web::http::header::{self, HttpDate};
use actix_web::{HttpRequest, HttpResponse};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::range::{ByteRange, parse_range};

/// MIME type by extension; anything unknown is treated as MP4 video.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "m3u8" => "application/vnd.apple.mpegurl",
        "ts" => "video/mp2t",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        _ => "video/mp4",
    }
}

/// Cache validators derived from file metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    /// Modification time truncated to whole seconds, as HTTP dates are.
    pub modified: Option<SystemTime>,
    pub etag: String,
}

impl Validators {
    pub fn new(size: u64, modified: Option<SystemTime>) -> Self {
        let secs = modified
            .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        Self {
            modified: secs.map(|s| UNIX_EPOCH + Duration::from_secs(s)),
            etag: format!("W/\"{:x}-{:x}\"", size, secs.unwrap_or(0)),
        }
    }

    fn last_modified(&self) -> Option<String> {
        self.modified.map(|m| HttpDate::from(m).to_string())
    }

    fn matches_tag(&self, tag: &str) -> bool {
        let strip = |t: &str| t.trim().trim_start_matches("W/").to_string();
        strip(tag) == strip(&self.etag)
    }

    /// Strong comparison: neither side may be a weak tag.
    fn strongly_matches_tag(&self, tag: &str) -> bool {
        let tag = tag.trim();
        !tag.starts_with("W/") && !self.etag.starts_with("W/") && tag == self.etag
    }

    /// Whether `If-None-Match` / `If-Modified-Since` allow a 304.
    pub fn not_modified(&self, if_none_match: Option<&str>, if_modified_since: Option<&str>) -> bool {
        if let Some(tags) = if_none_match {
            return tags.trim() == "*" || tags.split(',').any(|t| self.matches_tag(t));
        }
        match (if_modified_since.and_then(parse_http_date), self.modified) {
            (Some(since), Some(modified)) => modified <= since,
            _ => false,
        }
    }

    /// Whether an `If-Range` precondition still holds for this file.
    ///
    /// Entity tags are compared strongly, so a weak tag never holds and the
    /// full file is served instead.
    pub fn if_range_holds(&self, if_range: Option<&str>) -> bool {
        let Some(value) = if_range.map(str::trim) else {
            return true;
        };
        if value.starts_with('"') || value.starts_with("W/") {
            return self.strongly_matches_tag(value);
        }
        match (parse_http_date(value), self.modified) {
            (Some(date), Some(modified)) => date == modified,
            _ => false,
        }
    }
}

fn parse_http_date(value: &str) -> Option<SystemTime> {
    value.trim().parse::<HttpDate>().ok().map(SystemTime::from)
}

fn header_str<'a>(req: &'a HttpRequest, name: header::HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Serve `path` honoring a single byte range and conditional headers.
pub async fn serve_file(req: &HttpRequest, path: &Path) -> AppResult<HttpResponse> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Video file".to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(AppError::NotFound("Video file".to_string()));
    }

    let size = metadata.len();
    let validators = Validators::new(size, metadata.modified().ok());
    let content_type = content_type_for(path);

    let mut builder = HttpResponse::Ok();
    builder
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::ACCEPT_RANGES, "bytes"))
        .insert_header((header::ETAG, validators.etag.clone()));
    if let Some(last_modified) = validators.last_modified() {
        builder.insert_header((header::LAST_MODIFIED, last_modified));
    }

    if validators.not_modified(
        header_str(req, header::IF_NONE_MATCH),
        header_str(req, header::IF_MODIFIED_SINCE),
    ) {
        debug!(path = %path.display(), "Not modified");
        builder.status(actix_web::http::StatusCode::NOT_MODIFIED);
        return Ok(builder.finish());
    }

    let range_header = header_str(req, header::RANGE)
        .filter(|_| validators.if_range_holds(header_str(req, header::IF_RANGE)));

    let Some(range_header) = range_header else {
        debug!(path = %path.display(), size, "Serving full file");
        let stream = ReaderStream::new(file);
        return Ok(builder.body(SizedStream::new(size, stream)));
    };

    let range: ByteRange = parse_range(range_header, size).map_err(|e| {
        debug!(path = %path.display(), size, range = range_header, error = %e, "Rejecting range");
        AppError::RangeNotSatisfiable { size }
    })?;

    file.seek(SeekFrom::Start(range.start)).await?;
    let length = range.length();
    debug!(
        path = %path.display(),
        start = range.start,
        end = range.end,
        size,
        "Serving partial content"
    );

    builder
        .status(actix_web::http::StatusCode::PARTIAL_CONTENT)
        .insert_header((header::CONTENT_RANGE, range.content_range(size)));
    let stream = ReaderStream::new(file.take(length));
    Ok(builder.body(SizedStream::new(length, stream)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a/1_2.mp4")), "video/mp4");
        assert_eq!(
            content_type_for(Path::new("a/1_2.M3U8")),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(content_type_for(Path::new("a/1_2_000.ts")), "video/mp2t");
        assert_eq!(content_type_for(Path::new("noext")), "video/mp4");
    }

    #[test]
    fn test_validators_truncate_to_seconds() {
        let v = Validators::new(10, Some(at(1_700_000_000) + Duration::from_millis(750)));
        assert_eq!(v.modified, Some(at(1_700_000_000)));
        assert_eq!(v.etag, format!("W/\"a-{:x}\"", 1_700_000_000u64));
    }

    #[test]
    fn test_not_modified_by_etag() {
        let v = Validators::new(10, Some(at(1_700_000_000)));
        assert!(v.not_modified(Some(&v.etag.clone()), None));
        assert!(v.not_modified(Some("\"zzz\", W/\"a-6553f100\""), None));
        assert!(v.not_modified(Some("*"), None));
        assert!(!v.not_modified(Some("\"other\""), None));
        // If-None-Match wins over If-Modified-Since
        let later = HttpDate::from(at(1_800_000_000)).to_string();
        assert!(!v.not_modified(Some("\"other\""), Some(&later)));
    }

    #[test]
    fn test_not_modified_by_date() {
        let v = Validators::new(10, Some(at(1_700_000_000)));
        let same = HttpDate::from(at(1_700_000_000)).to_string();
        let earlier = HttpDate::from(at(1_600_000_000)).to_string();
        assert!(v.not_modified(None, Some(&same)));
        assert!(!v.not_modified(None, Some(&earlier)));
        assert!(!v.not_modified(None, Some("garbage")));
        assert!(!v.not_modified(None, None));
    }

    #[test]
    fn test_if_range() {
        let v = Validators::new(10, Some(at(1_700_000_000)));
        assert!(v.if_range_holds(None));
        assert!(!v.if_range_holds(Some("\"stale\"")));
        let same = HttpDate::from(at(1_700_000_000)).to_string();
        let other = HttpDate::from(at(1_700_000_001)).to_string();
        assert!(v.if_range_holds(Some(&same)));
        assert!(!v.if_range_holds(Some(&other)));
    }

    #[test]
    fn test_if_range_requires_strong_tag() {
        let weak = Validators::new(10, Some(at(1_700_000_000)));
        assert!(!weak.if_range_holds(Some(&weak.etag.clone())));
        assert!(!weak.if_range_holds(Some(weak.etag.trim_start_matches("W/"))));

        let strong = Validators {
            modified: None,
            etag: "\"a-6553f100\"".to_string(),
        };
        assert!(strong.if_range_holds(Some("\"a-6553f100\"")));
        assert!(!strong.if_range_holds(Some("W/\"a-6553f100\"")));
        assert!(!strong.if_range_holds(Some("\"other\"")));
    }
}
