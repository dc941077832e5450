//! Embed link handling.
//!
//! Stream links of kind `embed` are stored as a bare URL plus a provider tag.
//! Iframe markup is produced only when a link is rendered, and only for
//! allow-listed providers whose host matches the URL.

use crate::error::{AppError, AppResult};

/// Embed providers we render players for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedProvider {
    Mp4Upload,
}

impl EmbedProvider {
    const ALL: [EmbedProvider; 1] = [EmbedProvider::Mp4Upload];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4Upload => "mp4upload",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    fn domain(&self) -> &'static str {
        match self {
            Self::Mp4Upload => "mp4upload.com",
        }
    }

    fn owns_host(&self, host: &str) -> bool {
        let domain = self.domain();
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// Provider serving `url`, if any.
    pub fn detect(url: &str) -> Option<Self> {
        let (_, host) = split_scheme_host(url)?;
        Self::ALL.into_iter().find(|p| p.owns_host(&host))
    }
}

/// A validated embed link ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedLink {
    pub url: String,
    pub provider: Option<EmbedProvider>,
}

/// Scheme and lowercased host of an absolute or protocol-relative URL.
fn split_scheme_host(url: &str) -> Option<(&str, String)> {
    let url = url.trim();
    let (scheme, rest) = if let Some(rest) = url.strip_prefix("//") {
        ("", rest)
    } else {
        let idx = url.find("://")?;
        (&url[..idx], &url[idx + 3..])
    };

    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    if host.is_empty() {
        return None;
    }
    Some((scheme, host.to_ascii_lowercase()))
}

/// Pull the `src` attribute out of pasted `<iframe ...>` markup.
pub fn extract_iframe_src(markup: &str) -> Option<String> {
    let lower = markup.to_ascii_lowercase();
    let tag_start = lower.find("<iframe")?;
    let attrs_lower = &lower[tag_start..];
    let attrs = &markup[tag_start..];

    let mut search_from = 0;
    while let Some(pos) = attrs_lower[search_from..].find("src") {
        let at = search_from + pos;
        let preceded_by_space = attrs_lower[..at]
            .chars()
            .last()
            .is_some_and(char::is_whitespace);
        let after = attrs[at + 3..].trim_start();
        if preceded_by_space && let Some(value) = after.strip_prefix('=') {
            let value = value.trim_start();
            let src = match value.chars().next()? {
                q @ ('"' | '\'') => value[1..].split(q).next()?,
                _ => value
                    .split(|c: char| c.is_whitespace() || c == '>')
                    .next()?,
            };
            return (!src.is_empty()).then(|| src.to_string());
        }
        search_from = at + 3;
    }
    None
}

/// Validate an incoming embed URL, unwrapping legacy iframe markup.
pub fn ingest(raw: &str) -> AppResult<EmbedLink> {
    let raw = raw.trim();
    let url = if raw.to_ascii_lowercase().contains("<iframe") {
        extract_iframe_src(raw).ok_or_else(|| {
            AppError::InvalidInput("Embed markup has no src attribute".to_string())
        })?
    } else {
        raw.to_string()
    };

    if url.is_empty() {
        return Err(AppError::InvalidInput("Stream link url is required".to_string()));
    }
    if url.contains(['<', '>', '"']) {
        return Err(AppError::InvalidInput(format!(
            "Stream link url contains markup: {}",
            url
        )));
    }

    let provider = EmbedProvider::detect(&url);
    Ok(EmbedLink { url, provider })
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Player markup for a stored embed link, or `None` when it is not allow-listed.
pub fn render(url: &str, provider: Option<&str>) -> Option<String> {
    let provider = EmbedProvider::parse(provider?)?;
    let (scheme, host) = split_scheme_host(url)?;
    if !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
        return None;
    }
    if !provider.owns_host(&host) {
        return None;
    }
    Some(format!(
        r#"<iframe src="{}" frameborder="0" marginwidth="0" marginheight="0" scrolling="no" width="1280" height="720" allowfullscreen></iframe>"#,
        escape_attr(url)
    ))
}
