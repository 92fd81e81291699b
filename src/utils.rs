use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub fn validate_url(url: &str) -> Result<Url, url::ParseError> {
    let parsed = Url::parse(url)?;

    // Ensure it's HTTP or HTTPS
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(url::ParseError::RelativeUrlWithoutBase),
    }
}

/// Resolves an href found on `page_url`, honoring a `<base href>` when present.
pub fn rewrite_href(href: &str, page_url: &Url, base_href: Option<&str>) -> Option<Url> {
    let base = match base_href {
        Some(base_href) => page_url.join(base_href).ok()?,
        None => page_url.clone(),
    };
    base.join(href.trim()).ok()
}

/// Same scheme, host and port.
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

/// Key identifying a page for crawl dedup. Fragments do not make a new page.
pub fn crawl_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.to_string()
}

/// `<host>[_<port>]/<path segments>` for a page URL.
pub fn url_subdir(url: &Url) -> PathBuf {
    let host = url.host_str().unwrap_or("localhost");
    let mut subdir = match url.port() {
        Some(port) => PathBuf::from(format!("{host}_{port}")),
        None => PathBuf::from(host),
    };
    if let Some(segments) = url.path_segments() {
        for segment in segments.filter(|s| !s.is_empty()) {
            subdir.push(sanitize_filename(segment));
        }
    }
    subdir
}

/// Creates the output directory of a page and returns it with its subdir.
pub async fn make_out_dir_for_page_url(out_dir: &Path, url: &Url) -> std::io::Result<(PathBuf, PathBuf)> {
    let subdir = url_subdir(url);
    let path = out_dir.join(&subdir);
    tokio::fs::create_dir_all(&path).await?;
    Ok((path, subdir))
}

pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else if seconds > 0 {
        format!("{}.{}s", seconds, millis / 100)
    } else {
        format!("{millis}ms")
    }
}
