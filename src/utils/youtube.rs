//! YouTube 链接校验与视频 ID 提取

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::StudyLinkError;

static YOUTUBE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(https?://)?(www\.|m\.)?(youtube\.com/(watch\?v=|embed/|shorts/)|youtu\.be/)([\w-]{11})([?&]\S*)?$",
    )
    .expect("Invalid youtube regex")
});

/// 规范化后的 YouTube 链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YouTubeLink {
    pub url: String,
    pub video_id: String,
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// 按 URL 结构提取：youtu.be 路径、`v` 参数、最后一段路径
fn extract_from_parts(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("://")?;
    let (location, query) = match rest.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (rest, None),
    };
    let location = location.split('#').next().unwrap_or(location);
    let (host, path) = location.split_once('/').unwrap_or((location, ""));

    if host.to_ascii_lowercase().contains("youtu.be") {
        let candidate: String = path.chars().take(11).collect();
        return is_video_id(&candidate).then_some(candidate);
    }

    if let Some(query) = query {
        let query = query.split('#').next().unwrap_or(query);
        if let Some(v) = query.split('&').find_map(|pair| pair.strip_prefix("v=")) {
            return is_video_id(v).then(|| v.to_string());
        }
    }

    path.rsplit('/')
        .next()
        .filter(|segment| is_video_id(segment))
        .map(str::to_string)
}

/// 提取 11 位视频 ID，无法识别时返回 None
pub fn extract_video_id(raw_url: &str) -> Option<String> {
    let url = raw_url.trim();
    if url.is_empty() {
        return None;
    }
    if let Some(id) = YOUTUBE_URL_RE.captures(url).and_then(|c| c.get(5)) {
        return Some(id.as_str().to_string());
    }
    extract_from_parts(url)
}

/// 校验 YouTube 链接并返回 `{url, video_id}`
pub fn validate_youtube_url(raw_url: &str) -> Result<YouTubeLink, StudyLinkError> {
    let url = raw_url.trim();
    if url.is_empty() || !YOUTUBE_URL_RE.is_match(url) {
        return Err(StudyLinkError::validation("A valid YouTube URL is required."));
    }
    let video_id = extract_video_id(url)
        .ok_or_else(|| StudyLinkError::validation("Unsupported YouTube URL format."))?;
    Ok(YouTubeLink {
        url: url.to_string(),
        video_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "  HTTPS://YOUTU.BE/dQw4w9WgXcQ  ",
        ];
        for url in cases {
            let link = validate_youtube_url(url).unwrap_or_else(|e| panic!("{url}: {e}"));
            assert_eq!(link.video_id, "dQw4w9WgXcQ");
            assert_eq!(link.url, url.trim());
        }
    }

    #[test]
    fn test_rejected_urls() {
        for url in [
            "",
            "https://vimeo.com/123456",
            "https://www.youtube.com/watch?v=short",
            "https://youtube.com/playlist?list=PL123",
        ] {
            assert!(validate_youtube_url(url).is_err(), "{url}");
        }
    }

    #[test]
    fn test_fallback_extraction() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/live/abcdefghijk").as_deref(),
            Some("abcdefghijk")
        );
        assert_eq!(
            extract_video_id("https://example.com/page?v=abcdefghijk").as_deref(),
            Some("abcdefghijk")
        );
        assert_eq!(extract_video_id("not a url"), None);
    }
}
