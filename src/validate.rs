use once_cell::sync::Lazy;
use regex::Regex;

static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$").expect("valid url regex")
});

static INVALID_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid filename regex"));

/// Accepts youtube.com and youtu.be links, with or without scheme and `www.`
pub fn is_valid_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// Replaces characters that are not allowed in file names with `_`
pub fn sanitize(name: &str) -> String {
    INVALID_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

/// Extracts the video id from a `v=` parameter or a youtu.be short link
pub fn extract_video_id(url: &str) -> Option<String> {
    let id = if let Some(rest) = url.split("v=").nth(1) {
        rest.split('&').next()
    } else {
        url.split("youtu.be/")
            .nth(1)
            .and_then(|s| s.split(['?', '/', '#']).next())
    }?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Thumbnail location used when the metadata does not name one
pub fn fallback_thumbnail_url(url: &str) -> Option<String> {
    extract_video_id(url).map(|id| format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_youtube_urls() {
        for ok in [
            "youtu.be/abc",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/shorts/x",
            "www.youtube.com/watch?v=1",
        ] {
            assert!(is_valid_url(ok), "{ok}");
        }
        for bad in [
            "ftp://youtube.com/x",
            "https://vimeo.com/123",
            "youtube.com",
            "youtube.com/",
            "https://notyoutube.com/watch?v=1",
            "",
        ] {
            assert!(!is_valid_url(bad), "{bad}");
        }
    }

    #[test]
    fn sanitize_replaces_reserved_chars() {
        assert_eq!(sanitize(r#"a\b/c*d?e:f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize("plain title"), "plain title");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for s in ["AC/DC: Live?", r#"<<"||">>"#, "", "ok"] {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn video_ids() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123&t=4").as_deref(),
            Some("abc123")
        );
        assert_eq!(extract_video_id("youtu.be/xyz?t=1").as_deref(), Some("xyz"));
        assert_eq!(extract_video_id("https://youtube.com/shorts/q"), None);
        assert_eq!(
            fallback_thumbnail_url("youtu.be/xyz").as_deref(),
            Some("https://img.youtube.com/vi/xyz/hqdefault.jpg")
        );
    }
}
