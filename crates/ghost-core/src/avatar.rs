//! Avatar references and their display form.

use std::path::PathBuf;
use url::Url;

/// Path of the avatar proxy endpoint.
pub const AVATAR_PROXY_PATH: &str = "/api/avatar";

const FILE_SCHEME: &str = "file:///";
const MXC_SCHEME: &str = "mxc://";

/// Classified avatar reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarRef {
    /// Image on the local disk of the chat platform (`file:///...`)
    LocalFile(PathBuf),

    /// Platform media (`mxc://server/media`)
    PlatformMedia { server: String, media: String },

    /// Anything else; usable as-is
    Url(String),
}

impl AvatarRef {
    /// Classifies a raw reference. Returns `None` for an empty string or a
    /// `file://` URL that does not name a path.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with(FILE_SCHEME) {
            let path = Url::parse(raw).ok()?.to_file_path().ok()?;
            return Some(Self::LocalFile(path));
        }
        if let Some(rest) = raw.strip_prefix(MXC_SCHEME) {
            let (server, media) = rest.split_once('/').unwrap_or((rest, ""));
            return Some(Self::PlatformMedia {
                server: server.to_string(),
                media: media.to_string(),
            });
        }
        Some(Self::Url(raw.to_string()))
    }

    /// True when the reference only resolves through the proxy.
    #[must_use]
    pub fn needs_proxy(&self) -> bool {
        !matches!(self, Self::Url(_))
    }

    /// Download URL for platform media on the given platform base URL.
    pub fn media_download_url(&self, base_url: &str) -> Option<String> {
        match self {
            Self::PlatformMedia { server, media } => Some(format!(
                "{}/_matrix/media/v3/download/{server}/{media}",
                base_url.trim_end_matches('/')
            )),
            _ => None,
        }
    }
}

/// Form of a raw avatar reference that a browser can load.
///
/// Platform references go through the avatar proxy; other URLs are
/// returned unchanged.
pub fn display_url(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with(FILE_SCHEME) || raw.starts_with(MXC_SCHEME) {
        let encoded: String = url::form_urlencoded::byte_serialize(raw.as_bytes()).collect();
        return Some(format!("{AVATAR_PROXY_PATH}?path={encoded}"));
    }
    Some(raw.to_string())
}

/// Guesses an image MIME type from a file extension.
pub fn guess_mime(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("heic") => "image/heic",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Up to two initials for an avatar placeholder; "?" when there is no name.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split(' ')
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_local_file_decodes_path() {
        let parsed = AvatarRef::parse("file:///Users/me/Library/avatar%20one.jpg");
        assert_eq!(
            parsed,
            Some(AvatarRef::LocalFile(PathBuf::from("/Users/me/Library/avatar one.jpg")))
        );
    }

    #[test]
    fn test_parse_platform_media() {
        let parsed = AvatarRef::parse("mxc://beeper.com/abc123").unwrap();
        assert!(parsed.needs_proxy());
        assert_eq!(
            parsed.media_download_url("http://localhost:23373/"),
            Some("http://localhost:23373/_matrix/media/v3/download/beeper.com/abc123".to_string())
        );

        let bare = AvatarRef::parse("mxc://server-only").unwrap();
        assert_eq!(
            bare,
            AvatarRef::PlatformMedia {
                server: "server-only".to_string(),
                media: String::new()
            }
        );
    }

    #[test]
    fn test_parse_plain_url() {
        let parsed = AvatarRef::parse("https://cdn.example/a.png").unwrap();
        assert!(!parsed.needs_proxy());
        assert_eq!(parsed.media_download_url("http://x"), None);
        assert_eq!(AvatarRef::parse(""), None);
    }

    #[test]
    fn test_display_url() {
        assert_eq!(
            display_url("mxc://s/m"),
            Some("/api/avatar?path=mxc%3A%2F%2Fs%2Fm".to_string())
        );
        assert_eq!(
            display_url("https://cdn.example/a.png"),
            Some("https://cdn.example/a.png".to_string())
        );
        assert_eq!(display_url(""), None);
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("/a/b.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("/a/b.webp")), "image/webp");
        assert_eq!(guess_mime(Path::new("/a/b")), "image/jpeg");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("sarah lee"), "SL");
        assert_eq!(initials("Mary Jane Watson"), "MJ");
        assert_eq!(initials("Cher"), "C");
        assert_eq!(initials(""), "?");
    }
}
