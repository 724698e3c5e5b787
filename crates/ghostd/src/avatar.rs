//! Avatar proxy resolution.

use crate::error::{ServiceError, ServiceResult};
use ghost_core::avatar::{guess_mime, AvatarRef};
use tracing::debug;

/// What the avatar proxy answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarResponse {
    /// Image bytes read from the local disk
    Image { mime: &'static str, bytes: Vec<u8> },

    /// Platform media download location
    Redirect(String),
}

/// Resolves a proxied avatar reference.
///
/// # Errors
///
/// `ServiceError::AvatarNotFound` for plain URLs (they never go through the
/// proxy), unparseable references and unreadable files.
pub async fn resolve_avatar(raw: &str, platform_base_url: &str) -> ServiceResult<AvatarResponse> {
    let not_found = || ServiceError::AvatarNotFound(raw.to_string());

    match AvatarRef::parse(raw).ok_or_else(not_found)? {
        AvatarRef::LocalFile(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                debug!(path = %path.display(), error = %e, "Avatar file unreadable");
                not_found()
            })?;
            Ok(AvatarResponse::Image {
                mime: guess_mime(&path),
                bytes,
            })
        }
        media @ AvatarRef::PlatformMedia { .. } => media
            .media_download_url(platform_base_url)
            .map(AvatarResponse::Redirect)
            .ok_or_else(not_found),
        AvatarRef::Url(_) => Err(not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let raw = format!("file://{}", path.display());
        let response = resolve_avatar(&raw, "http://localhost:23373").await.unwrap();
        assert_eq!(
            response,
            AvatarResponse::Image {
                mime: "image/png",
                bytes: vec![0x89, b'P', b'N', b'G']
            }
        );
    }

    #[tokio::test]
    async fn test_platform_media_redirects() {
        let response = resolve_avatar("mxc://beeper.com/xyz", "http://localhost:23373")
            .await
            .unwrap();
        assert_eq!(
            response,
            AvatarResponse::Redirect(
                "http://localhost:23373/_matrix/media/v3/download/beeper.com/xyz".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_not_found_cases() {
        for raw in ["", "https://cdn.example/a.png", "file:///definitely/not/here.jpg"] {
            let err = resolve_avatar(raw, "http://x").await.unwrap_err();
            assert!(matches!(err, ServiceError::AvatarNotFound(_)), "{raw}");
        }
    }
}
