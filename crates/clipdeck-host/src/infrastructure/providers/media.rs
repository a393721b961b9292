//! Media session polling seam.
//!
//! Media metadata comes from whatever session API the platform offers
//! (GSMTC on Windows, MPRIS on Linux, …).  The host treats that machinery
//! as an external collaborator behind [`MediaInfoProvider`]; the delta
//! engine only sees the [`MediaInfo`] record a provider returns.

use async_trait::async_trait;
use clipdeck_core::MediaInfo;

/// Polls the platform for the currently playing media session.
#[async_trait]
pub trait MediaInfoProvider: Send + Sync {
    /// Returns the current track, or `None` when no media session is
    /// active.  Providers are expected to cache expensive artifacts such
    /// as thumbnails across polls of an unchanged track.
    async fn poll(&self) -> Option<MediaInfo>;
}

/// Default provider for hosts without a media session integration: always
/// reports no active session.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMediaProvider;

#[async_trait]
impl MediaInfoProvider for NullMediaProvider {
    async fn poll(&self) -> Option<MediaInfo> {
        None
    }
}

/// Scriptable provider for tests: returns whatever was last `set`.
#[derive(Debug, Default)]
pub struct StubMediaProvider {
    current: std::sync::Mutex<Option<MediaInfo>>,
}

impl StubMediaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the track the next `poll` will report.
    pub fn set(&self, info: Option<MediaInfo>) {
        *self.current.lock().expect("lock poisoned") = info;
    }
}

#[async_trait]
impl MediaInfoProvider for StubMediaProvider {
    async fn poll(&self) -> Option<MediaInfo> {
        self.current.lock().expect("lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_provider_reports_no_session() {
        assert_eq!(NullMediaProvider.poll().await, None);
    }

    #[tokio::test]
    async fn test_stub_provider_returns_scripted_track() {
        let provider = StubMediaProvider::new();
        let track = MediaInfo {
            artist: "artist".to_string(),
            title: "title".to_string(),
            album_title: "album".to_string(),
            album_artist: "artist".to_string(),
            track_number: 3,
            album_thumbnail: None,
        };
        provider.set(Some(track.clone()));
        assert_eq!(provider.poll().await, Some(track));
    }
}
