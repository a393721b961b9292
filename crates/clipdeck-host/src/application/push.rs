//! Push-cycle state assembly.
//!
//! Each session's push loop samples the providers and the slot store into
//! one [`HostState`], then lets the pure delta engine in `clipdeck-core`
//! decide what actually goes on the wire.

use clipdeck_core::HostState;

use super::context::HostContext;

/// Samples everything the delta engine diffs: live metrics, static facts,
/// the current media session, and the slot summaries.
pub async fn sample_host_state(ctx: &HostContext) -> HostState {
    let metrics = ctx.monitor.sample();
    let facts = ctx.monitor.facts();
    let media = ctx.media.poll().await;
    let clipboard = ctx.slots.lock().await.export_all();

    HostState {
        metrics,
        facts,
        media,
        clipboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::HostConfig;
    use crate::infrastructure::clipboard::{
        ClipboardBridge, MemoryClipboard, OsClipboard, SettleDelays,
    };
    use crate::infrastructure::providers::input::{InputExecutor, LoggingInputExecutor};
    use crate::infrastructure::providers::media::StubMediaProvider;
    use crate::infrastructure::providers::system_monitor::MockSystemMonitor;
    use clipdeck_core::{
        HostFacts, MediaInfo, MemoryFacts, NetworkUsage, PlainCodec, SlotContent, SystemMetrics,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn scripted_monitor() -> MockSystemMonitor {
        let mut monitor = MockSystemMonitor::new();
        monitor.expect_sample().returning(|| SystemMetrics {
            cpu_usage: 12.0,
            memory_usage: 34.0,
            disk_usage: 56.0,
            network_usage: NetworkUsage {
                bytes_sent: 7,
                bytes_recv: 8,
            },
        });
        monitor.expect_facts().returning(|| HostFacts {
            cpu_name: "scripted".to_string(),
            cpu_cores: 2,
            cpu_threads: 4,
            memory_info: MemoryFacts { total_gb: 8 },
        });
        monitor
    }

    #[tokio::test]
    async fn test_sample_combines_all_providers() {
        let os = Arc::new(MemoryClipboard::new());
        let input = Arc::new(LoggingInputExecutor);
        let media = Arc::new(StubMediaProvider::new());
        media.set(Some(MediaInfo {
            artist: "a".to_string(),
            title: "t".to_string(),
            album_title: "al".to_string(),
            album_artist: "aa".to_string(),
            track_number: 1,
            album_thumbnail: None,
        }));

        let bridge = ClipboardBridge::with_delays(
            os as Arc<dyn OsClipboard>,
            Arc::clone(&input) as Arc<dyn InputExecutor>,
            SettleDelays {
                copy: Duration::ZERO,
                paste: Duration::ZERO,
                paste_file: Duration::ZERO,
            },
        );
        let ctx = HostContext::new(
            HostConfig {
                num_clipboards: 2,
                ..HostConfig::default()
            },
            bridge,
            Arc::new(scripted_monitor()),
            media,
            input,
            Arc::new(PlainCodec),
        );
        ctx.slots
            .lock()
            .await
            .set(0, SlotContent::Text("x".to_string()), None)
            .unwrap();

        let state = sample_host_state(&ctx).await;

        assert_eq!(state.metrics.cpu_usage, 12.0);
        assert_eq!(state.facts.cpu_name, "scripted");
        assert_eq!(state.media.as_ref().unwrap().title, "t");
        assert_eq!(state.clipboard.len(), 2);
        assert_eq!(state.clipboard["clipboard_0"].data.as_deref(), Some("x"));
    }
}
