//! The delta-sync engine.
//!
//! Each connected client holds a private [`Snapshot`] of the last state the
//! host observed for it.  On every push cycle the session samples the
//! current [`HostState`] and calls [`compute_delta`], which decides what to
//! transmit:
//!
//! - **Metrics** are always included.  They are cheap, always fresh, and
//!   diffing floats across samples would suppress nothing in practice.
//! - **Media info** is sent every cycle, changed or not.  A stale track
//!   display is far more visible to the user than the handful of bytes a
//!   redundant section costs, so "resend every cycle" is the documented
//!   policy here rather than a diffing bug waiting to happen.
//! - **Clipboard** is diffed per slot: only slots whose summary changed
//!   since the snapshot are included, and the section is omitted entirely
//!   when nothing changed.  A session's first push carries every slot so a
//!   freshly connected client starts from the full state.
//!
//! After computing a delta the snapshot is replaced with the full current
//! state (including sections that were not sent), so future diffs always
//! compare against the last *observed* state, never the last *transmitted*
//! one.
//!
//! The engine is a pure function of `(current, previous)`; all sampling and
//! I/O stay in the host crate.

use std::collections::BTreeMap;

use crate::domain::slots::SlotSummary;
use crate::protocol::messages::{HostFacts, HostMessage, MediaInfo, SystemMetrics};

/// Everything the host knows at one push instant.
#[derive(Debug, Clone, PartialEq)]
pub struct HostState {
    pub metrics: SystemMetrics,
    pub facts: HostFacts,
    pub media: Option<MediaInfo>,
    pub clipboard: BTreeMap<String, SlotSummary>,
}

/// Last state observed for one connection, used purely for diffing.
///
/// Created empty on connect; the first [`compute_delta`] call against an
/// empty snapshot yields a full-state delta.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    media: Option<MediaInfo>,
    clipboard: BTreeMap<String, SlotSummary>,
    synced: bool,
}

impl Snapshot {
    /// An empty snapshot for a freshly connected session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this snapshot has observed at least one push cycle.
    pub fn is_synced(&self) -> bool {
        self.synced
    }
}

/// The subset of state to transmit for one push cycle.
///
/// `system_info` and `audio_info` are unconditional, so a delta always
/// carries at least one frame; `clipboard_info` is `None` when no slot
/// changed.
#[derive(Debug, Clone, PartialEq)]
pub struct PushDelta {
    pub system_info: HostMessage,
    pub audio_info: HostMessage,
    pub clipboard_info: Option<HostMessage>,
}

impl PushDelta {
    /// Flattens the delta into wire frames, in send order.
    pub fn into_messages(self) -> Vec<HostMessage> {
        let mut messages = vec![self.system_info, self.audio_info];
        if let Some(clipboard) = self.clipboard_info {
            messages.push(clipboard);
        }
        messages
    }
}

/// Computes the minimal delta between `current` and `previous`, and the
/// snapshot future diffs should run against.
pub fn compute_delta(current: &HostState, previous: &Snapshot) -> (PushDelta, Snapshot) {
    let system_info = HostMessage::SystemInfo {
        data: current.metrics.clone(),
        info: current.facts.clone(),
    };

    // Resent every cycle by policy; see the module docs.
    let audio_info = HostMessage::AudioInfo {
        data: current.media.clone(),
    };

    let changed: BTreeMap<String, SlotSummary> = if previous.synced {
        current
            .clipboard
            .iter()
            .filter(|(key, summary)| previous.clipboard.get(*key) != Some(*summary))
            .map(|(key, summary)| (key.clone(), summary.clone()))
            .collect()
    } else {
        current.clipboard.clone()
    };

    let clipboard_info = if changed.is_empty() {
        None
    } else {
        Some(HostMessage::ClipboardInfo { data: changed })
    };

    let updated = Snapshot {
        media: current.media.clone(),
        clipboard: current.clipboard.clone(),
        synced: true,
    };

    (
        PushDelta {
            system_info,
            audio_info,
            clipboard_info,
        },
        updated,
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
