//! One-shot local notification scheduling.
//!
//! A scheduled notification is an opaque handle over a tokio one-shot
//! timer; the delivery mechanism is an injected [`NotificationSink`] so
//! the scheduler stays substitutable (OS alarms, a test recorder, ...).

use crate::types::{Language, NotificationKind};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Payload handed to the sink when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Coalescing tag: the sink must replace a prior notification with the
    /// same tag rather than stacking duplicates.
    pub tag: String,
    pub vibration: Vec<u32>,
}

/// Delivery port for local notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn deliver(&self, request: NotificationRequest);
}

/// Opaque handle to a scheduled notification.
///
/// Never a raw timer id; comparing or storing it is safe after the
/// underlying timer has fired or been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationHandle {
    id: u64,
}

impl NotificationHandle {
    /// Sentinel returned when the requested fire instant was already in
    /// the past and nothing was armed.
    pub const INVALID: NotificationHandle = NotificationHandle { id: 0 };

    pub fn is_valid(&self) -> bool {
        self.id != 0
    }
}

struct Armed {
    handle: NotificationHandle,
    task: JoinHandle<()>,
}

/// Arms, replaces, and cancels one-shot notification timers.
///
/// At most one live schedule exists per [`NotificationKind`]: arming a
/// kind again cancels whatever was armed for it before.
pub struct NotificationScheduler<S: NotificationSink> {
    sink: Arc<S>,
    next_id: u64,
    armed: HashMap<NotificationKind, Armed>,
}

impl<S: NotificationSink> NotificationScheduler<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink,
            next_id: 1,
            armed: HashMap::new(),
        }
    }

    /// Arms a one-shot notification firing `lead_minutes` before `target`.
    ///
    /// Returns [`NotificationHandle::INVALID`] without registering any
    /// timer when the fire instant is not strictly in the future. A
    /// previously armed timer for the same kind is cancelled first.
    pub fn schedule(
        &mut self,
        now: NaiveDateTime,
        target: NaiveDateTime,
        lead_minutes: i64,
        kind: NotificationKind,
        request: NotificationRequest,
    ) -> NotificationHandle {
        let fire_at = target - ChronoDuration::minutes(lead_minutes);
        if fire_at <= now {
            tracing::warn!(?kind, %target, lead_minutes, "fire instant already past, not scheduling");
            return NotificationHandle::INVALID;
        }
        let delay = (fire_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        self.cancel_kind(kind);

        let handle = NotificationHandle { id: self.next_id };
        self.next_id += 1;

        let sink = Arc::clone(&self.sink);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.deliver(request).await;
        });

        tracing::debug!(?kind, %fire_at, "notification armed");
        self.armed.insert(kind, Armed { handle, task });
        handle
    }

    /// Cancels a scheduled notification. Idempotent: cancelling an
    /// invalid, already-fired, or already-cancelled handle is a no-op.
    pub fn cancel(&mut self, handle: NotificationHandle) {
        if !handle.is_valid() {
            return;
        }
        let kind = self
            .armed
            .iter()
            .find(|(_, armed)| armed.handle == handle)
            .map(|(kind, _)| *kind);
        if let Some(kind) = kind {
            self.cancel_kind(kind);
        }
    }

    /// Cancels whatever is armed for a kind, if anything.
    pub fn cancel_kind(&mut self, kind: NotificationKind) {
        if let Some(armed) = self.armed.remove(&kind) {
            armed.task.abort();
            tracing::debug!(?kind, "notification cancelled");
        }
    }

    /// Number of currently armed timers (fired timers are not pruned
    /// eagerly; they count until replaced or cancelled).
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Tears down every outstanding timer. Call on shutdown.
    pub fn shutdown(&mut self) {
        for (_, armed) in self.armed.drain() {
            armed.task.abort();
        }
    }
}

impl<S: NotificationSink> Drop for NotificationScheduler<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builds the localized request for a kind, matching the message catalog
/// of the original notification service.
pub fn notification_request(
    kind: NotificationKind,
    lead_minutes: i64,
    language: Language,
) -> NotificationRequest {
    let title = match (kind, language) {
        (NotificationKind::Sehri, Language::En) => "Sehri Time Approaching".to_string(),
        (NotificationKind::Sehri, Language::Ar) => "اقتراب وقت السحور".to_string(),
        (NotificationKind::Sehri, Language::Ur) => "سحری کا وقت قریب ہے".to_string(),
        (NotificationKind::Sehri, Language::Hi) => "सहरी का समय नज़दीक है".to_string(),
        (NotificationKind::Iftar, Language::En) => "Iftar Time Approaching".to_string(),
        (NotificationKind::Iftar, Language::Ar) => "اقتراب وقت الإفطار".to_string(),
        (NotificationKind::Iftar, Language::Ur) => "افطار کا وقت قریب ہے".to_string(),
        (NotificationKind::Iftar, Language::Hi) => "इफ्तार का समय नज़दीक है".to_string(),
    };
    let body = match (kind, language) {
        (NotificationKind::Sehri, Language::En) => format!(
            "Sehri time is in {lead_minutes} minutes. Prepare for your pre-dawn meal."
        ),
        (NotificationKind::Sehri, Language::Ar) => format!(
            "وقت السحور بعد {lead_minutes} دقائق. استعد لوجبة ما قبل الفجر."
        ),
        (NotificationKind::Sehri, Language::Ur) => format!(
            "سحری کا وقت {lead_minutes} منٹ میں ہے۔ سحری کی تیاری کریں۔"
        ),
        (NotificationKind::Sehri, Language::Hi) => format!(
            "सहरी का समय {lead_minutes} मिनट में है। अपने भोजन के लिए तैयार हो जाएं।"
        ),
        (NotificationKind::Iftar, Language::En) => format!(
            "Iftar time is in {lead_minutes} minutes. Prepare to break your fast."
        ),
        (NotificationKind::Iftar, Language::Ar) => format!(
            "وقت الإفطار بعد {lead_minutes} دقائق. استعد لكسر صيامك."
        ),
        (NotificationKind::Iftar, Language::Ur) => format!(
            "افطار کا وقت {lead_minutes} منٹ میں ہے۔ روزہ افطار کرنے کی تیاری کریں۔"
        ),
        (NotificationKind::Iftar, Language::Hi) => format!(
            "इफ्तार का समय {lead_minutes} मिनट में है। रोज़ा खोलने की तैयारी करें।"
        ),
    };

    NotificationRequest {
        title,
        body,
        icon: "/icons/icon-192x192.png".to_string(),
        tag: kind.tag().to_string(),
        vibration: vec![100, 50, 100],
    }
}
