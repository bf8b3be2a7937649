use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Session counters. Shared as `Arc<Mutex<SessionMetrics>>` between the
/// runtime loop and the coordinator's flush hooks.
#[derive(Debug, Default, Clone)]
pub struct SessionMetrics {
    events: u64,
    actions: u64,
    rejected_actions: u64,
    refreshes: u64,
    flushes: u64,
    panels_rendered: u64,
    entities_created: u64,
    entities_removed: u64,
    chat_messages: u64,
    launches: u64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_action(&mut self, accepted: bool) {
        self.actions = self.actions.saturating_add(1);
        if !accepted {
            self.rejected_actions = self.rejected_actions.saturating_add(1);
        }
    }

    pub fn record_refresh(&mut self) {
        self.refreshes = self.refreshes.saturating_add(1);
    }

    pub fn record_flush(&mut self) {
        self.flushes = self.flushes.saturating_add(1);
    }

    pub fn record_panels(&mut self, count: usize) {
        if count > 0 {
            self.panels_rendered = self.panels_rendered.saturating_add(count as u64);
        }
    }

    pub fn record_entity_created(&mut self) {
        self.entities_created = self.entities_created.saturating_add(1);
    }

    pub fn record_entities_removed(&mut self, count: usize) {
        self.entities_removed = self.entities_removed.saturating_add(count as u64);
    }

    pub fn record_chat_message(&mut self) {
        self.chat_messages = self.chat_messages.saturating_add(1);
    }

    pub fn record_launch(&mut self) {
        self.launches = self.launches.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            actions: self.actions,
            rejected_actions: self.rejected_actions,
            refreshes: self.refreshes,
            flushes: self.flushes,
            panels_rendered: self.panels_rendered,
            entities_created: self.entities_created,
            entities_removed: self.entities_removed,
            chat_messages: self.chat_messages,
            launches: self.launches,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub actions: u64,
    pub rejected_actions: u64,
    pub refreshes: u64,
    pub flushes: u64,
    pub panels_rendered: u64,
    pub entities_created: u64,
    pub entities_removed: u64,
    pub chat_messages: u64,
    pub launches: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "session_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("events".to_string(), json!(self.events));
        map.insert("actions".to_string(), json!(self.actions));
        map.insert("rejected_actions".to_string(), json!(self.rejected_actions));
        map.insert("refreshes".to_string(), json!(self.refreshes));
        map.insert("flushes".to_string(), json!(self.flushes));
        map.insert("panels_rendered".to_string(), json!(self.panels_rendered));
        map.insert("entities_created".to_string(), json!(self.entities_created));
        map.insert("entities_removed".to_string(), json!(self.entities_removed));
        map.insert("chat_messages".to_string(), json!(self.chat_messages));
        map.insert("launches".to_string(), json!(self.launches));
        map
    }
}
