//! Messages between the page engine and the privileged controller (popup).
//!
//! Wire shapes are JSON objects tagged by `action`, field names camelCase.
//! The in-process channel mirrors the extension runtime: fire-and-forget
//! sends, single-reply requests, and push notifications that nobody has to
//! be listening for.

use std::sync::mpsc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::export::ExportFormat;
use crate::selection::VideoRecord;
use crate::storage::{write_enabled, KeyValueStore, StorageError};

/// Controller → page requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    ToggleExtractor {
        state: bool,
    },
    GetSelected,
    GetStatus,
    RemoveVideo {
        #[serde(rename = "videoId")]
        video_id: String,
    },
    ClearSelection,
    GetExportData {
        format: ExportFormat,
    },
}

/// Page → controller pushes, sent on every selection change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Notification {
    UpdateCount { count: usize },
    SelectionChanged { count: usize, items: Vec<VideoRecord> },
}

/// Success/failure reply with optional payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Selection { count: usize, items: Vec<VideoRecord> },
    Status { count: usize },
    Outcome(Outcome),
    /// Requests that need no payload.
    Ack {},
}

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("the other side of the channel is gone")]
    Disconnected,
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// Receiver of engine notifications.
pub trait NotificationSink {
    fn notify(&self, notification: Notification) -> Result<(), MessagingError>;
}

/// A request travelling to the page, with an optional reply slot.
pub struct Request {
    pub message: Message,
    reply: Option<mpsc::Sender<Response>>,
}

impl Request {
    /// Answer the request. A requester that stopped waiting is not an error.
    pub fn respond(self, response: Response) {
        if let Some(tx) = self.reply {
            let _ = tx.send(response);
        }
    }
}

/// Reply slot of an in-flight request.
pub struct PendingReply {
    rx: mpsc::Receiver<Response>,
}

impl PendingReply {
    pub fn try_take(&self) -> Option<Response> {
        self.rx.try_recv().ok()
    }

    pub fn wait(&self, timeout: Duration) -> Result<Response, MessagingError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => MessagingError::Timeout(timeout),
            mpsc::RecvTimeoutError::Disconnected => MessagingError::Disconnected,
        })
    }
}

/// Controller (popup/background) end of the channel.
pub struct ControllerPort {
    requests: mpsc::Sender<Request>,
    notifications: mpsc::Receiver<Notification>,
}

/// Page end of the channel.
pub struct PagePort {
    requests: mpsc::Receiver<Request>,
    notifications: mpsc::Sender<Notification>,
}

pub fn channel() -> (ControllerPort, PagePort) {
    let (req_tx, req_rx) = mpsc::channel();
    let (note_tx, note_rx) = mpsc::channel();
    (
        ControllerPort {
            requests: req_tx,
            notifications: note_rx,
        },
        PagePort {
            requests: req_rx,
            notifications: note_tx,
        },
    )
}

impl ControllerPort {
    /// Fire-and-forget send.
    pub fn send(&self, message: Message) -> Result<(), MessagingError> {
        self.requests
            .send(Request {
                message,
                reply: None,
            })
            .map_err(|_| MessagingError::Disconnected)
    }

    /// Send and keep a slot for the single reply.
    pub fn request(&self, message: Message) -> Result<PendingReply, MessagingError> {
        let (tx, rx) = mpsc::channel();
        self.requests
            .send(Request {
                message,
                reply: Some(tx),
            })
            .map_err(|_| MessagingError::Disconnected)?;
        Ok(PendingReply { rx })
    }

    /// Persist the enabled flag, then tell the page.
    pub fn set_enabled(
        &self,
        store: &mut dyn KeyValueStore,
        key: &str,
        enabled: bool,
    ) -> Result<(), StorageError> {
        write_enabled(store, key, enabled)?;
        if let Err(e) = self.send(Message::ToggleExtractor { state: enabled }) {
            log::debug!("page not listening for toggle: {}", e);
        }
        Ok(())
    }

    /// Drain notifications received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.try_iter().collect()
    }

    /// Latest selection size pushed by the page, if any arrived.
    pub fn latest_count(&self) -> Option<usize> {
        self.notifications().into_iter().last().map(|n| match n {
            Notification::UpdateCount { count } | Notification::SelectionChanged { count, .. } => {
                count
            }
        })
    }
}

impl PagePort {
    pub fn try_next(&self) -> Option<Request> {
        self.requests.try_recv().ok()
    }

    /// Detached push half, for handing to the engine while this port keeps
    /// serving requests.
    pub fn notifier(&self) -> Notifier {
        Notifier {
            notifications: self.notifications.clone(),
        }
    }
}

/// Push-only handle onto a page port's notification queue.
#[derive(Clone)]
pub struct Notifier {
    notifications: mpsc::Sender<Notification>,
}

impl NotificationSink for Notifier {
    fn notify(&self, notification: Notification) -> Result<(), MessagingError> {
        self.notifications
            .send(notification)
            .map_err(|_| MessagingError::Disconnected)
    }
}

impl NotificationSink for PagePort {
    fn notify(&self, notification: Notification) -> Result<(), MessagingError> {
        self.notifications
            .send(notification)
            .map_err(|_| MessagingError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{read_enabled, MemoryStore};
    use serde_json::json;

    #[test]
    fn messages_use_action_tags() {
        let msg: Message = serde_json::from_value(json!({"action": "toggleExtractor", "state": true})).unwrap();
        assert_eq!(msg, Message::ToggleExtractor { state: true });

        let msg: Message = serde_json::from_value(json!({"action": "removeVideo", "videoId": "abc"})).unwrap();
        assert_eq!(msg, Message::RemoveVideo { video_id: "abc".into() });

        let msg: Message = serde_json::from_value(json!({"action": "getExportData", "format": "csv"})).unwrap();
        assert_eq!(msg, Message::GetExportData { format: ExportFormat::Csv });

        let msg: Message = serde_json::from_value(json!({"action": "getSelected"})).unwrap();
        assert_eq!(msg, Message::GetSelected);
    }

    #[test]
    fn notifications_serialize_like_the_popup_expects() {
        let value = serde_json::to_value(Notification::UpdateCount { count: 3 }).unwrap();
        assert_eq!(value, json!({"action": "updateCount", "count": 3}));

        let value = serde_json::to_value(Notification::SelectionChanged { count: 0, items: vec![] }).unwrap();
        assert_eq!(value, json!({"action": "selectionChanged", "count": 0, "items": []}));
    }

    #[test]
    fn responses_serialize_flat() {
        let value = serde_json::to_value(Response::Outcome(Outcome::ok())).unwrap();
        assert_eq!(value, json!({"success": true}));

        let value = serde_json::to_value(Response::Outcome(Outcome::failed("No videos selected"))).unwrap();
        assert_eq!(value, json!({"success": false, "message": "No videos selected"}));

        let value = serde_json::to_value(Response::Status { count: 2 }).unwrap();
        assert_eq!(value, json!({"count": 2}));
    }

    #[test]
    fn request_reply_round_trip() {
        let (controller, page) = channel();
        let pending = controller.request(Message::GetStatus).unwrap();
        assert!(pending.try_take().is_none());

        let request = page.try_next().unwrap();
        assert_eq!(request.message, Message::GetStatus);
        request.respond(Response::Status { count: 4 });

        assert_eq!(pending.try_take(), Some(Response::Status { count: 4 }));
    }

    #[test]
    fn notifying_a_closed_controller_fails_quietly() {
        let (controller, page) = channel();
        drop(controller);
        assert!(matches!(
            page.notify(Notification::UpdateCount { count: 1 }),
            Err(MessagingError::Disconnected)
        ));
    }

    #[test]
    fn set_enabled_persists_before_sending() {
        let (controller, page) = channel();
        let mut store = MemoryStore::new();
        controller.set_enabled(&mut store, "flag", true).unwrap();

        assert!(read_enabled(&store, "flag"));
        let request = page.try_next().unwrap();
        assert_eq!(request.message, Message::ToggleExtractor { state: true });

        // Page gone: the flag is still written.
        drop(page);
        controller.set_enabled(&mut store, "flag", false).unwrap();
        assert!(!read_enabled(&store, "flag"));
    }

    #[test]
    fn latest_count_reads_last_push() {
        let (controller, page) = channel();
        page.notify(Notification::UpdateCount { count: 1 }).unwrap();
        page.notify(Notification::SelectionChanged { count: 2, items: vec![] }).unwrap();
        assert_eq!(controller.latest_count(), Some(2));
        assert_eq!(controller.latest_count(), None);
    }

    #[test]
    fn notifier_shares_the_port_queue() {
        let (controller, page) = channel();
        let notifier = page.notifier();
        notifier.notify(Notification::UpdateCount { count: 5 }).unwrap();
        assert!(page.try_next().is_none());
        assert_eq!(controller.latest_count(), Some(5));
    }
}
