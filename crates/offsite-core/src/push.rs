use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Fallbacks when the push payload leaves fields out. The site speaks Arabic
// first, so the defaults do too.
pub const DEFAULT_TITLE: &str = "استشارات الأعمال";
pub const DEFAULT_BODY: &str = "رسالة جديدة من استشارات الأعمال";
pub const DEFAULT_PRIMARY_KEY: &str = "1";

const NOTIFICATION_ICON: &str = "/images/notification-icon.png";
const NOTIFICATION_BADGE: &str = "/images/badge-icon.png";

pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

/// What a push message may carry. Every field is optional; defaults fill
/// the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(rename = "primaryKey")]
    pub primary_key: Option<String>,
}

impl PushPayload {
    /// Parse raw push bytes. No bytes means no notification at all, which
    /// is different from bytes that fail to parse.
    pub fn parse(raw: &[u8]) -> crate::Result<Option<Self>> {
        if raw.is_empty() {
            return Ok(None);
        }
        let payload = serde_json::from_slice(raw)?;
        Ok(Some(payload))
    }
}

/// A fully resolved notification, ready to display
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub date_of_arrival: DateTime<Utc>,
    pub primary_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

impl Notification {
    /// Build the notification for a payload, filling in defaults for
    /// anything the sender left out
    pub fn from_payload(payload: &PushPayload) -> Self {
        Self {
            title: payload
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: payload
                .body
                .clone()
                .unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
            vibrate: vec![100, 50, 100],
            data: NotificationData {
                date_of_arrival: Utc::now(),
                primary_key: payload
                    .primary_key
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string()),
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.to_string(),
                    title: "اكتشف المزيد".to_string(),
                    icon: "/images/checkmark.png".to_string(),
                },
                NotificationAction {
                    action: ACTION_CLOSE.to_string(),
                    title: "إغلاق".to_string(),
                    icon: "/images/xmark.png".to_string(),
                },
            ],
        }
    }
}

/// Where a notification click should take the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    OpenWindow(String),
    Dismiss,
}

/// Route a notification click. Only an explicit close dismisses; tapping
/// the body or the explore action both land on the home page.
pub fn handle_click(action: Option<&str>) -> ClickOutcome {
    match action {
        Some(ACTION_CLOSE) => ClickOutcome::Dismiss,
        _ => ClickOutcome::OpenWindow("/".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_gets_all_defaults() {
        let notification = Notification::from_payload(&PushPayload::default());
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.body, DEFAULT_BODY);
        assert_eq!(notification.data.primary_key, DEFAULT_PRIMARY_KEY);
        assert_eq!(notification.vibrate, vec![100, 50, 100]);
        assert_eq!(notification.actions.len(), 2);
    }

    #[test]
    fn test_explicit_fields_override_defaults() {
        let payload = PushPayload {
            title: Some("عرض جديد".to_string()),
            body: Some("خصم على الاستشارات".to_string()),
            primary_key: Some("42".to_string()),
        };
        let notification = Notification::from_payload(&payload);
        assert_eq!(notification.title, "عرض جديد");
        assert_eq!(notification.body, "خصم على الاستشارات");
        assert_eq!(notification.data.primary_key, "42");
    }

    #[test]
    fn test_parse_reads_camel_case_keys() {
        let payload = PushPayload::parse(br#"{"title":"t","primaryKey":"7"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(payload.title.as_deref(), Some("t"));
        assert_eq!(payload.primary_key.as_deref(), Some("7"));
        assert_eq!(payload.body, None);
    }

    #[test]
    fn test_parse_without_data_yields_nothing() {
        assert!(PushPayload::parse(b"").unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PushPayload::parse(b"not json").is_err());
    }

    #[test]
    fn test_close_dismisses_everything_else_opens_home() {
        assert_eq!(handle_click(Some(ACTION_CLOSE)), ClickOutcome::Dismiss);
        assert_eq!(
            handle_click(Some(ACTION_EXPLORE)),
            ClickOutcome::OpenWindow("/".to_string())
        );
        assert_eq!(handle_click(None), ClickOutcome::OpenWindow("/".to_string()));
    }
}
