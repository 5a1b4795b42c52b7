// rt-protocol: wire types shared between the delivery hub and its clients.
//
// Every websocket frame is a single JSON object carrying a discriminated
// `Event`. HTTP error bodies share the flat `{error, details}` envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    Gif,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::Gif => "gif",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PostMilestone,
    PostVelocity,
    CommentMilestone,
    CommentVelocity,
    CommentReply,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::PostMilestone => "post_milestone",
            NotificationType::PostVelocity => "post_velocity",
            NotificationType::CommentMilestone => "comment_milestone",
            NotificationType::CommentVelocity => "comment_velocity",
            NotificationType::CommentReply => "comment_reply",
        }
    }

    /// The milestone variant corresponding to a velocity variant of the same content type, if any.
    pub fn milestone_counterpart(self) -> Option<NotificationType> {
        match self {
            NotificationType::PostVelocity => Some(NotificationType::PostMilestone),
            NotificationType::CommentVelocity => Some(NotificationType::CommentMilestone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Comment,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideshowType {
    Personal,
    Reddit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationBatchStatus {
    Pending,
    Processed,
    Cancelled,
}

/// One of the five fixed buffer sizes allowed for slideshow auto-advance.
pub const AUTO_ADVANCE_INTERVALS: [i32; 5] = [3, 5, 10, 15, 30];

// ---------------------------------------------------------------------------
// Record payloads (the shapes embedded in event payloads and HTTP bodies)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_file_id: i64,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
    /// AES key wrapped to the recipient's public key.
    pub recipient_key_wrap: String,
    /// AES key wrapped to the sender's public key.
    pub sender_key_wrap: String,
    pub iv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub message_type: MessageType,
    pub encrypted_content: String,
    pub sender_encrypted_content: String,
    pub encryption_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes_per_hour: Option<f64>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideshowSessionRecord {
    pub id: i64,
    pub conversation_id: i64,
    pub slideshow_type: SlideshowType,
    pub current_index: i32,
    pub total_items: i32,
    pub controller_user_id: i64,
    pub auto_advance: bool,
    pub auto_advance_interval: Option<i32>,
}

// ---------------------------------------------------------------------------
// Hub event envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeliveredPayload {
    pub message_id: i64,
    pub conversation_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReadPayload {
    pub message_id: i64,
    pub conversation_id: i64,
    pub reader_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationReadPayload {
    pub conversation_id: i64,
    pub reader_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresencePayload {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingPayload {
    pub conversation_id: i64,
    pub sender_id: i64,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideshowNavigatePayload {
    pub session_id: i64,
    pub current_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideshowControlTransferredPayload {
    pub session_id: i64,
    pub new_controller_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideshowAutoAdvanceUpdatedPayload {
    pub session_id: i64,
    pub auto_advance: bool,
    pub auto_advance_interval: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideshowStoppedPayload {
    pub session_id: i64,
}

/// The single tagged record carried over every websocket frame.
///
/// `type` discriminates, `payload` carries the variant body, giving every
/// event a uniform `{type, payload}` envelope on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    NewMessage(MessageRecord),
    MessageDelivered(MessageDeliveredPayload),
    MessageRead(MessageReadPayload),
    ConversationRead(ConversationReadPayload),
    UserOnline(PresencePayload),
    UserOffline(PresencePayload),
    Typing(TypingPayload),
    Notification(NotificationRecord),
    SlideshowStarted(SlideshowSessionRecord),
    SlideshowNavigate(SlideshowNavigatePayload),
    SlideshowControlTransferred(SlideshowControlTransferredPayload),
    SlideshowAutoAdvanceUpdated(SlideshowAutoAdvanceUpdatedPayload),
    SlideshowStopped(SlideshowStoppedPayload),
}

/// Client-originated frame. The only inbound message type a websocket client
/// is expected to send is `typing`; anything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientFrame {
    Typing {
        conversation_id: i64,
        recipient_id: i64,
        is_typing: bool,
    },
}

// ---------------------------------------------------------------------------
// HTTP error envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_envelope_serializes_with_type_and_payload_fields() {
        let event = Event::MessageRead(MessageReadPayload {
            message_id: 1,
            conversation_id: 2,
            reader_id: 3,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message_read");
        assert_eq!(json["payload"]["message_id"], 1);
    }

    #[test]
    fn media_omitted_when_absent() {
        let record = MessageRecord {
            id: 1,
            conversation_id: 1,
            sender_id: 1,
            recipient_id: 2,
            message_type: MessageType::Text,
            encrypted_content: "ct".into(),
            sender_encrypted_content: "ct2".into(),
            encryption_version: "v1".into(),
            media: None,
            sent_at: Utc::now(),
            delivered_at: None,
            read_at: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("media").is_none());
    }
}
