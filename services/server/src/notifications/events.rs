use rt_protocol::ContentType;

/// A vote crossing into the pipeline. The HTTP adapter's vote handler
/// constructs this and pushes it onto `AppState::notification_events`
/// without waiting for the pipeline to process it.
#[derive(Debug, Clone)]
pub struct VoteRegistered {
    pub content_type: ContentType,
    pub content_id: i64,
    pub author_id: i64,
    pub current_upvotes: i64,
}

/// A reply crossing into the pipeline.
///
/// `parent_author_id` is carried alongside the core `(parent_comment_id,
/// reply_author_id, reply_id)` triple: the caller must already have
/// resolved the parent comment to validate the reply in the first place,
/// so it costs nothing to pass along, and the pipeline has no other way
/// to know who to notify.
#[derive(Debug, Clone)]
pub struct ReplyCreated {
    pub parent_comment_id: i64,
    pub parent_author_id: i64,
    pub reply_author_id: i64,
    pub reply_id: i64,
    pub reply_author_username: String,
}

#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Vote(VoteRegistered),
    Reply(ReplyCreated),
}
