pub mod baselines;
pub mod blocks;
pub mod conversations;
pub mod media;
pub mod messages;
pub mod notification_batches;
pub mod notifications;
pub mod preferences;
pub mod slideshow;
pub mod users;
pub mod vote_activity;
