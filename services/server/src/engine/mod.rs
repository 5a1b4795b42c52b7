pub mod blocks;
pub mod conversations;
pub mod media;
pub mod messages;
