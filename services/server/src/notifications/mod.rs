pub mod events;
pub mod milestones;
pub mod pipeline;
pub mod velocity;
pub mod workers;
