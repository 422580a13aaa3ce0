pub mod backend;
pub mod events;
