pub mod event;
pub mod song;
