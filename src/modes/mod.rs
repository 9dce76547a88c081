pub mod play;

pub use play::{viewport_for_terminal, PlayMode};
