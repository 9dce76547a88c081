pub mod renderer;

pub use renderer::{board_fits, cell_width_for, Renderer, Scene, MIN_CELL_WIDTH};
