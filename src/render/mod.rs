pub mod bars;
pub mod canvas;
pub mod text;
pub mod window;
