pub mod board;
pub mod keybindings;
pub mod lightbox;
pub mod photo_card;
pub mod surface;
pub mod window;

pub use window::MainWindow;
