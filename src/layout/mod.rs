pub mod easing;
pub mod pose;
pub mod table;
pub mod table_file;

pub use pose::{Pose, Transition};
pub use table::{LayoutTable, LayoutTables, Position, ViewportMode};
