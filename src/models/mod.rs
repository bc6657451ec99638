pub mod catalog;
pub mod photo;

pub use catalog::*;
pub use photo::*;
