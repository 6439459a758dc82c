pub mod book;
pub mod loader;

pub use book::*;
pub use loader::*;
