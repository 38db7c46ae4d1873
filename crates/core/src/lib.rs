pub mod generation;
pub mod mindmap;
pub mod summary;
