pub mod operations;
pub mod resume;
