pub mod assignment;
pub mod dinner;
