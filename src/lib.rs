pub mod common;
pub mod container;
