pub mod catalog;
pub mod config;
pub mod describe;
pub mod validate;
