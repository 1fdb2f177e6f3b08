#![forbid(unsafe_code)]

pub mod model;
pub mod navigation;

pub use navigation::{is_last_topic, next_topic};
