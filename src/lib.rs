pub mod config;
pub mod edit;
pub mod error;
pub mod model;
pub mod utils;
