pub mod client;
pub mod domain;
pub mod query;
pub mod settings;
