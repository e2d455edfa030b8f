pub mod client;
pub mod config;
pub mod draft;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod session;
pub mod watch;
