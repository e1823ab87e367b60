pub mod api;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod entities;
pub mod error;
pub mod matching;
pub mod notify;
pub mod payment;
pub mod server;
pub mod store;
pub mod sweeper;
