pub mod audit;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod query;
pub mod records;
pub mod server;
pub mod service;
pub mod state;
pub mod storage;
