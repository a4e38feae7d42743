pub mod analyzers;
pub mod cache;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod model;
pub mod output;
pub mod queries;
pub mod responses;
pub mod server;
pub mod services;
pub mod session;
pub mod views;
