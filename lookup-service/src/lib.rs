//! lookup-service: serves one document from MongoDB by key over HTTP.
pub mod config;
pub mod handlers;
pub mod services;
pub mod startup;
