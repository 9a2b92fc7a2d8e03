pub mod actuator;
pub mod api;
pub mod config;
pub mod displays;
pub mod error;
pub mod scheduler;
pub mod service;
pub mod shutdown;
