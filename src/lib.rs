pub mod api;
pub mod auth;
pub mod configuration;
pub mod db;
pub mod entity;
pub mod lifecycle;
pub mod migration;
pub mod model;
pub mod service;
pub mod telemetry;
