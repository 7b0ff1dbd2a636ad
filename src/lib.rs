// Library for tests to access modules

pub mod broadcast;
pub mod config;
pub mod history_repo;
pub mod history_service;
pub mod history_worker;
pub mod models;
pub mod routes;
pub mod snapshot_store;
pub mod telemetry;
pub mod worker;
