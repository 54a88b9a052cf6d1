pub mod core;
pub mod db;
pub mod learnhub_web_server;
pub mod models;
pub mod routes;
