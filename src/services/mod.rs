pub mod refresh_service;
pub mod seed_service;
