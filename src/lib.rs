mod error;

pub use error::{AppError, Result};

pub mod auth;
pub mod conversion;
pub mod models;
pub mod rate_service;
pub mod routes;
pub mod storage;
pub mod uploads;
pub mod utils;
