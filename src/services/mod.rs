pub mod data_service;
pub mod report;
