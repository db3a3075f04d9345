pub mod aggregation_service;
pub mod history_service;
pub mod market_service;
