pub mod auth_service;
pub mod indicator_service;
pub mod market_service;
pub mod price_service;
