// Application layer - use cases over the upstream API
pub mod health_service;
pub mod novant_api;
pub mod query_service;
pub mod stream_service;
pub mod trend_service;

#[cfg(test)]
pub mod testing;
