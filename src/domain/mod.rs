// Domain layer - query, pagination, metadata and frame models
pub mod bucket;
pub mod error;
pub mod frame;
pub mod health;
pub mod instance;
pub mod point;
pub mod query;
pub mod trend;
