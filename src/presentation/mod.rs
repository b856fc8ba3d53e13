// Presentation layer - HTTP surface for the host
pub mod app_state;
pub mod handlers;
pub mod router;
