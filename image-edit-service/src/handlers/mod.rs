//! HTTP handlers for the image edit service.

pub mod edit;
pub mod health;
pub mod metrics;

pub use edit::edit_image;
pub use health::health_check;
pub use metrics::metrics;
