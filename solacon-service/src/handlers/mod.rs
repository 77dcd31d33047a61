pub mod health;
pub mod icon;
pub mod metrics;

pub use health::health_check;
pub use icon::generate_icon;
pub use self::metrics::metrics_endpoint;
