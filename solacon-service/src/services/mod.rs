pub mod generator;
pub mod metrics;

pub use generator::GeneratorRunner;
pub use self::metrics::{get_metrics, init_metrics, record_generation};
