pub mod generator_output;
pub mod icon_params;

pub use generator_output::GeneratedFile;
pub use icon_params::{Background, GeneratorArgs, IconParams, OutputFormat, ValidatedParams};
