pub mod generation_service;

pub use generation_service::{GenerationReport, GenerationService};
