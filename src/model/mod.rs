pub mod data_core;
pub mod extractor;
pub mod field_paths;
pub mod notifications;
pub mod sample_data;
pub mod scheduler;
pub mod typing;
