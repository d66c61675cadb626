pub mod error;
pub mod filename;
pub mod logger;

pub use filename::normalize_file_id;
