pub mod bundle_error;
pub mod log;
pub mod normalize_options;
pub mod output;
