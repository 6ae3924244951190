pub mod build_target;
pub mod compiled_artifact;
pub mod project_config;
pub mod target_registry;
pub mod wrapper;
