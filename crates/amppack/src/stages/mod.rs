pub mod bundle;
pub mod legacy;
pub mod minify;
pub mod splice;
