pub mod naming;
pub mod path_ext;
