mod ecma_compiler;
mod name_cache;
mod property_mangler;

pub use crate::{
  ecma_compiler::{EcmaCompiler, MinifyOptions, PrintedCode},
  name_cache::{PropertyCache, VariableCache},
};
