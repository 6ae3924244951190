// A wrapper around the `oxc_resolver` crate with the lookup rules of browser bundles.

mod resolver;

pub use crate::resolver::Resolver;

pub use oxc_resolver::ResolveError;
