use std::borrow::Cow;

fn replace_js_suffix<'a>(name: &'a str, replacement: &str) -> Cow<'a, str> {
  match name.strip_suffix(".js") {
    Some(stem) => Cow::Owned(format!("{stem}{replacement}")),
    None => Cow::Borrowed(name),
  }
}

/// `foo.js` -> `foo.mjs`
pub fn to_esm_name(name: &str) -> Cow<'_, str> {
  replace_js_suffix(name, ".mjs")
}

/// Npm module names (`*.module.js`) are produced earlier and are never renamed again.
pub fn maybe_to_esm_name(name: &str, esm: bool) -> Cow<'_, str> {
  if name.contains(".module") || !esm {
    return Cow::Borrowed(name);
  }
  to_esm_name(name)
}

/// Name of the primary output file of a build.
///
/// Minified builds are written under their configured minified name, unminified
/// builds under `to_name` when set and under the source file name otherwise.
pub fn dest_filename(
  src_filename: &str,
  minify: bool,
  minified_name: Option<&str>,
  to_name: Option<&str>,
  esm: bool,
) -> String {
  let filename = match (minify, minified_name) {
    (true, Some(minified_name)) => minified_name,
    _ => to_name.unwrap_or(src_filename),
  };
  maybe_to_esm_name(filename, esm).into_owned()
}

/// Name of the copy written next to the primary output when a target declares an alias.
pub fn alias_filename(alias_name: &str, minify: bool, esm: bool) -> String {
  let alias_name =
    if minify { Cow::Borrowed(alias_name) } else { replace_js_suffix(alias_name, ".max.js") };
  maybe_to_esm_name(&alias_name, esm).into_owned()
}
