use std::{borrow::Cow, path::Path};

use sugar_path::SugarPath;

pub trait PathExt {
  fn expect_to_slash(&self) -> String;

  /// Last path component, or the whole path when it has none.
  fn file_name_lossy(&self) -> Cow<str>;
}

impl PathExt for Path {
  fn expect_to_slash(&self) -> String {
    self
      .to_slash()
      .unwrap_or_else(|| panic!("Failed to convert {:?} to slash str", self.display()))
      .into_owned()
  }

  fn file_name_lossy(&self) -> Cow<str> {
    self.file_name().map_or_else(|| self.to_string_lossy(), |name| name.to_string_lossy())
  }
}

#[test]
fn test_file_name_lossy() {
  let path = Path::new("dist").join("v0").join("amp-bind-0.1.js");
  assert_eq!(path.file_name_lossy(), "amp-bind-0.1.js");
  assert_eq!(Path::new("amp.js").file_name_lossy(), "amp.js");
  assert_eq!(Path::new("dist").join("amp.js").expect_to_slash(), "dist/amp.js");
}
