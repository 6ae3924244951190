/// Marks where bundled module code goes inside a wrapper template.
pub const CONTENTS_PLACEHOLDER: &str = "<%= contents %>";

#[derive(Debug, PartialEq, Eq)]
pub struct SplitWrapper<'a> {
  pub banner: &'a str,
  pub footer: &'a str,
}

/// Splits a wrapper template around its contents placeholder. A template without
/// the placeholder is treated as a banner with an empty footer.
pub fn split_wrapper(wrapper: &str) -> SplitWrapper<'_> {
  match wrapper.find(CONTENTS_PLACEHOLDER) {
    Some(start) => SplitWrapper {
      banner: &wrapper[..start],
      footer: &wrapper[start + CONTENTS_PLACEHOLDER.len()..],
    },
    None => SplitWrapper { banner: wrapper, footer: "" },
  }
}

#[test]
fn splits_around_placeholder() {
  let split = split_wrapper("(function(){<%= contents %>})()");
  assert_eq!(split, SplitWrapper { banner: "(function(){", footer: "})()" });

  let split = split_wrapper(CONTENTS_PLACEHOLDER);
  assert_eq!(split, SplitWrapper { banner: "", footer: "" });
}
