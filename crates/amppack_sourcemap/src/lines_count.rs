/// Number of `\n` in `text`, which is the zero-based line of its last character.
#[inline]
pub fn lines_count(text: &str) -> u32 {
  u32::try_from(memchr::memchr_iter(b'\n', text.as_bytes()).count()).unwrap_or(u32::MAX)
}

#[test]
fn counts_line_breaks() {
  assert_eq!(lines_count(""), 0);
  assert_eq!(lines_count("(function(){"), 0);
  assert_eq!(lines_count("(function(){\nA;\n"), 2);
  assert_eq!(lines_count("a\r\nb"), 1);
}
