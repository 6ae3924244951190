use serde::Deserialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Iife,
  Esm,
  Cjs,
}

impl OutputFormat {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Iife => "iife",
      Self::Esm => "esm",
      Self::Cjs => "cjs",
    }
  }
}
