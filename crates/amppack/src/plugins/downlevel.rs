use amppack_common::ESTarget;
use amppack_ecmascript::EcmaCompiler;

use super::{BundlerPlugin, TransformOutput};

/// Lowers syntax the target level does not support.
#[derive(Debug, Clone, Copy)]
pub struct DownlevelPlugin {
  target: ESTarget,
  module: bool,
}

impl DownlevelPlugin {
  pub fn new(target: ESTarget, module: bool) -> Self {
    Self { target, module }
  }
}

impl BundlerPlugin for DownlevelPlugin {
  fn name(&self) -> &str {
    "downlevel"
  }

  fn transform(&self, id: &str, code: &str) -> anyhow::Result<Option<TransformOutput>> {
    if self.target == ESTarget::EsNext {
      return Ok(None);
    }
    let printed = EcmaCompiler::downlevel(code, id, self.module, self.target.into())?;
    Ok(Some(TransformOutput { code: printed.code, map: printed.map }))
  }
}

#[test]
fn lowers_exponentiation() {
  let plugin = DownlevelPlugin::new(ESTarget::Es2015, false);
  let output = plugin.transform("amp.js", "window.a = 2 ** 3;").unwrap().unwrap();
  assert!(!output.code.contains("**"));

  let plugin = DownlevelPlugin::new(ESTarget::EsNext, false);
  assert!(plugin.transform("amp.js", "window.a = 2 ** 3;").unwrap().is_none());
}
