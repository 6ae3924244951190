use std::path::Path;

use oxc::{
  allocator::Allocator,
  ast::AstBuilder,
  codegen::{Codegen, CodegenOptions},
  diagnostics::OxcDiagnostic,
  minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions},
  parser::Parser,
  semantic::{Scoping, SemanticBuilder},
  span::SourceType,
  transformer::{ESTarget, TransformOptions, Transformer},
};
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::{property_mangler::PropertyMangler, PropertyCache, VariableCache};

#[derive(Debug, Clone)]
pub struct PrintedCode {
  pub code: String,
  pub map: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MinifyOptions {
  pub passes: usize,
  pub pretty_print: bool,
  pub module: bool,
  pub private_property_pattern: Regex,
  pub target: ESTarget,
}

fn diagnostics_to_error(filename: &str, errors: &[OxcDiagnostic]) -> anyhow::Error {
  let messages = errors.iter().map(ToString::to_string).collect::<Vec<_>>();
  anyhow::anyhow!("{filename}: {}", messages.join("\n"))
}

fn source_type_of(module: bool) -> SourceType {
  if module {
    SourceType::mjs()
  } else {
    SourceType::cjs()
  }
}

/// Top-level bindings keyed by the offset of their declaration.
fn root_bindings(scoping: &Scoping) -> FxHashMap<u32, String> {
  let root = scoping.root_scope_id();
  scoping
    .symbol_ids()
    .filter(|&symbol_id| scoping.symbol_scope_id(symbol_id) == root)
    .map(|symbol_id| {
      (scoping.symbol_span(symbol_id).start, scoping.symbol_name(symbol_id).to_string())
    })
    .collect()
}

pub struct EcmaCompiler;

impl EcmaCompiler {
  /// Lowers syntax newer than `target` and prints the result with a sourcemap.
  pub fn downlevel(
    source_text: &str,
    filename: &str,
    module: bool,
    target: ESTarget,
  ) -> anyhow::Result<PrintedCode> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source_text, source_type_of(module)).parse();
    if !ret.errors.is_empty() {
      return Err(diagnostics_to_error(filename, &ret.errors));
    }
    let mut program = ret.program;

    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let options = TransformOptions::from(target);
    let ret = Transformer::new(&allocator, Path::new(filename), &options)
      .build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
      return Err(diagnostics_to_error(filename, &ret.errors));
    }

    let ret = Codegen::new()
      .with_options(CodegenOptions {
        source_map_path: Some(filename.into()),
        ..CodegenOptions::default()
      })
      .build(&program);

    Ok(PrintedCode { code: ret.code, map: ret.map.map(|map| map.to_json_string()) })
  }

  /// Compresses `source_text` in `options.passes` passes, the last one also mangling
  /// local names, and renames private properties through `props`. Top-level
  /// renames of this call are recorded in `vars`.
  pub fn minify(
    source_text: &str,
    filename: &str,
    options: &MinifyOptions,
    props: &PropertyCache,
    vars: &mut VariableCache,
  ) -> anyhow::Result<PrintedCode> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source_text, source_type_of(options.module)).parse();
    if !ret.errors.is_empty() {
      return Err(diagnostics_to_error(filename, &ret.errors));
    }
    let program = allocator.alloc(ret.program);

    let original_bindings =
      root_bindings(&SemanticBuilder::new().build(program).semantic.into_scoping());

    PropertyMangler::new(
      AstBuilder::new(&allocator),
      program,
      &options.private_property_pattern,
      props,
    )
    .mangle(program);

    let passes = options.passes.max(1);
    let mut scoping = None;
    for pass in 1..=passes {
      let mangle =
        (pass == passes).then(|| MangleOptions { top_level: options.module, ..MangleOptions::default() });
      let ret = Minifier::new(MinifierOptions {
        mangle,
        compress: Some(CompressOptions { target: options.target, ..CompressOptions::default() }),
      })
      .build(&allocator, program);
      scoping = ret.scoping;
    }

    if let Some(scoping) = &scoping {
      for (start, mangled) in root_bindings(scoping) {
        if let Some(original) = original_bindings.get(&start) {
          if *original != mangled {
            vars.insert(original.clone(), mangled);
          }
        }
      }
    }

    let ret = Codegen::new()
      .with_options(CodegenOptions {
        minify: !options.pretty_print,
        source_map_path: Some(filename.into()),
        ..CodegenOptions::default()
      })
      .with_scoping(scoping)
      .build(program);

    Ok(PrintedCode { code: ret.code, map: ret.map.map(|map| map.to_json_string()) })
  }
}
