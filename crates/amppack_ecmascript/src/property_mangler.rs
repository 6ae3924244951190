use oxc::{
  ast::{
    ast::{
      BindingIdentifier, BindingProperty, IdentifierName, IdentifierReference, MethodDefinition,
      ObjectProperty, Program, PropertyDefinition, PropertyKey, StaticMemberExpression,
      StringLiteral,
    },
    AstBuilder,
  },
  ast_visit::{walk, walk_mut, Visit, VisitMut},
};
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::PropertyCache;

/// Every name spelled out in a program. Mangled property names must not shadow any
/// of them.
#[derive(Default)]
struct NamesInUse {
  names: FxHashSet<String>,
}

impl<'a> Visit<'a> for NamesInUse {
  fn visit_identifier_name(&mut self, it: &IdentifierName<'a>) {
    self.names.insert(it.name.to_string());
  }

  fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
    self.names.insert(it.name.to_string());
  }

  fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
    self.names.insert(it.name.to_string());
  }

  fn visit_string_literal(&mut self, it: &StringLiteral<'a>) {
    self.names.insert(it.value.to_string());
    walk::walk_string_literal(self, it);
  }
}

/// Renames non-quoted static property names matching `pattern`. Quoted keys,
/// computed keys and shorthand properties are left alone.
pub struct PropertyMangler<'a, 'c> {
  ast: AstBuilder<'a>,
  pattern: &'c Regex,
  cache: &'c PropertyCache,
  in_use: FxHashSet<String>,
}

impl<'a, 'c> PropertyMangler<'a, 'c> {
  pub fn new(
    ast: AstBuilder<'a>,
    program: &Program<'a>,
    pattern: &'c Regex,
    cache: &'c PropertyCache,
  ) -> Self {
    let mut in_use = NamesInUse::default();
    in_use.visit_program(program);
    Self { ast, pattern, cache, in_use: in_use.names }
  }

  pub fn mangle(mut self, program: &mut Program<'a>) {
    self.visit_program(program);
  }

  fn rename(&self, name: &mut IdentifierName<'a>) {
    if self.pattern.is_match(&name.name) {
      let mangled = self.cache.get_or_assign(&name.name, &self.in_use);
      name.name = self.ast.atom(&mangled);
    }
  }

  fn rename_key(&self, key: &mut PropertyKey<'a>, computed: bool) {
    if computed {
      return;
    }
    if let PropertyKey::StaticIdentifier(ident) = key {
      self.rename(ident);
    }
  }
}

impl<'a> VisitMut<'a> for PropertyMangler<'a, '_> {
  fn visit_static_member_expression(&mut self, it: &mut StaticMemberExpression<'a>) {
    self.rename(&mut it.property);
    walk_mut::walk_static_member_expression(self, it);
  }

  fn visit_object_property(&mut self, it: &mut ObjectProperty<'a>) {
    if !it.shorthand {
      self.rename_key(&mut it.key, it.computed);
    }
    walk_mut::walk_object_property(self, it);
  }

  fn visit_binding_property(&mut self, it: &mut BindingProperty<'a>) {
    if !it.shorthand {
      self.rename_key(&mut it.key, it.computed);
    }
    walk_mut::walk_binding_property(self, it);
  }

  fn visit_method_definition(&mut self, it: &mut MethodDefinition<'a>) {
    self.rename_key(&mut it.key, it.computed);
    walk_mut::walk_method_definition(self, it);
  }

  fn visit_property_definition(&mut self, it: &mut PropertyDefinition<'a>) {
    self.rename_key(&mut it.key, it.computed);
    walk_mut::walk_property_definition(self, it);
  }
}
