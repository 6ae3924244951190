mod compose;
mod decoded_map;
mod document;
mod lines_count;
mod massage;
mod source;
mod source_joiner;

pub use crate::{
  compose::{compose, compose_chain},
  document::SourceMapDocument,
  lines_count::lines_count,
  massage::{massage, massage_document, MassageOptions},
  source::{SnippetSource, Source, SourceOrigin},
  source_joiner::SourceJoiner,
};
