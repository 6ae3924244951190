pub mod output_format;
