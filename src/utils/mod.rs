//! Utility helpers

pub mod response_parser;

pub use response_parser::{parse_assistant_output, FUNCTION_CALL_MARKER};
