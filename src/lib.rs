// ============================================================================
// MODULE DECLARATIONS
// ============================================================================
pub mod core;
pub mod io;
pub mod math;

// ============================================================================
// RE-EXPORTS (Public API)
// ============================================================================
pub use crate::core::block::Block;
pub use crate::core::document::CastepInput;
pub use crate::core::error::{InputError, Result};
pub use crate::core::structure::{construct_pos_line, parse_pos_line, CellValues, Positions};
pub use crate::core::value::Value;
pub use crate::io::convert::convert_type;
pub use crate::io::parser::{ParseResult, Parser};
pub use crate::io::{parser, writer};
pub use crate::math::cell::cell_abcs_to_vec;

use std::path::Path;

/// A `.param` file: keywords only, by convention.
pub type ParamInput = CastepInput;
/// A `.cell` file: lattice and position blocks plus keywords.
pub type CellInput = CastepInput;

// ============================================================================
// HIGH-LEVEL INTERFACE
// ============================================================================

/// Parses lines into a document, coercing keyword values to their most specific type.
pub fn load_from_lines<S: AsRef<str>>(lines: &[S]) -> Result<CastepInput> {
    CastepInput::from_lines(lines, true)
}

/// Reads a file and parses it as [`load_from_lines`] does.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<CastepInput> {
    CastepInput::from_file(path, false)
}
