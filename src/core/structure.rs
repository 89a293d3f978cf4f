use crate::core::block::Block;
use crate::core::document::CastepInput;
use crate::core::error::{InputError, Result};
use crate::core::value::Value;
use crate::math::cell::cell_abcs_to_vec;
use lazy_static::lazy_static;
use nalgebra::{Matrix3, RowVector3, Vector3};
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

pub const LATTICE_CART: &str = "lattice_cart";
pub const LATTICE_ABC: &str = "lattice_abc";
pub const POSITIONS_ABS: &str = "positions_abs";
pub const POSITIONS_FRAC: &str = "positions_frac";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Atomic positions as parallel lists, always in Cartesian coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Positions {
    pub elements: Vec<String>,
    pub coordinates: Vec<Vector3<f64>>,
    /// Free text after the coordinates (`SPIN=1 LABEL=Ce1`), kept verbatim.
    pub tags: Vec<String>,
}

impl Positions {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vector3<f64>, &str)> {
        self.elements
            .iter()
            .zip(&self.coordinates)
            .zip(&self.tags)
            .map(|((e, p), t)| (e.as_str(), p, t.as_str()))
    }
}

/// Cell input for [`CastepInput::set_cell`]: a flat list (diagonal lengths)
/// or a list of rows (full vectors). Only 3 and 3x3 are accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValues {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

impl CellValues {
    pub fn into_matrix(self) -> Result<Matrix3<f64>> {
        match self {
            CellValues::Flat(v) if v.len() == 3 => {
                Ok(Matrix3::from_diagonal(&Vector3::new(v[0], v[1], v[2])))
            }
            CellValues::Rows(rows) if rows.len() == 3 && rows.iter().all(|r| r.len() == 3) => {
                Ok(Matrix3::from_rows(&[row(&rows[0]), row(&rows[1]), row(&rows[2])]))
            }
            other => Err(InputError::validation(format!(
                "cell must be a 3x3 matrix or 3 lengths, but {:?} is given",
                other
            ))),
        }
    }
}

impl From<Vec<f64>> for CellValues {
    fn from(v: Vec<f64>) -> Self {
        CellValues::Flat(v)
    }
}

impl From<[f64; 3]> for CellValues {
    fn from(v: [f64; 3]) -> Self {
        CellValues::Flat(v.to_vec())
    }
}

impl From<Vector3<f64>> for CellValues {
    fn from(v: Vector3<f64>) -> Self {
        CellValues::Flat(v.iter().copied().collect())
    }
}

impl From<Vec<Vec<f64>>> for CellValues {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        CellValues::Rows(rows)
    }
}

impl From<[[f64; 3]; 3]> for CellValues {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        CellValues::Rows(rows.iter().map(|r| r.to_vec()).collect())
    }
}

impl From<Matrix3<f64>> for CellValues {
    fn from(m: Matrix3<f64>) -> Self {
        CellValues::Rows(m.row_iter().map(|r| r.iter().copied().collect()).collect())
    }
}

// ============================================================================
// LINE HELPERS
// ============================================================================

fn row(v: &[f64]) -> RowVector3<f64> {
    RowVector3::new(v[0], v[1], v[2])
}

fn parse_float(token: &str, context: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| InputError::format(format!("cannot read '{}' as a number in {}", token, context)))
}

fn parse_floats(line: &str, context: &str) -> Result<Vec<f64>> {
    line.split_whitespace().map(|t| parse_float(t, context)).collect()
}

fn expect_block<'a>(name: &str, value: &'a Value) -> Result<&'a Block> {
    value
        .as_block()
        .ok_or_else(|| InputError::format(format!("{} must be a block", name)))
}

/// Block lines without a leading unit line (`ang`, `bohr`, ...).
fn body_lines(block: &Block) -> &[String] {
    match block.split_first() {
        Some((first, rest)) if is_unit_line(first) => rest,
        _ => block.lines(),
    }
}

fn is_unit_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => token.parse::<f64>().is_err(),
        _ => false,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Parses `<element> <x> <y> <z> [tags...]`.
///
/// The line splits into at most five whitespace-separated fields; the fifth keeps
/// the rest of the line unsplit. The element symbol is capitalized.
pub fn parse_pos_line(line: &str) -> Result<(String, Vector3<f64>, String)> {
    let line = line.trim();
    let fields: Vec<&str> = WHITESPACE.splitn(line, 5).collect();
    if fields.len() < 4 {
        return Err(InputError::format(format!("cannot understand line: {}", line)));
    }

    let element = capitalize(fields[0]);
    let coords = Vector3::new(
        parse_float(fields[1], line)?,
        parse_float(fields[2], line)?,
        parse_float(fields[3], line)?,
    );
    let tags = fields.get(4).copied().unwrap_or_default().to_string();

    Ok((element, coords, tags))
}

/// Inverse of [`parse_pos_line`].
pub fn construct_pos_line(element: &str, coords: &Vector3<f64>, tags: &str) -> String {
    format!(
        "{}  {:.10} {:.10} {:.10} {}",
        element, coords.x, coords.y, coords.z, tags
    )
    .trim_end()
    .to_string()
}

// ============================================================================
// GEOMETRY ACCESSORS
// ============================================================================

impl CastepInput {
    /// Cell vectors as matrix rows, re-read from the current entries on every call.
    ///
    /// `lattice_cart` wins over `lattice_abc`. Returns `Ok(None)` when neither is set.
    pub fn get_cell(&self) -> Result<Option<Matrix3<f64>>> {
        if let Some(value) = self.get(LATTICE_CART) {
            let block = expect_block(LATTICE_CART, value)?;
            let rows = body_lines(block)
                .iter()
                .map(|l| parse_floats(l, LATTICE_CART))
                .collect::<Result<Vec<_>>>()?;

            if rows.len() != 3 || rows.iter().any(|r| r.len() != 3) {
                return Err(InputError::format(format!(
                    "{} needs 3 rows of 3 numbers, found {:?}",
                    LATTICE_CART, rows
                )));
            }
            return Ok(Some(Matrix3::from_rows(&[row(&rows[0]), row(&rows[1]), row(&rows[2])])));
        }

        if let Some(value) = self.get(LATTICE_ABC) {
            let block = expect_block(LATTICE_ABC, value)?;
            let mut abc = Vec::with_capacity(6);
            for line in body_lines(block) {
                abc.extend(parse_floats(line, LATTICE_ABC)?);
            }

            let abc: [f64; 6] = abc.try_into().map_err(|v: Vec<f64>| {
                InputError::format(format!(
                    "{} needs 6 values, found {}",
                    LATTICE_ABC,
                    v.len()
                ))
            })?;
            return cell_abcs_to_vec(&abc).map(Some);
        }

        Ok(None)
    }

    /// Atomic positions in Cartesian coordinates.
    ///
    /// `positions_abs` is preferred; `positions_frac` is converted with the current
    /// cell as `f1*A + f2*B + f3*C`.
    pub fn get_positions(&self) -> Result<Positions> {
        let (name, value, fractional) = match (self.get(POSITIONS_ABS), self.get(POSITIONS_FRAC)) {
            (Some(value), _) => (POSITIONS_ABS, value, false),
            (None, Some(value)) => (POSITIONS_FRAC, value, true),
            (None, None) => return Err(InputError::validation("no positions defined")),
        };
        let block = expect_block(name, value)?;

        let mut positions = Positions::default();
        for line in body_lines(block) {
            let (element, coords, tags) = parse_pos_line(line)?;
            positions.elements.push(element);
            positions.coordinates.push(coords);
            positions.tags.push(tags);
        }

        if fractional {
            let cell = self.get_cell()?.ok_or_else(|| {
                InputError::validation("fractional positions need lattice_cart or lattice_abc")
            })?;
            let to_cartesian = cell.transpose();
            for coords in positions.coordinates.iter_mut() {
                *coords = to_cartesian * *coords;
            }
        }

        Ok(positions)
    }

    /// Writes a `lattice_cart` block. Three lengths give an orthorhombic cell.
    pub fn set_cell(&mut self, cell: impl Into<CellValues>) -> Result<()> {
        let matrix = cell.into().into_matrix()?;
        let block: Block = matrix
            .row_iter()
            .map(|r| format!("{:.10}  {:.10}  {:.10}", r[0], r[1], r[2]))
            .collect();
        self.set(LATTICE_CART, block);
        Ok(())
    }

    /// Writes a `positions_frac` or `positions_abs` block, one line per atom.
    /// Tags take the same string type as the elements; missing tags are written as empty.
    pub fn set_positions<S: AsRef<str>>(
        &mut self,
        elements: &[S],
        positions: &[Vector3<f64>],
        tags: Option<&[S]>,
        fractional: bool,
    ) -> Result<()> {
        if elements.len() != positions.len() {
            return Err(InputError::validation(format!(
                "{} elements but {} positions",
                elements.len(),
                positions.len()
            )));
        }
        if let Some(tags) = tags {
            if tags.len() != elements.len() {
                return Err(InputError::validation(format!(
                    "{} elements but {} tags",
                    elements.len(),
                    tags.len()
                )));
            }
        }

        let block: Block = elements
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (element, coords))| {
                let tag = tags.map(|t| t[i].as_ref()).unwrap_or_default();
                construct_pos_line(element.as_ref(), coords, tag)
            })
            .collect();

        let name = if fractional { POSITIONS_FRAC } else { POSITIONS_ABS };
        self.set(name, block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CE_LINE: &str = "Ce 1.23 2.34 2.6 SPIN=1 LABEL=Ce1 MIX=(1 1)";
    const CE_TAGS: &str = "SPIN=1 LABEL=Ce1 MIX=(1 1)";

    fn cell_input() -> CastepInput {
        let mut input = CastepInput::new();
        input.set("symmetry_generate", true);
        input
    }

    #[test]
    fn pos_line_keeps_tags_unsplit() {
        let (element, coords, tags) = parse_pos_line(CE_LINE).unwrap();
        assert_eq!(element, "Ce");
        assert_eq!(coords, Vector3::new(1.23, 2.34, 2.6));
        assert_eq!(tags, CE_TAGS);

        let line = construct_pos_line(&element, &coords, &tags);
        assert_eq!(parse_pos_line(&line).unwrap(), (element, coords, tags));
    }

    #[test]
    fn pos_line_capitalizes_element() {
        let (element, _, tags) = parse_pos_line("  fE\t0 0.5   1 ").unwrap();
        assert_eq!(element, "Fe");
        assert_eq!(tags, "");
    }

    #[test]
    fn short_or_non_numeric_pos_lines_are_rejected() {
        assert!(parse_pos_line("O 0.0 0.0").unwrap_err().is_format());
        assert!(parse_pos_line("O 0.0 x 0.0").unwrap_err().is_format());
    }

    #[test]
    fn positions_round_trip_through_the_document() {
        let mut input = cell_input();
        input.set("positions_abs", Block::from(vec![CE_LINE; 3]));

        let positions = input.get_positions().unwrap();
        assert_eq!(positions.elements, ["Ce"; 3]);
        assert!(positions.coordinates.iter().all(|p| *p == Vector3::new(1.23, 2.34, 2.6)));
        assert_eq!(positions.tags, [CE_TAGS; 3]);

        input
            .set_positions(&positions.elements, &positions.coordinates, Some(positions.tags.as_slice()), false)
            .unwrap();
        assert_eq!(input.get_positions().unwrap(), positions);
    }

    #[test]
    fn set_positions_without_tags() {
        let mut input = cell_input();
        let p = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        input.set_positions(&["O", "O"], &p, None, false).unwrap();

        let positions = input.get_positions().unwrap();
        assert_eq!(positions.elements, ["O", "O"]);
        assert_eq!(positions.coordinates, p);
        assert_eq!(positions.tags, ["", ""]);
    }

    #[test]
    fn set_positions_with_borrowed_tags() {
        let mut input = cell_input();
        let p = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5)];
        input
            .set_positions(&["Ce", "O"], &p, Some(["SPIN=1", ""].as_slice()), true)
            .unwrap();

        let block = input.get(POSITIONS_FRAC).and_then(Value::as_block).unwrap();
        assert_eq!(block[0], "Ce  0.0000000000 0.0000000000 0.0000000000 SPIN=1");
        assert_eq!(block[1], "O  0.5000000000 0.5000000000 0.5000000000");
    }

    #[test]
    fn mismatched_position_lists_are_rejected() {
        let mut input = cell_input();
        let err = input
            .set_positions(&["O", "H"], &[Vector3::zeros()], None, false)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn missing_positions_is_a_validation_error() {
        assert!(cell_input().get_positions().unwrap_err().is_validation());
    }

    #[test]
    fn set_cell_accepts_matrix_or_lengths() {
        let mut input = cell_input();
        let cin = [[1.0, 0.0, 0.0], [0.0, 1.5, 0.0], [0.0, 0.0, 1.0]];
        input.set_cell(cin).unwrap();
        assert_eq!(
            input.get_cell().unwrap(),
            Some(Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.5, 0.0, 0.0, 0.0, 1.0))
        );

        input.set_cell([3.0, 3.0, 3.0]).unwrap();
        assert_eq!(
            input.get_cell().unwrap(),
            Some(Matrix3::from_diagonal(&Vector3::new(3.0, 3.0, 3.0)))
        );
    }

    #[test]
    fn set_cell_rejects_other_shapes() {
        let mut input = cell_input();
        let err = input
            .set_cell(vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]])
            .unwrap_err();
        assert!(err.is_validation());
        assert!(input.set_cell(vec![1.0, 2.0, 3.0, 4.0]).unwrap_err().is_validation());
        assert!(!input.contains_key(LATTICE_CART));
    }

    #[test]
    fn set_cell_writes_ten_decimals() {
        let mut input = cell_input();
        input.set_cell([2.0, 2.0, 2.0]).unwrap();
        let block = input.get(LATTICE_CART).and_then(Value::as_block).unwrap();
        assert_eq!(block[0], "2.0000000000  0.0000000000  0.0000000000");
    }

    #[test]
    fn no_lattice_gives_no_cell() {
        assert_eq!(cell_input().get_cell().unwrap(), None);
    }

    #[test]
    fn lattice_abc_needs_six_values() {
        let mut input = cell_input();
        input.set(LATTICE_ABC, Block::from(vec!["4 4 4", "90 90"]));
        assert!(input.get_cell().unwrap_err().is_format());
    }

    #[test]
    fn lattice_cart_needs_three_rows() {
        let mut input = cell_input();
        input.set(LATTICE_CART, Block::from(vec!["1 0 0", "0 1 0"]));
        assert!(input.get_cell().unwrap_err().is_format());
    }

    #[test]
    fn leading_unit_line_is_skipped() {
        let mut input = cell_input();
        input.set(LATTICE_CART, Block::from(vec!["ang", "2 0 0", "0 2 0", "0 0 2"]));
        assert_eq!(
            input.get_cell().unwrap(),
            Some(Matrix3::from_diagonal(&Vector3::new(2.0, 2.0, 2.0)))
        );
    }

    #[test]
    fn lattice_cart_takes_priority_over_abc() {
        let mut input = cell_input();
        input.set(LATTICE_ABC, Block::from(vec!["5 5 5", "90 90 90"]));
        input.set_cell([2.0, 2.0, 2.0]).unwrap();
        assert_eq!(input.get_cell().unwrap().unwrap()[(0, 0)], 2.0);
    }

    #[test]
    fn fractional_positions_are_scaled_by_the_cell() {
        let mut input = cell_input();
        input.set(LATTICE_ABC, Block::from(vec!["4 4 4", "90 90 90"]));
        input.set(POSITIONS_FRAC, Block::from(vec!["O 0.25 0.25 0.25", "O 0.5 0.5 0.5"]));

        let positions = input.get_positions().unwrap();
        assert_eq!(
            positions.coordinates,
            [Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 2.0, 2.0)]
        );
    }

    #[test]
    fn fractional_positions_follow_the_lattice_vectors() {
        let mut input = cell_input();
        input.set_cell([[2.0, 0.0, 0.0], [1.0, 3.0, 0.0], [0.0, 0.0, 5.0]]).unwrap();
        input.set_positions(&["Si"], &[Vector3::new(0.0, 1.0, 0.0)], None, true).unwrap();

        let positions = input.get_positions().unwrap();
        assert_relative_eq!(positions.coordinates[0], Vector3::new(1.0, 3.0, 0.0));
    }

    #[test]
    fn fractional_positions_without_cell_are_rejected() {
        let mut input = cell_input();
        input.set(POSITIONS_FRAC, Block::from(vec!["O 0 0 0"]));
        assert!(input.get_positions().unwrap_err().is_validation());
    }

    #[test]
    fn geometry_follows_the_latest_mutation() {
        let mut input = cell_input();
        input.set_cell([1.0, 1.0, 1.0]).unwrap();
        input.set(POSITIONS_FRAC, Block::from(vec!["O 0.5 0.5 0.5"]));
        assert_eq!(input.get_positions().unwrap().coordinates[0], Vector3::new(0.5, 0.5, 0.5));

        input.set_cell([4.0, 4.0, 4.0]).unwrap();
        assert_eq!(input.get_positions().unwrap().coordinates[0], Vector3::new(2.0, 2.0, 2.0));
    }
}
