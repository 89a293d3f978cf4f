use crate::core::error::{InputError, Result};
use crate::core::value::Value;
use crate::io::parser::Parser;
use crate::io::writer;
use indexmap::IndexMap;
use std::fs;
use std::path::Path;

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

/// Ordered key/value store for CASTEP-style inputs (`.cell`, `.param`, `.odi`, ...).
///
/// Keys are case-insensitive: they are lowercased on every insert and lookup.
/// Insertion order is the output order.
///
/// Besides the entries the document carries:
/// * `header`: lines written before everything else as comments,
/// * `units`: a per-key unit suffix (`eV`, `ang`, ...) written with the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CastepInput {
    entries: IndexMap<String, Value>,
    header: Vec<String>,
    units: IndexMap<String, String>,
}

impl CastepInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under the lowercased `key`, keeping the position of an existing key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.entries.insert(normalize(key), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&normalize(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(&normalize(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize(key))
    }

    /// Removes a key; the remaining keys keep their order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let key = normalize(key);
        self.units.shift_remove(&key);
        self.entries.shift_remove(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Vec<String> {
        &mut self.header
    }

    pub fn set_unit(&mut self, key: &str, unit: impl Into<String>) {
        self.units.insert(normalize(key), unit.into());
    }

    pub fn unit(&self, key: &str) -> Option<&str> {
        self.units.get(&normalize(key)).map(String::as_str)
    }

    pub fn units(&self) -> &IndexMap<String, String> {
        &self.units
    }

    /// Lines to be written out: header, then entries.
    pub fn render(&self) -> Vec<String> {
        writer::render(self)
    }

    pub fn file_lines(&self) -> Vec<String> {
        self.render()
    }

    pub fn to_text(&self) -> String {
        writer::to_text(self)
    }

    /// Parses `lines` and merges the result into this document.
    ///
    /// With `convert` every keyword value is coerced to its most specific type;
    /// otherwise keyword values stay strings. Blocks are always [`Value::Block`].
    /// On a format error nothing is merged. Returns the comments found.
    pub fn load<S: AsRef<str>>(&mut self, lines: &[S], convert: bool) -> Result<Vec<String>> {
        let mut parsed = Parser::new(lines).parse()?;
        let comments = std::mem::take(&mut parsed.comments);

        for (key, value) in parsed.into_entries(convert) {
            self.set(&key, value);
        }
        Ok(comments)
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S], convert: bool) -> Result<Self> {
        let mut input = Self::new();
        input.load(lines, convert)?;
        Ok(input)
    }

    /// Reads a file and merges it in. `plain` keeps every keyword value as a string.
    pub fn load_file(&mut self, path: impl AsRef<Path>, plain: bool) -> Result<Vec<String>> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lines: Vec<&str> = contents.lines().collect();
        self.load(&lines, !plain)
    }

    pub fn from_file(path: impl AsRef<Path>, plain: bool) -> Result<Self> {
        let mut input = Self::new();
        input.load_file(path, plain)?;
        Ok(input)
    }

    /// Writes [`CastepInput::to_text`] to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_text()).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(path)
    }
}
