use std::fmt;
use std::ops::{Deref, DerefMut};

/// The body of a `%BLOCK name ... %ENDBLOCK name` region: raw lines, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block(Vec<String>);

impl Block {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn into_lines(self) -> Vec<String> {
        self.0
    }

    /// Returns a copy with every line trimmed and blank lines removed.
    pub fn compact(&self) -> Block {
        self.0
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Same as [`Block::compact`], applied to this block.
    pub fn compact_in_place(&mut self) -> &mut Self {
        let compacted = self.compact();
        *self = compacted;
        self
    }
}

impl Deref for Block {
    type Target = Vec<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Block {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<String>> for Block {
    fn from(lines: Vec<String>) -> Self {
        Self(lines)
    }
}

impl From<Vec<&str>> for Block {
    fn from(lines: Vec<&str>) -> Self {
        lines.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Block {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("\n"))
    }
}
