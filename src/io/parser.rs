//! Tokenizer for CASTEP-style `.cell` / `.param` text.
//!
//! Parsing runs in three stages over the raw lines:
//! 1. strip comments (`#` or `!`, leading or trailing) and blank lines,
//! 2. pull out `%BLOCK name ... %ENDBLOCK name` regions,
//! 3. split the remaining lines into `key value` pairs.
//!
//! Keys and block names are lowercased; values and block contents keep their case.

use crate::core::block::Block;
use crate::core::error::{InputError, Result};
use crate::core::value::Value;
use crate::io::convert::convert_type;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

const COMMENT_SYMBOLS: [char; 2] = ['#', '!'];

lazy_static! {
    static ref BLOCK_START: Regex = Regex::new(r"(?i)^%block\s+(\w+)").unwrap();
    static ref BLOCK_FINISH: Regex = Regex::new(r"(?i)^%endblock\s+(\w+)").unwrap();
    static ref KW_SPLIT: Regex = Regex::new(r"[ \t:=]+").unwrap();
}

/// Everything one parse pass produces, before it is merged into a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub keywords: IndexMap<String, String>,
    pub blocks: IndexMap<String, Block>,
    pub comments: Vec<String>,
}

impl ParseResult {
    /// Keywords first, then blocks, each in input order.
    /// With `convert` the keyword strings go through [`convert_type`].
    pub fn into_entries(self, convert: bool) -> impl Iterator<Item = (String, Value)> {
        let keywords = self.keywords.into_iter().map(move |(key, raw)| {
            let value = if convert { convert_type(&raw) } else { Value::Str(raw) };
            (key, value)
        });
        let blocks = self
            .blocks
            .into_iter()
            .map(|(name, block)| (name, Value::Block(block)));
        keywords.chain(blocks)
    }
}

/// Removes comments and blank lines.
/// Returns the cleaned lines and the comment texts, both in input order.
pub fn clean_up_lines<S: AsRef<str>>(lines: &[S]) -> (Vec<String>, Vec<String>) {
    let mut cleaned = Vec::new();
    let mut comments = Vec::new();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(COMMENT_SYMBOLS) {
            comments.push(line[1..].trim().to_string());
            continue;
        }

        let code = match line.find(COMMENT_SYMBOLS) {
            Some(pos) => {
                comments.push(line[pos + 1..].trim().to_string());
                line[..pos].trim()
            }
            None => line,
        };

        if !code.is_empty() {
            cleaned.push(code.to_string());
        }
    }

    (cleaned, comments)
}

/// Splits cleaned lines into named blocks and the remaining keyword lines.
pub fn split_blocks(lines: &[String]) -> Result<(IndexMap<String, Block>, Vec<String>)> {
    let mut blocks: IndexMap<String, Block> = IndexMap::new();
    let mut kw_lines = Vec::new();
    let mut open: Option<(String, Block)> = None;

    for line in lines {
        if let Some(caps) = BLOCK_START.captures(line) {
            let name = caps[1].to_lowercase();
            if let Some((current, _)) = &open {
                return Err(InputError::format(format!(
                    "block {} opened while block {} is still open",
                    name, current
                )));
            }
            open = Some((name, Block::new()));
            continue;
        }

        if let Some(caps) = BLOCK_FINISH.captures(line) {
            let end_name = caps[1].to_lowercase();
            match open.take() {
                None => {
                    return Err(InputError::format(format!(
                        "end of block {} found without a matching start",
                        end_name
                    )))
                }
                Some((start_name, _)) if start_name != end_name => {
                    return Err(InputError::format(format!(
                        "mismatched block names, start: {} finish: {}",
                        start_name, end_name
                    )))
                }
                Some((name, block)) => {
                    blocks.insert(name, block);
                }
            }
            continue;
        }

        match open.as_mut() {
            Some((_, block)) => block.push(line.clone()),
            None => kw_lines.push(line.clone()),
        }
    }

    if let Some((name, _)) = open {
        return Err(InputError::format(format!("end of block {} not detected", name)));
    }

    Ok((blocks, kw_lines))
}

/// Splits each line on its first run of spaces, tabs, `:` or `=`.
/// A line without a separator is a flag and maps to an empty value.
pub fn parse_keywords(lines: &[String]) -> Result<IndexMap<String, String>> {
    let mut keywords = IndexMap::new();

    for line in lines {
        let mut parts = KW_SPLIT.splitn(line, 2);
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();

        if key.is_empty() {
            return Err(InputError::format(format!(
                "cannot parse into key-value pair: {}",
                line
            )));
        }

        keywords.insert(key.to_lowercase(), value.to_string());
    }

    Ok(keywords)
}

/// Parser over a borrowed or owned list of raw lines.
pub struct Parser<S> {
    lines: Vec<S>,
}

impl<S: AsRef<str>> Parser<S> {
    pub fn new<I: IntoIterator<Item = S>>(lines: I) -> Self {
        Self {
            lines: lines.into_iter().collect(),
        }
    }

    /// The raw input lines.
    pub fn content(&self) -> &[S] {
        &self.lines
    }

    /// Runs all three stages. Any format error aborts the whole pass.
    pub fn parse(&self) -> Result<ParseResult> {
        let (cleaned, comments) = clean_up_lines(&self.lines);
        let (blocks, kw_lines) = split_blocks(&cleaned)?;
        let keywords = parse_keywords(&kw_lines)?;

        Ok(ParseResult {
            keywords,
            blocks,
            comments,
        })
    }
}
