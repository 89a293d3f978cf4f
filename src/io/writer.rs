use crate::core::document::CastepInput;
use crate::core::value::Value;

/// Width the keyword column is padded to.
const KEY_WIDTH: usize = 20;

fn header_line(line: &str) -> String {
    if line.starts_with('#') {
        line.to_string()
    } else {
        format!("# {}", line)
    }
}

/// Renders the document: header comments first, then every entry in insertion order.
pub fn render(input: &CastepInput) -> Vec<String> {
    let mut lines: Vec<String> = input.header().iter().map(|h| header_line(h)).collect();

    for (key, value) in input.iter() {
        let unit = input.unit(key);

        match value {
            Value::Block(block) => {
                lines.push(format!("%BLOCK {}", key));
                if let Some(unit) = unit {
                    lines.push(unit.to_string());
                }
                lines.extend(block.iter().cloned());
                lines.push(format!("%ENDBLOCK {}", key));
            }
            value => {
                let mut line = if value.is_empty() {
                    key.to_string()
                } else {
                    format!("{:<width$}: {}", key, value, width = KEY_WIDTH)
                };
                if let Some(unit) = unit {
                    line.push(' ');
                    line.push_str(unit);
                }
                lines.push(line);
            }
        }
    }

    lines
}

/// Rendered lines joined by newlines.
pub fn to_text(input: &CastepInput) -> String {
    render(input).join("\n")
}
