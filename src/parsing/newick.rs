//! Parser for Newick tree text.
//!
//! Supports quoted labels (`'Homo sapiens'`, with `''` as an escaped quote),
//! internal node labels, branch lengths and bracketed comments. The parser is
//! a single pass over the characters with an explicit stack of open nodes.

use std::path::Path;

use crate::core::tree::{NodeIndex, SpeciesTree};
use crate::parsing::{read_text, ParseError};

/// Parse a Newick file (plain or gzipped) into a [`SpeciesTree`]
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::InvalidFormat` if the text is not a single Newick tree.
pub fn parse_newick_file(path: &Path) -> Result<SpeciesTree, ParseError> {
    let text = read_text(path)?;
    parse_newick(&text)
}

fn invalid(message: impl Into<String>) -> ParseError {
    ParseError::InvalidFormat(message.into())
}

/// Parse Newick text into a [`SpeciesTree`]
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for unbalanced parentheses, empty
/// nodes, malformed branch lengths, unterminated quotes or comments, or more
/// than one tree.
pub fn parse_newick(text: &str) -> Result<SpeciesTree, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0;
    let mut tree: Option<SpeciesTree> = None;
    let mut open: Vec<NodeIndex> = Vec::new();
    // Node just completed; a label or branch length may still follow it
    let mut last: Option<NodeIndex> = None;
    let mut terminated = false;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            c if c.is_whitespace() => pos += 1,
            '[' => pos = skip_comment(&chars, pos)?,
            '(' => {
                if last.is_some() {
                    return Err(invalid(format!("Missing ',' before '(' at offset {pos}")));
                }
                let index = if let Some(t) = tree.as_mut() {
                    let parent = *open
                        .last()
                        .ok_or_else(|| invalid("More than one root node"))?;
                    t.add_child(parent, None, None)
                } else {
                    tree = Some(SpeciesTree::new(None, None));
                    0
                };
                open.push(index);
                pos += 1;
            }
            ',' => {
                if open.is_empty() {
                    return Err(invalid(format!("',' outside parentheses at offset {pos}")));
                }
                if last.is_none() {
                    return Err(invalid(format!("Empty node before ',' at offset {pos}")));
                }
                last = None;
                pos += 1;
            }
            ')' => {
                if last.is_none() {
                    return Err(invalid(format!("Empty node before ')' at offset {pos}")));
                }
                let index = open
                    .pop()
                    .ok_or_else(|| invalid(format!("Unbalanced ')' at offset {pos}")))?;
                last = Some(index);
                pos += 1;
            }
            ':' => {
                let (index, t) = match (last, tree.as_mut()) {
                    (Some(index), Some(t)) => (index, t),
                    _ => return Err(invalid(format!("Branch length without a node at offset {pos}"))),
                };
                let (token, next) = read_unquoted(&chars, pos + 1);
                let length: f64 = token
                    .parse()
                    .map_err(|_| invalid(format!("Invalid branch length '{token}'")))?;
                t.node_mut(index).branch_length = Some(length);
                pos = next;
            }
            ';' => {
                terminated = true;
                pos += 1;
                break;
            }
            _ => {
                let (label, next) = if c == '\'' {
                    read_quoted(&chars, pos)?
                } else {
                    read_unquoted(&chars, pos)
                };
                if next == pos {
                    return Err(invalid(format!("Unexpected '{c}' at offset {pos}")));
                }
                pos = next;

                if let Some(index) = last {
                    let node = tree
                        .as_mut()
                        .ok_or_else(|| invalid("Label without a tree"))?
                        .node_mut(index);
                    if node.label.is_some() {
                        return Err(invalid(format!("Node has two labels: '{label}'")));
                    }
                    node.label = Some(label);
                } else if let Some(t) = tree.as_mut() {
                    let parent = *open
                        .last()
                        .ok_or_else(|| invalid("More than one root node"))?;
                    last = Some(t.add_child(parent, Some(label), None));
                } else {
                    tree = Some(SpeciesTree::new(Some(label), None));
                    last = Some(0);
                }
            }
        }
    }

    if !open.is_empty() {
        return Err(invalid("Unbalanced '(': tree is not closed"));
    }
    if terminated && chars[pos..].iter().any(|c| !c.is_whitespace()) {
        return Err(invalid("Expected a single tree, found text after ';'"));
    }

    tree.ok_or_else(|| invalid("No tree found"))
}

/// Read an unquoted label or number starting at `start`
fn read_unquoted(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() {
        let c = chars[end];
        if c.is_whitespace() || "()[],:;'".contains(c) {
            break;
        }
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

/// Read a single-quoted label starting at the opening quote
fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize), ParseError> {
    let mut label = String::new();
    let mut pos = start + 1;
    while pos < chars.len() {
        if chars[pos] == '\'' {
            if chars.get(pos + 1) == Some(&'\'') {
                label.push('\'');
                pos += 2;
                continue;
            }
            return Ok((label, pos + 1));
        }
        label.push(chars[pos]);
        pos += 1;
    }
    Err(invalid("Unterminated quoted label"))
}

fn skip_comment(chars: &[char], start: usize) -> Result<usize, ParseError> {
    chars[start..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| start + offset + 1)
        .ok_or_else(|| invalid("Unterminated '[' comment"))
}
