use std::path::Path;

use crate::core::clade::AssignmentRow;
use crate::core::types::CladeId;
use crate::parsing::{read_text, split_fields, ParseError};
use crate::utils::validation::check_record_limit;

/// Parse a species-to-clade assignment file (TSV or CSV, optionally gzipped)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_assignment_file(path: &Path) -> Result<Vec<AssignmentRow>, ParseError> {
    let content = read_text(path)?;
    parse_assignment_text(&content)
}

/// Parse assignment text with columns: species, clade
///
/// Fields are tab separated, or comma separated when a line has no tab.
/// Extra columns are ignored.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 2 fields or
/// no rows are found, or `ParseError::TooManyRecords` if the limit is
/// exceeded.
pub fn parse_assignment_text(text: &str) -> Result<Vec<AssignmentRow>, ParseError> {
    let mut rows = Vec::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields = split_fields(line);

        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if first == "species" || first == "genus_species" || first == "taxon" {
                continue;
            }
        }

        let line_num = i + 1;

        if fields.len() < 2 || fields[0].is_empty() || fields[1].is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} needs a species and a clade"
            )));
        }

        if check_record_limit(rows.len()).is_some() {
            return Err(ParseError::TooManyRecords(rows.len()));
        }

        rows.push(AssignmentRow {
            species: fields[0].to_string(),
            clade: CladeId::new(fields[1]),
            line: line_num,
        });
    }

    if rows.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No clade assignments found".to_string(),
        ));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment_text() {
        let tsv = "species\tclade\nHomo_sapiens\tVertebrata\nOctopus_bimaculoides\tMollusca\n";
        let rows = parse_assignment_text(tsv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].species, "Homo_sapiens");
        assert_eq!(rows[0].clade, CladeId::new("Vertebrata"));
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_parse_csv_without_header() {
        let csv = "Homo_sapiens,Vertebrata\nCrassostrea_gigas,Outgroup,extra\n";
        let rows = parse_assignment_text(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].clade.as_str(), "Outgroup");
    }

    #[test]
    fn test_comments_before_header() {
        let tsv = "# clade map\n\ngenus_species\tclade\nHomo_sapiens\tVertebrata\n";
        let rows = parse_assignment_text(tsv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 4);
    }

    #[test]
    fn test_missing_clade_column() {
        let err = parse_assignment_text("Homo_sapiens\tVertebrata\nOctopus_bimaculoides\n")
            .unwrap_err();
        match err {
            ParseError::InvalidFormat(msg) => assert!(msg.contains("Line 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_table() {
        assert!(matches!(
            parse_assignment_text("# nothing here\n"),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
