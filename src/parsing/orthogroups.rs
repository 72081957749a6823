use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::core::clade::CladeAssignment;
use crate::core::species_set::SpeciesSet;
use crate::core::types::OrthogroupId;
use crate::ocl::analyzer::MembershipError;
use crate::parsing::{read_text, split_fields, ParseError};
use crate::utils::validation::check_record_limit;

/// An orthogroup and the species it occurs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrthogroupMembership {
    pub id: OrthogroupId,
    pub species: BTreeSet<String>,
}

impl OrthogroupMembership {
    pub fn new<I, S>(id: impl Into<String>, species: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: OrthogroupId::new(id),
            species: species.into_iter().map(Into::into).collect(),
        }
    }

    /// Map member species onto master-list indices.
    ///
    /// # Errors
    ///
    /// Returns `MembershipError::EmptySpeciesSet` if the orthogroup has no
    /// members, or `MembershipError::UnknownSpecies` for the first member not
    /// in the master species list.
    pub fn resolve(&self, assignment: &CladeAssignment) -> Result<SpeciesSet, MembershipError> {
        if self.species.is_empty() {
            return Err(MembershipError::EmptySpeciesSet(self.id.clone()));
        }
        let mut set = assignment.empty_set();
        for name in &self.species {
            let index = assignment
                .species_index(name)
                .ok_or_else(|| MembershipError::UnknownSpecies {
                    orthogroup: self.id.clone(),
                    species: name.clone(),
                })?;
            set.insert(index);
        }
        Ok(set)
    }
}

/// Species id for an orthogroup member.
///
/// GIGANTIC sequence identifiers carry the phyloname after `-n_`
/// (`Kingdom_Phylum_Class_Order_Family_Genus_species`); the species is the
/// genus plus everything after it. Any other member is taken as a species id.
#[must_use]
pub fn species_of_member(member: &str) -> &str {
    let Some(pos) = member.rfind("-n_") else {
        return member;
    };
    let phyloname = &member[pos + 3..];
    let parts: Vec<&str> = phyloname.split('_').collect();
    let skip = if parts.len() >= 7 {
        5
    } else if parts.len() >= 2 {
        parts.len() - 2
    } else {
        return phyloname;
    };
    // Byte offset of the genus within the phyloname
    let offset: usize = parts[..skip].iter().map(|p| p.len() + 1).sum();
    &phyloname[offset..]
}

/// Parse an orthogroup membership file (optionally gzipped)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_orthogroup_file(path: &Path) -> Result<Vec<OrthogroupMembership>, ParseError> {
    let content = read_text(path)?;
    parse_orthogroup_text(&content)
}

/// Parse orthogroup text: an id followed by member species or sequence ids.
///
/// Members may be spread over tab separated columns, or given as a comma
/// separated list in one column. Rows repeating an id are merged. The result
/// is sorted by orthogroup id.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for a row without an id, or
/// `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_orthogroup_text(text: &str) -> Result<Vec<OrthogroupMembership>, ParseError> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
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
            if first == "orthogroup" || first == "og_id" || first == "og" {
                continue;
            }
        }

        let line_num = i + 1;
        let id = fields[0];
        if id.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has no orthogroup id"
            )));
        }

        let members = fields[1..]
            .iter()
            .flat_map(|f| f.split(','))
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| species_of_member(m).to_string());

        if let Some(existing) = groups.get_mut(id) {
            tracing::warn!(orthogroup = id, line = line_num, "Duplicate orthogroup row merged");
            existing.extend(members);
            continue;
        }

        if check_record_limit(groups.len()).is_some() {
            return Err(ParseError::TooManyRecords(groups.len()));
        }
        groups.insert(id.to_string(), members.collect());
    }

    Ok(groups
        .into_iter()
        .map(|(id, species)| OrthogroupMembership {
            id: OrthogroupId::new(id),
            species,
        })
        .collect())
}
