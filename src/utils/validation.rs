//! Centralized validation and helper functions.

/// Maximum number of clades accepted by the topology generator.
///
/// Topology counts grow as (2N-3)!!: 8 clades already yield 135,135 topologies.
pub const MAX_CLADES: usize = 8;

/// Maximum number of data rows accepted from a single input table
pub const MAX_RECORDS: usize = 5_000_000;

/// Parent label of the root sentinel block
pub const ROOT_SENTINEL: &str = "ROOT";

/// Separator between parent and child labels in a block id
pub const BLOCK_ID_SEPARATOR: &str = "::";

/// Validate a clade or species identifier.
///
/// Identifiers end up in TSV columns, Newick labels and block ids, so they
/// must be non-empty, free of whitespace control characters, must not contain
/// the block id separator and must not collide with the root sentinel.
///
/// # Examples
///
/// ```
/// use clade_ocl::utils::validation::is_valid_identifier;
///
/// assert!(is_valid_identifier("Homo_sapiens"));
/// assert!(!is_valid_identifier("Homo sapiens\t"));
/// assert!(!is_valid_identifier("ROOT"));
/// assert!(!is_valid_identifier("A::B"));
/// ```
#[must_use]
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s != ROOT_SENTINEL
        && !s.contains(BLOCK_ID_SEPARATOR)
        && !s.chars().any(|c| c == '\t' || c == '\n' || c == '\r')
        && s.trim() == s
}

/// Compute a signature hash for a canonical topology string.
///
/// The signature is the MD5 digest of the canonical Newick text, giving a
/// stable identifier for a topology across runs and clade orderings.
#[must_use]
pub fn compute_signature(canonical: &str) -> String {
    if canonical.is_empty() {
        return String::new();
    }
    let digest = md5::compute(canonical.as_bytes());
    format!("{digest:x}")
}

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

/// Double factorial of an odd number, `n!! = n * (n-2) * ... * 1`.
///
/// Returns 1 for `n <= 1`.
#[must_use]
pub fn odd_double_factorial(n: u64) -> u64 {
    let mut result = 1u64;
    let mut k = n;
    while k > 1 {
        result = result.saturating_mul(k);
        k -= 2;
    }
    result
}

/// Median of a slice of finite values. Returns `None` for an empty slice.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean. Returns `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)] // counts are far below 2^52
    let n = values.len() as f64;
    Some(values.iter().sum::<f64>() / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("Vertebrata"));
        assert!(is_valid_identifier("Octopus_bimaculoides"));
        assert!(is_valid_identifier("Mollusca+Vertebrata"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier(" padded"));
        assert!(!is_valid_identifier("ROOT"));
        assert!(!is_valid_identifier("parent::child"));
        assert!(!is_valid_identifier("line\nbreak"));
    }

    #[test]
    fn test_compute_signature() {
        let sig = compute_signature("((A,B),C);");
        assert_eq!(sig.len(), 32);

        // Same input should give same output
        assert_eq!(sig, compute_signature("((A,B),C);"));
        assert_ne!(sig, compute_signature("((A,C),B);"));

        // Empty input gives empty string
        assert_eq!(compute_signature(""), "");
    }

    #[test]
    fn test_check_record_limit() {
        assert!(check_record_limit(100).is_none());
        assert!(check_record_limit(MAX_RECORDS - 1).is_none());
        assert!(check_record_limit(MAX_RECORDS).is_some());
    }

    #[test]
    fn test_odd_double_factorial() {
        assert_eq!(odd_double_factorial(0), 1);
        assert_eq!(odd_double_factorial(1), 1);
        assert_eq!(odd_double_factorial(3), 3);
        assert_eq!(odd_double_factorial(5), 15);
        assert_eq!(odd_double_factorial(7), 105);
        assert_eq!(odd_double_factorial(9), 945);
    }

    #[test]
    fn test_median_and_mean() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 0.0]), Some(0.5));
    }
}
