//! ULID-based identifier generation with prefixes.
//!
//! Identifiers in reqforge follow the pattern: `prefix_ulid`
//! For example: `bas_01HQXYZ...` for baselines.

use ulid::Ulid;

/// Known identifier prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    Project,
    Baseline,
    Snapshot,
}

impl IdPrefix {
    /// Get the string prefix for this identifier type.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Project => "prj",
            IdPrefix::Baseline => "bas",
            IdPrefix::Snapshot => "snp",
        }
    }

    /// Parse a prefix from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prj" => Some(IdPrefix::Project),
            "bas" => Some(IdPrefix::Baseline),
            "snp" => Some(IdPrefix::Snapshot),
            _ => None,
        }
    }
}

/// Identifier generation and parsing utilities.
///
/// All reqforge identifiers ascend chronologically (newer = larger), so
/// lexicographic order is creation order.
pub struct Identifier;

impl Identifier {
    /// Generate a new ascending identifier.
    pub fn generate(prefix: IdPrefix) -> String {
        let ulid = Ulid::new();
        format!("{}_{}", prefix.as_str(), ulid.to_string().to_lowercase())
    }

    /// Parse an identifier into its prefix and ULID parts.
    pub fn parse(id: &str) -> Option<(IdPrefix, Ulid)> {
        let (prefix, rest) = id.split_once('_')?;
        let prefix = IdPrefix::parse(prefix)?;
        let ulid = Ulid::from_string(rest).ok()?;
        Some((prefix, ulid))
    }

    /// Check if an identifier has the expected prefix.
    pub fn has_prefix(id: &str, prefix: IdPrefix) -> bool {
        id.starts_with(prefix.as_str()) && id.chars().nth(prefix.as_str().len()) == Some('_')
    }

    /// Generate a project ID.
    pub fn project() -> String {
        Self::generate(IdPrefix::Project)
    }

    /// Generate a baseline ID.
    pub fn baseline() -> String {
        Self::generate(IdPrefix::Baseline)
    }

    /// Generate a version snapshot ID.
    pub fn snapshot() -> String {
        Self::generate(IdPrefix::Snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix() {
        assert!(Identifier::project().starts_with("prj_"));
        assert!(Identifier::baseline().starts_with("bas_"));
        assert!(Identifier::snapshot().starts_with("snp_"));
    }

    #[test]
    fn ids_have_fixed_length() {
        // "bas_" (4) + ULID (26)
        assert_eq!(Identifier::baseline().len(), 30);
    }

    #[test]
    fn ids_ascend_over_time() {
        let a = Identifier::baseline();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = Identifier::baseline();
        assert!(a < b, "later IDs must sort after earlier ones");
    }

    #[test]
    fn parse_round_trips() {
        let id = Identifier::snapshot();
        let (prefix, _) = Identifier::parse(&id).unwrap();
        assert_eq!(prefix, IdPrefix::Snapshot);
    }

    #[test]
    fn parse_rejects_unknown_prefix() {
        assert!(Identifier::parse("xyz_01HQXYZABCDEF0123456789ABC").is_none());
    }

    #[test]
    fn parse_rejects_missing_underscore() {
        assert!(Identifier::parse("bas01HQXYZ").is_none());
    }

    #[test]
    fn parse_rejects_invalid_ulid() {
        assert!(Identifier::parse("bas_notaulid").is_none());
    }

    #[test]
    fn has_prefix_requires_underscore() {
        assert!(Identifier::has_prefix(&Identifier::baseline(), IdPrefix::Baseline));
        assert!(!Identifier::has_prefix("bas123", IdPrefix::Baseline));
        assert!(!Identifier::has_prefix(&Identifier::baseline(), IdPrefix::Snapshot));
    }
}
