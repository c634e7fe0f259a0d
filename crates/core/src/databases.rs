//! System database exclusion.
//!
//! Discovery returns every database on an instance; the system-owned ones
//! listed in [`RESTRICTED_DATABASES`] are never maintained.

/// Databases that are always skipped. Matching is exact and case-sensitive.
pub const RESTRICTED_DATABASES: &[&str] = &["master", "model", "tempdb", "msdb", "rdsadmin"];

/// Whether `name` is one of the restricted system databases.
pub fn is_restricted(name: &str) -> bool {
    RESTRICTED_DATABASES.contains(&name)
}

/// Drop restricted databases, keeping the order of the rest.
pub fn filter_restricted<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    names.into_iter().filter(|name| !is_restricted(name)).collect()
}
