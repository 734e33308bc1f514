//! Typed query filters.
//!
//! Filters are equality/comparison predicates over named fields, combined by
//! conjunction. They render to the service-side where clause and can also be
//! evaluated locally, which is what the in-memory fake does — one filter
//! type, two interpreters, so tests exercise the same predicates production
//! queries use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::RawRecord;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "op")]
enum Clause {
    /// String equality: `field = 'value'`.
    Eq { field: String, value: String },
    /// Numeric lower bound: `field >= value`. Absent or null fields never
    /// satisfy the comparison.
    Ge { field: String, value: i64 },
}

/// A conjunction of field predicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// `field = 'value'`
    pub fn eq(field: &str, value: &str) -> Self {
        Filter {
            clauses: vec![Clause::Eq {
                field: field.to_string(),
                value: value.to_string(),
            }],
        }
    }

    /// `field >= value`
    pub fn ge(field: &str, value: i64) -> Self {
        Filter {
            clauses: vec![Clause::Ge {
                field: field.to_string(),
                value,
            }],
        }
    }

    /// Conjunction with another filter.
    pub fn and(mut self, other: Filter) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    /// Render the service-side where clause. String values are
    /// single-quote-escaped by doubling.
    pub fn to_where_clause(&self) -> String {
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|c| match c {
                Clause::Eq { field, value } => {
                    format!("{} = '{}'", field, value.replace('\'', "''"))
                }
                Clause::Ge { field, value } => format!("{} >= {}", field, value),
            })
            .collect();
        parts.join(" AND ")
    }

    /// Evaluate the filter against a record locally.
    pub fn matches(&self, record: &RawRecord) -> bool {
        self.clauses.iter().all(|c| match c {
            Clause::Eq { field, value } => match record.get(field) {
                Some(Value::String(s)) => s == value,
                Some(Value::Number(n)) => n.to_string() == *value,
                _ => false,
            },
            Clause::Ge { field, value } => match record.get(field) {
                Some(Value::Number(n)) => n.as_i64().is_some_and(|v| v >= *value),
                _ => false,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_renders_quoted() {
        let f = Filter::eq("RepairID", "2023-SNL71");
        assert_eq!(f.to_where_clause(), "RepairID = '2023-SNL71'");
    }

    #[test]
    fn test_eq_escapes_embedded_quote() {
        // The archived-status marker itself contains a quote.
        let f = Filter::eq("STATUS", "re-tv'd");
        assert_eq!(f.to_where_clause(), "STATUS = 're-tv''d'");
    }

    #[test]
    fn test_and_composition() {
        let f = Filter::eq("InspectionName", "I-1").and(Filter::ge("Grade", 0));
        assert_eq!(
            f.to_where_clause(),
            "InspectionName = 'I-1' AND Grade >= 0"
        );
    }

    #[test]
    fn test_matches_eq() {
        let rec = RawRecord::new().with("SEGMENT_ID", "S-9");
        assert!(Filter::eq("SEGMENT_ID", "S-9").matches(&rec));
        assert!(!Filter::eq("SEGMENT_ID", "S-8").matches(&rec));
        assert!(!Filter::eq("Absent", "S-9").matches(&rec));
    }

    #[test]
    fn test_matches_ge_skips_null_and_missing() {
        let graded = RawRecord::new().with("Grade", 2);
        let nulled = RawRecord::new().with("Grade", Value::Null);
        let absent = RawRecord::new();
        let f = Filter::ge("Grade", 0);
        assert!(f.matches(&graded));
        assert!(!f.matches(&nulled));
        assert!(!f.matches(&absent));
    }

    #[test]
    fn test_matches_conjunction() {
        let rec = RawRecord::new().with("SEGMENT_ID", "S-9").with("STATUS", "re-tv'd");
        let f = Filter::eq("SEGMENT_ID", "S-9").and(Filter::eq("STATUS", "re-tv'd"));
        assert!(f.matches(&rec));
        let f = Filter::eq("SEGMENT_ID", "S-9").and(Filter::eq("STATUS", "Active"));
        assert!(!f.matches(&rec));
    }
}
