use std::collections::HashMap;

use serde_json::Value;

/// The complete, closed set of predicate operators. Adding one is a breaking
/// change — evaluation dispatches on this tag and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    Ne(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Contains(Value),
    NotContains(Value),
    IContains(String),
    StartsWith(String),
    EndsWith(String),
    IStartsWith(String),
    IEndsWith(String),
    Regex(String),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Exists(bool),
    HasAny(Vec<Value>),
    HasAll(Vec<Value>),
}

impl Predicate {
    /// The operator keys accepted in a predicate object, kept in one place
    /// so the compiler's "reject unknown operators" check and this list
    /// never drift apart.
    pub const OPERATORS: &'static [&'static str] = &[
        "eq",
        "ne",
        "in",
        "not_in",
        "contains",
        "not_contains",
        "i_contains",
        "starts_with",
        "ends_with",
        "i_starts_with",
        "i_ends_with",
        "regex",
        "gt",
        "gte",
        "lt",
        "lte",
        "exists",
        "has_any",
        "has_all",
    ];
}

/// `field -> Predicate` match used by every assertion's `where` clause.
pub type WhereClause = HashMap<String, Predicate>;

/// One `{from?, to?}` entry of an `expected_changes` map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChange {
    pub from: Option<Predicate>,
    pub to: Option<Predicate>,
}

/// Either an exact count or an inclusive `{min?, max?}` range.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedCount {
    Exact(i64),
    Range {
        min: Option<i64>,
        max: Option<i64>,
    },
}

impl ExpectedCount {
    #[must_use]
    pub const fn satisfied_by(&self, n: i64) -> bool {
        match self {
            Self::Exact(expected) => n == *expected,
            Self::Range { min, max } => {
                (match min {
                    Some(m) => n >= *m,
                    None => true,
                }) && (match max {
                    Some(m) => n <= *m,
                    None => true,
                })
            }
        }
    }
}

/// One clause of a compiled spec, naming the diff bucket it reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    Added {
        entity: String,
        where_: WhereClause,
        ignore: Vec<String>,
        expected_count: Option<ExpectedCount>,
    },
    Removed {
        entity: String,
        where_: WhereClause,
        ignore: Vec<String>,
        expected_count: Option<ExpectedCount>,
    },
    Changed {
        entity: String,
        where_: WhereClause,
        expected_changes: HashMap<String, FieldChange>,
        ignore: Vec<String>,
        expected_count: Option<ExpectedCount>,
    },
    Unchanged {
        entity: String,
        where_: WhereClause,
        expected_count: Option<ExpectedCount>,
    },
}

impl Assertion {
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::Added { entity, .. }
            | Self::Removed { entity, .. }
            | Self::Changed { entity, .. }
            | Self::Unchanged { entity, .. } => entity,
        }
    }
}

/// `field -> [excluded columns]` for one entity, plus the spec-wide set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgnoreFields {
    pub global: Vec<String>,
    pub per_entity: HashMap<String, Vec<String>>,
}

impl IgnoreFields {
    /// Union of `global`, `per_entity[entity]`, and the assertion's own
    /// `ignore` list, as the evaluator needs it per `(entity, assertion)` pair.
    #[must_use]
    pub fn resolve(&self, entity: &str, assertion_ignore: &[String]) -> std::collections::HashSet<String> {
        let mut set: std::collections::HashSet<String> = self.global.iter().cloned().collect();
        if let Some(extra) = self.per_entity.get(entity) {
            set.extend(extra.iter().cloned());
        }
        set.extend(assertion_ignore.iter().cloned());
        set
    }
}

/// Canonical, already-validated assertion spec. Evaluation never re-parses
/// JSON; it only dispatches on these variants.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSpec {
    pub version: String,
    pub strict: bool,
    pub ignore_fields: IgnoreFields,
    pub assertions: Vec<Assertion>,
}
