//! Backend-neutral record shapes traded through the Persistence Port
//!
//! Records are flat maps of named JSON values. Each backend translates them
//! into its native representation (rows, documents, in-memory entries); the
//! shapes here are the only form the domain ever sees.

use serde_json::Value;

use super::ids::EntityId;

/// The field payload of a record, keyed by canonical field name
pub type FieldMap = serde_json::Map<String, Value>;

/// A persisted record together with its backend-assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Backend-assigned identifier, already normalized
    pub id: EntityId,
    /// The stored fields
    pub fields: FieldMap,
}

impl StoredRecord {
    /// Look up a field value
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a field expected to hold a string
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// A single filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum FieldMatch {
    /// Exact value equality
    Equals(Value),
    /// Case-insensitive substring containment (string fields only)
    Contains(String),
}

/// Structured query filter: ANDed clauses of equality and substring matches
///
/// Deliberately not a query language. Every backend can satisfy this without
/// a planner: the memory store walks entries, the relational store compiles
/// clauses to SQL predicates, the document store compiles substring clauses
/// to case-insensitive regexes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    clauses: Vec<(String, FieldMatch)>,
}

impl RecordFilter {
    /// An empty filter, matching every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value` exactly
    pub fn equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), FieldMatch::Equals(value.into())));
        self
    }

    /// Require `field` to contain `needle`, case-insensitively
    pub fn contains(mut self, field: &str, needle: impl Into<String>) -> Self {
        self.clauses
            .push((field.to_string(), FieldMatch::Contains(needle.into())));
        self
    }

    /// The clauses in insertion order
    pub fn clauses(&self) -> &[(String, FieldMatch)] {
        &self.clauses
    }

    /// Whether the filter constrains anything at all
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Reference matching semantics over a field map
    ///
    /// This is the portable definition of the filter: equality is JSON value
    /// equality, containment is Unicode-lowercase substring containment on
    /// string fields (a containment clause never matches a non-string).
    /// Backends that do not match in memory must agree with this function.
    pub fn matches(&self, fields: &FieldMap) -> bool {
        self.clauses.iter().all(|(name, clause)| match clause {
            FieldMatch::Equals(expected) => fields.get(name) == Some(expected),
            FieldMatch::Contains(needle) => fields
                .get(name)
                .and_then(Value::as_str)
                .is_some_and(|hay| hay.to_lowercase().contains(&needle.to_lowercase())),
        })
    }
}

/// A partial update: fields not mentioned are left untouched
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    fields: FieldMap,
}

impl RecordPatch {
    /// An empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// The fields this patch writes
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Consume the patch, yielding its fields
    pub fn into_fields(self) -> FieldMap {
        self.fields
    }
}

/// Outcome of a compare-and-set update
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
    /// The guard held and the patch was applied; the updated record
    Updated(StoredRecord),
    /// No record with the given id exists
    Missing,
    /// The record exists but the guard did not hold; the current record
    GuardFailed(StoredRecord),
}

/// Static description of a collection the port can address
#[derive(Debug)]
pub struct CollectionSpec {
    /// Collection (or table) name
    pub name: &'static str,
    /// Fields whose values must be unique across the collection;
    /// `create` signals [`super::StoreError::Conflict`] on violation
    pub unique_fields: &'static [&'static str],
}

/// The collections Pet Resgate persists
pub mod collections {
    use super::CollectionSpec;

    /// Tutor accounts; email addresses are unique
    pub static TUTORS: CollectionSpec = CollectionSpec {
        name: "tutors",
        unique_fields: &["email"],
    };

    /// Lost-pet records
    pub static PETS: CollectionSpec = CollectionSpec {
        name: "pets",
        unique_fields: &[],
    };
}
