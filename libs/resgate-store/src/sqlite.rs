//! Relational Store - SQLite realization of the persistence port
//!
//! One flat table per collection, auto-increment integer primary keys, and
//! a real foreign key from `pets.owner_id` to `tutors.id`. Nested values
//! (a tutor's pet-id list) are flattened into a JSON text column. Substring
//! filters compile to a registered `contains_ci` SQL function rather than
//! `LOWER(..) LIKE ..`, because SQLite's built-in folding is ASCII-only and
//! the port contract requires the same Unicode case-insensitivity as the
//! other backends.

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use resgate_domain::storage::{
    CasOutcome, CollectionSpec, EntityId, FieldMap, FieldMatch, PersistencePort, RecordFilter,
    RecordPatch, StoreError, StoreResult, StoredRecord,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tutors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    credential TEXT NOT NULL,
    registered_pet_ids TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS pets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    species TEXT NOT NULL,
    breed TEXT NOT NULL DEFAULT '',
    sex TEXT NOT NULL DEFAULT '',
    approximate_age TEXT NOT NULL DEFAULT '',
    color TEXT NOT NULL DEFAULT '',
    last_seen_location TEXT NOT NULL,
    last_seen_date TEXT NOT NULL,
    owner_comment TEXT NOT NULL DEFAULT '',
    photo_ref TEXT NOT NULL DEFAULT 'none',
    owner_id INTEGER NOT NULL REFERENCES tutors(id),
    status TEXT NOT NULL,
    registered_at TEXT NOT NULL,
    reunited_at TEXT
);
";

/// How a record field is stored in its column
#[derive(Clone, Copy)]
enum ColumnKind {
    /// TEXT NOT NULL
    Text,
    /// TEXT, null allowed
    NullableText,
    /// INTEGER foreign key; the record side carries the id as an opaque string
    OwnerRef,
    /// Ordered id list, flattened to a JSON text blob
    IdList,
}

struct TableSpec {
    name: &'static str,
    columns: &'static [(&'static str, ColumnKind)],
}

impl TableSpec {
    fn column_kind(&self, field: &str) -> StoreResult<ColumnKind> {
        self.columns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                StoreError::malformed(self.name, format!("no column for field '{field}'"))
            })
    }

    fn select_sql(&self) -> String {
        let columns: Vec<&str> = self.columns.iter().map(|(name, _)| *name).collect();
        format!("SELECT id, {} FROM {}", columns.join(", "), self.name)
    }
}

static TUTORS_TABLE: TableSpec = TableSpec {
    name: "tutors",
    columns: &[
        ("name", ColumnKind::Text),
        ("email", ColumnKind::Text),
        ("credential", ColumnKind::Text),
        ("registered_pet_ids", ColumnKind::IdList),
    ],
};

static PETS_TABLE: TableSpec = TableSpec {
    name: "pets",
    columns: &[
        ("name", ColumnKind::Text),
        ("species", ColumnKind::Text),
        ("breed", ColumnKind::Text),
        ("sex", ColumnKind::Text),
        ("approximate_age", ColumnKind::Text),
        ("color", ColumnKind::Text),
        ("last_seen_location", ColumnKind::Text),
        ("last_seen_date", ColumnKind::Text),
        ("owner_comment", ColumnKind::Text),
        ("photo_ref", ColumnKind::Text),
        ("owner_id", ColumnKind::OwnerRef),
        ("status", ColumnKind::Text),
        ("registered_at", ColumnKind::Text),
        ("reunited_at", ColumnKind::NullableText),
    ],
};

fn table_for(collection: &CollectionSpec) -> StoreResult<&'static TableSpec> {
    match collection.name {
        "tutors" => Ok(&TUTORS_TABLE),
        "pets" => Ok(&PETS_TABLE),
        other => Err(StoreError::UnknownCollection(other.to_string())),
    }
}

/// SQLite implementation of the persistence port
///
/// The connection sits behind a mutex; every port call runs as one guarded
/// statement sequence, so the compare-and-set is a single `UPDATE` whose
/// guard travels in the `WHERE` clause.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and bootstrap the schema
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        info!(path = %path.as_ref().display(), "opening sqlite store");
        Self::init(conn)
    }

    /// Open a private in-memory database, mostly for tests
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|err| StoreError::unavailable(err.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        register_contains_ci(&conn).map_err(|err| StoreError::unavailable(err.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::unavailable("sqlite connection mutex poisoned"))
    }

    fn create_sync(
        &self,
        collection: &'static CollectionSpec,
        record: FieldMap,
    ) -> StoreResult<StoredRecord> {
        let table = table_for(collection)?;
        let conn = self.lock()?;

        let mut columns = Vec::with_capacity(table.columns.len());
        let mut params = Vec::with_capacity(table.columns.len());
        for (column, kind) in table.columns {
            let value = record.get(*column).unwrap_or(&Value::Null);
            columns.push(*column);
            params.push(to_sql(table.name, column, *kind, value)?);
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders
        );
        conn.execute(&sql, params_from_iter(params))
            .map_err(|err| map_sqlite_error(collection, err))?;

        let rowid = conn.last_insert_rowid();
        debug!(table = table.name, rowid, "inserted row");
        fetch_by_rowid(&conn, table, rowid)?
            .ok_or_else(|| StoreError::unavailable("inserted row could not be read back"))
    }

    fn find_by_id_sync(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
    ) -> StoreResult<Option<StoredRecord>> {
        let table = table_for(collection)?;
        // Ids from other backends are not numeric and cannot exist here
        let Ok(rowid) = id.as_str().parse::<i64>() else {
            return Ok(None);
        };
        let conn = self.lock()?;
        fetch_by_rowid(&conn, table, rowid)
    }

    fn find_sync(
        &self,
        collection: &'static CollectionSpec,
        filter: &RecordFilter,
    ) -> StoreResult<Vec<StoredRecord>> {
        let table = table_for(collection)?;
        let (where_sql, params) = compile_filter(table, filter)?;
        let sql = format!("{}{} ORDER BY id ASC", table.select_sql(), where_sql);

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| row_to_record(table, row))
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|err| StoreError::unavailable(err.to_string()))
    }

    fn update_by_id_sync(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        patch: RecordPatch,
    ) -> StoreResult<Option<StoredRecord>> {
        let table = table_for(collection)?;
        let Ok(rowid) = id.as_str().parse::<i64>() else {
            return Ok(None);
        };
        let conn = self.lock()?;

        let (set_sql, mut params) = compile_patch(table, &patch)?;
        if set_sql.is_empty() {
            return fetch_by_rowid(&conn, table, rowid);
        }
        params.push(SqlValue::Integer(rowid));

        let sql = format!("UPDATE {} SET {} WHERE id = ?", table.name, set_sql);
        let changed = conn
            .execute(&sql, params_from_iter(params))
            .map_err(|err| map_sqlite_error(collection, err))?;
        if changed == 0 {
            return Ok(None);
        }
        fetch_by_rowid(&conn, table, rowid)
    }

    fn update_if_matches_sync(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        guard: &RecordFilter,
        patch: RecordPatch,
    ) -> StoreResult<CasOutcome> {
        let table = table_for(collection)?;
        let Ok(rowid) = id.as_str().parse::<i64>() else {
            return Ok(CasOutcome::Missing);
        };
        let conn = self.lock()?;

        // The guard rides in the WHERE clause of a single UPDATE; SQLite
        // serializes writers, so the check-and-set is atomic per row.
        let (set_sql, mut params) = compile_patch(table, &patch)?;
        let (guard_sql, guard_params) = compile_filter(table, guard)?;
        params.push(SqlValue::Integer(rowid));
        params.extend(guard_params);

        let guard_suffix = guard_sql.strip_prefix(" WHERE ").map_or(String::new(), |g| format!(" AND {g}"));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table.name, set_sql, guard_suffix
        );
        let changed = conn
            .execute(&sql, params_from_iter(params))
            .map_err(|err| map_sqlite_error(collection, err))?;

        if changed > 0 {
            let updated = fetch_by_rowid(&conn, table, rowid)?
                .ok_or_else(|| StoreError::unavailable("updated row could not be read back"))?;
            return Ok(CasOutcome::Updated(updated));
        }
        match fetch_by_rowid(&conn, table, rowid)? {
            Some(current) => Ok(CasOutcome::GuardFailed(current)),
            None => Ok(CasOutcome::Missing),
        }
    }

    fn count_sync(
        &self,
        collection: &'static CollectionSpec,
        filter: Option<&RecordFilter>,
    ) -> StoreResult<u64> {
        let table = table_for(collection)?;
        let empty = RecordFilter::new();
        let (where_sql, params) = compile_filter(table, filter.unwrap_or(&empty))?;
        let sql = format!("SELECT COUNT(*) FROM {}{}", table.name, where_sql);

        let conn = self.lock()?;
        conn.query_row(&sql, params_from_iter(params), |row| row.get::<_, i64>(0))
            .map(|count| count as u64)
            .map_err(|err| StoreError::unavailable(err.to_string()))
    }
}

impl PersistencePort for SqliteStore {
    fn create(
        &self,
        collection: &'static CollectionSpec,
        record: FieldMap,
    ) -> impl Future<Output = StoreResult<StoredRecord>> + Send {
        let result = self.create_sync(collection, record);
        async move { result }
    }

    fn find_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send {
        let result = self.find_by_id_sync(collection, id);
        async move { result }
    }

    fn find(
        &self,
        collection: &'static CollectionSpec,
        filter: &RecordFilter,
    ) -> impl Future<Output = StoreResult<Vec<StoredRecord>>> + Send {
        let result = self.find_sync(collection, filter);
        async move { result }
    }

    fn update_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send {
        let result = self.update_by_id_sync(collection, id, patch);
        async move { result }
    }

    fn update_if_matches(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        guard: &RecordFilter,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<CasOutcome>> + Send {
        let result = self.update_if_matches_sync(collection, id, guard, patch);
        async move { result }
    }

    fn count(
        &self,
        collection: &'static CollectionSpec,
        filter: Option<&RecordFilter>,
    ) -> impl Future<Output = StoreResult<u64>> + Send {
        let result = self.count_sync(collection, filter);
        async move { result }
    }
}

/// Unicode case-insensitive containment, matching the port's reference
/// semantics exactly (SQLite's own LIKE folds ASCII only)
fn register_contains_ci(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "contains_ci",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: Option<String> = ctx.get(0)?;
            let needle: String = ctx.get(1)?;
            Ok(haystack
                .map_or(false, |hay| hay.to_lowercase().contains(&needle.to_lowercase())))
        },
    )
}

fn to_sql(
    table: &'static str,
    column: &str,
    kind: ColumnKind,
    value: &Value,
) -> StoreResult<SqlValue> {
    match (kind, value) {
        (ColumnKind::Text, Value::String(s)) => Ok(SqlValue::Text(s.clone())),
        (ColumnKind::NullableText, Value::Null) => Ok(SqlValue::Null),
        (ColumnKind::NullableText, Value::String(s)) => Ok(SqlValue::Text(s.clone())),
        (ColumnKind::OwnerRef, Value::String(s)) => s
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| {
                StoreError::malformed(
                    table,
                    format!("'{column}' must reference a row id, got '{s}'"),
                )
            }),
        (ColumnKind::IdList, Value::Array(_)) => Ok(SqlValue::Text(value.to_string())),
        _ => Err(StoreError::malformed(
            table,
            format!("field '{column}' has an unsupported value: {value}"),
        )),
    }
}

fn row_to_record(table: &TableSpec, row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRecord> {
    let rowid: i64 = row.get(0)?;
    let mut fields = FieldMap::new();
    for (i, (column, kind)) in table.columns.iter().enumerate() {
        let index = i + 1;
        let value = match kind {
            ColumnKind::Text => Value::String(row.get::<_, String>(index)?),
            ColumnKind::NullableText => row
                .get::<_, Option<String>>(index)?
                .map_or(Value::Null, Value::String),
            ColumnKind::OwnerRef => Value::String(row.get::<_, i64>(index)?.to_string()),
            ColumnKind::IdList => {
                let raw: String = row.get(index)?;
                serde_json::from_str(&raw).map_err(|err| {
                    rusqlite::Error::FromSqlConversionFailure(
                        index,
                        rusqlite::types::Type::Text,
                        Box::new(err),
                    )
                })?
            }
        };
        fields.insert((*column).to_string(), value);
    }
    Ok(StoredRecord {
        id: EntityId::from(rowid),
        fields,
    })
}

fn fetch_by_rowid(
    conn: &Connection,
    table: &TableSpec,
    rowid: i64,
) -> StoreResult<Option<StoredRecord>> {
    let sql = format!("{} WHERE id = ?", table.select_sql());
    conn.query_row(&sql, [rowid], |row| row_to_record(table, row))
        .optional()
        .map_err(|err| StoreError::unavailable(err.to_string()))
}

fn compile_filter(
    table: &'static TableSpec,
    filter: &RecordFilter,
) -> StoreResult<(String, Vec<SqlValue>)> {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for (field, matcher) in filter.clauses() {
        let kind = table.column_kind(field)?;
        match matcher {
            FieldMatch::Equals(value) => {
                clauses.push(format!("{field} = ?"));
                params.push(to_sql(table.name, field, kind, value)?);
            }
            FieldMatch::Contains(needle) => {
                clauses.push(format!("contains_ci({field}, ?)"));
                params.push(SqlValue::Text(needle.clone()));
            }
        }
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    Ok((where_sql, params))
}

fn compile_patch(
    table: &'static TableSpec,
    patch: &RecordPatch,
) -> StoreResult<(String, Vec<SqlValue>)> {
    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (field, value) in patch.fields() {
        let kind = table.column_kind(field)?;
        assignments.push(format!("{field} = ?"));
        params.push(to_sql(table.name, field, kind, value)?);
    }
    Ok((assignments.join(", "), params))
}

fn map_sqlite_error(collection: &CollectionSpec, err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            let message = message.clone().unwrap_or_default();
            for field in collection.unique_fields {
                if message.contains(field) {
                    return StoreError::conflict(collection.name, *field);
                }
            }
        }
    }
    StoreError::unavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use resgate_domain::identity::TutorDraft;
    use resgate_domain::mapper::{pet as pet_mapper, tutor as tutor_mapper};
    use resgate_domain::registry::PetDraft;
    use resgate_domain::storage::collections;

    static ELSEWHERE: CollectionSpec = CollectionSpec {
        name: "elsewhere",
        unique_fields: &[],
    };

    async fn seed_tutor(store: &SqliteStore) -> EntityId {
        let draft = TutorDraft {
            name: "Ana Silva".to_string(),
            email: "ana@example.com".to_string(),
            credential: "senha123".to_string(),
        };
        store
            .create(&collections::TUTORS, tutor_mapper::new_tutor_record(&draft))
            .await
            .unwrap()
            .id
    }

    fn pet_record(name: &str, owner: &EntityId) -> FieldMap {
        let draft = PetDraft {
            name: name.to_string(),
            species: "Gato".to_string(),
            last_seen_location: "Centro".to_string(),
            last_seen_date: "12/07/2024".to_string(),
            ..PetDraft::default()
        };
        pet_mapper::new_pet_record(&draft, owner, Utc::now())
    }

    #[tokio::test]
    async fn test_unknown_collections_are_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.create(&ELSEWHERE, FieldMap::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection(_)));
    }

    #[tokio::test]
    async fn test_contains_ci_folds_beyond_ascii() {
        let store = SqliteStore::open_in_memory().unwrap();
        let owner = seed_tutor(&store).await;
        store
            .create(&collections::PETS, pet_record("Lunático", &owner))
            .await
            .unwrap();

        let filter = RecordFilter::new().contains("name", "LUNÁT");
        let found = store.find(&collections::PETS, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_pets_require_an_existing_tutor_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .create(&collections::PETS, pet_record("Rex", &EntityId::new("99")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_foreign_ids_do_not_resolve() {
        let store = SqliteStore::open_in_memory().unwrap();
        let found = store
            .find_by_id(&collections::PETS, &EntityId::new("0190cafebabe"))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
