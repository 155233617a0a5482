//! Stored form of the Pet entity

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::registry::{Pet, PetDraft, PetStatus, PHOTO_REF_NONE};
use crate::storage::{EntityId, FieldMap, RecordPatch, StoredRecord};

use super::MapError;

/// Canonical stored field names for pet records
///
/// Every backend persists these names: the relational store as columns, the
/// others as map keys. Filters built by the registry use them too.
pub mod fields {
    pub const NAME: &str = "name";
    pub const SPECIES: &str = "species";
    pub const BREED: &str = "breed";
    pub const SEX: &str = "sex";
    pub const APPROXIMATE_AGE: &str = "approximate_age";
    pub const COLOR: &str = "color";
    pub const LAST_SEEN_LOCATION: &str = "last_seen_location";
    pub const LAST_SEEN_DATE: &str = "last_seen_date";
    pub const OWNER_COMMENT: &str = "owner_comment";
    pub const PHOTO_REF: &str = "photo_ref";
    pub const OWNER_ID: &str = "owner_id";
    pub const STATUS: &str = "status";
    pub const REGISTERED_AT: &str = "registered_at";
    pub const REUNITED_AT: &str = "reunited_at";
}

/// Stored form of a pet about to be created
///
/// Ids are backend-assigned, so there is no Pet value yet at this point;
/// the record is built from the validated draft. Status starts `LOST`,
/// `reunited_at` starts null, and optional descriptive fields get their
/// defaults (`photo_ref` falls back to the `"none"` sentinel).
pub fn new_pet_record(
    draft: &PetDraft,
    owner_id: &EntityId,
    registered_at: DateTime<Utc>,
) -> FieldMap {
    fn or_empty(value: &Option<String>) -> Value {
        Value::String(value.clone().unwrap_or_default())
    }

    let mut record = FieldMap::new();
    record.insert(fields::NAME.into(), Value::String(draft.name.clone()));
    record.insert(fields::SPECIES.into(), Value::String(draft.species.clone()));
    record.insert(fields::BREED.into(), or_empty(&draft.breed));
    record.insert(fields::SEX.into(), or_empty(&draft.sex));
    record.insert(fields::APPROXIMATE_AGE.into(), or_empty(&draft.approximate_age));
    record.insert(fields::COLOR.into(), or_empty(&draft.color));
    record.insert(
        fields::LAST_SEEN_LOCATION.into(),
        Value::String(draft.last_seen_location.clone()),
    );
    record.insert(
        fields::LAST_SEEN_DATE.into(),
        Value::String(draft.last_seen_date.clone()),
    );
    record.insert(fields::OWNER_COMMENT.into(), or_empty(&draft.owner_comment));
    record.insert(
        fields::PHOTO_REF.into(),
        Value::String(
            draft
                .photo_ref
                .clone()
                .unwrap_or_else(|| PHOTO_REF_NONE.to_string()),
        ),
    );
    record.insert(fields::OWNER_ID.into(), Value::String(owner_id.to_string()));
    record.insert(
        fields::STATUS.into(),
        Value::String(PetStatus::Lost.as_str().to_string()),
    );
    record.insert(
        fields::REGISTERED_AT.into(),
        Value::String(registered_at.to_rfc3339()),
    );
    record.insert(fields::REUNITED_AT.into(), Value::Null);
    record
}

/// The Lost→Found mutation as a partial update
pub fn found_patch(reunited_at: DateTime<Utc>) -> RecordPatch {
    RecordPatch::new()
        .set(fields::STATUS, PetStatus::Found.as_str())
        .set(fields::REUNITED_AT, reunited_at.to_rfc3339())
}

/// Rebuild a Pet from its stored form
///
/// Normalizes status and timestamps identically for every backend and
/// rejects records violating the status/reunited_at invariant.
pub fn pet_from_record(record: &StoredRecord) -> Result<Pet, MapError> {
    let status_raw = required_str(record, fields::STATUS)?;
    let status = PetStatus::parse(status_raw).ok_or_else(|| MapError::MalformedField {
        id: record.id.clone(),
        field: fields::STATUS,
        reason: format!("unknown status '{status_raw}'"),
    })?;

    let registered_at = required_timestamp(record, fields::REGISTERED_AT)?;
    let reunited_at = optional_timestamp(record, fields::REUNITED_AT)?;

    match (status, reunited_at) {
        (PetStatus::Lost, Some(_)) => {
            return Err(MapError::Inconsistent {
                id: record.id.clone(),
                reason: "status is LOST but a reunion date is set".to_string(),
            });
        }
        (PetStatus::Found, None) => {
            return Err(MapError::Inconsistent {
                id: record.id.clone(),
                reason: "status is FOUND but no reunion date is set".to_string(),
            });
        }
        _ => {}
    }

    Ok(Pet {
        id: record.id.clone(),
        name: required_str(record, fields::NAME)?.to_string(),
        species: required_str(record, fields::SPECIES)?.to_string(),
        breed: optional_str(record, fields::BREED, ""),
        sex: optional_str(record, fields::SEX, ""),
        approximate_age: optional_str(record, fields::APPROXIMATE_AGE, ""),
        color: optional_str(record, fields::COLOR, ""),
        last_seen_location: required_str(record, fields::LAST_SEEN_LOCATION)?.to_string(),
        last_seen_date: required_str(record, fields::LAST_SEEN_DATE)?.to_string(),
        owner_comment: optional_str(record, fields::OWNER_COMMENT, ""),
        photo_ref: optional_str(record, fields::PHOTO_REF, PHOTO_REF_NONE),
        owner_id: EntityId::new(required_str(record, fields::OWNER_ID)?),
        status,
        registered_at,
        reunited_at,
    })
}

fn required_str<'a>(record: &'a StoredRecord, field: &'static str) -> Result<&'a str, MapError> {
    record.str_field(field).ok_or(MapError::MissingField {
        id: record.id.clone(),
        field,
    })
}

fn optional_str(record: &StoredRecord, field: &str, default: &str) -> String {
    record
        .str_field(field)
        .map_or_else(|| default.to_string(), str::to_string)
}

fn required_timestamp(
    record: &StoredRecord,
    field: &'static str,
) -> Result<DateTime<Utc>, MapError> {
    parse_timestamp(record, field, required_str(record, field)?)
}

fn optional_timestamp(
    record: &StoredRecord,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, MapError> {
    match record.field(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => parse_timestamp(record, field, raw).map(Some),
        Some(other) => Err(MapError::MalformedField {
            id: record.id.clone(),
            field,
            reason: format!("expected a timestamp string, got {other}"),
        }),
    }
}

fn parse_timestamp(
    record: &StoredRecord,
    field: &'static str,
    raw: &str,
) -> Result<DateTime<Utc>, MapError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| MapError::MalformedField {
            id: record.id.clone(),
            field,
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> PetDraft {
        PetDraft {
            name: "Bolinha".to_string(),
            species: "Cachorro".to_string(),
            breed: Some("Poodle".to_string()),
            sex: None,
            approximate_age: Some("3 anos".to_string()),
            color: None,
            last_seen_location: "Parque Central, São Paulo".to_string(),
            last_seen_date: "10/07/2024".to_string(),
            owner_comment: None,
            photo_ref: None,
        }
    }

    #[test]
    fn test_new_record_round_trips() {
        let registered_at = Utc::now();
        let fields = new_pet_record(&draft(), &EntityId::new("9"), registered_at);
        let record = StoredRecord {
            id: EntityId::new("1"),
            fields,
        };

        let pet = pet_from_record(&record).unwrap();
        assert_eq!(pet.name(), "Bolinha");
        assert_eq!(pet.breed(), "Poodle");
        assert_eq!(pet.sex(), "");
        assert_eq!(pet.photo_ref(), PHOTO_REF_NONE);
        assert_eq!(pet.owner_id(), &EntityId::new("9"));
        assert_eq!(pet.status(), PetStatus::Lost);
        assert_eq!(pet.registered_at(), &registered_at);
        assert!(pet.reunited_at().is_none());
    }

    #[test]
    fn test_found_patch_round_trips() {
        let registered_at = Utc::now();
        let mut fields = new_pet_record(&draft(), &EntityId::new("9"), registered_at);
        let reunited_at = Utc::now();
        for (name, value) in found_patch(reunited_at).into_fields() {
            fields.insert(name, value);
        }

        let pet = pet_from_record(&StoredRecord {
            id: EntityId::new("1"),
            fields,
        })
        .unwrap();
        assert_eq!(pet.status(), PetStatus::Found);
        assert_eq!(pet.reunited_at(), Some(&reunited_at));
    }

    #[test]
    fn test_lost_record_with_reunion_date_is_rejected() {
        let mut fields = new_pet_record(&draft(), &EntityId::new("9"), Utc::now());
        fields.insert(fields::REUNITED_AT.into(), json!(Utc::now().to_rfc3339()));

        let err = pet_from_record(&StoredRecord {
            id: EntityId::new("1"),
            fields,
        })
        .unwrap_err();
        assert!(matches!(err, MapError::Inconsistent { .. }));
    }

    #[test]
    fn test_missing_status_is_rejected() {
        let mut fields = new_pet_record(&draft(), &EntityId::new("9"), Utc::now());
        fields.remove(fields::STATUS);

        let err = pet_from_record(&StoredRecord {
            id: EntityId::new("1"),
            fields,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::MissingField {
                field: fields::STATUS,
                ..
            }
        ));
    }
}
