//! Stored form of the Tutor entity

use serde_json::Value;

use crate::identity::{Tutor, TutorDraft};
use crate::storage::{EntityId, FieldMap, RecordPatch, StoredRecord};

use super::MapError;

/// Canonical stored field names for tutor records
pub mod fields {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const CREDENTIAL: &str = "credential";
    pub const REGISTERED_PET_IDS: &str = "registered_pet_ids";
}

/// Stored form of a tutor about to be created
///
/// The pet-id back-reference list starts empty; the registry appends to it
/// as the tutor reports pets.
pub fn new_tutor_record(draft: &TutorDraft) -> FieldMap {
    let mut record = FieldMap::new();
    record.insert(fields::NAME.into(), Value::String(draft.name.clone()));
    record.insert(fields::EMAIL.into(), Value::String(draft.email.clone()));
    record.insert(
        fields::CREDENTIAL.into(),
        Value::String(draft.credential.clone()),
    );
    record.insert(fields::REGISTERED_PET_IDS.into(), Value::Array(Vec::new()));
    record
}

/// The patch replacing a tutor's ordered pet-id list
pub fn registered_pets_patch(pet_ids: &[EntityId]) -> RecordPatch {
    RecordPatch::new().set(
        fields::REGISTERED_PET_IDS,
        Value::Array(
            pet_ids
                .iter()
                .map(|id| Value::String(id.to_string()))
                .collect(),
        ),
    )
}

/// Rebuild a Tutor from its stored form
pub fn tutor_from_record(record: &StoredRecord) -> Result<Tutor, MapError> {
    let registered_pet_ids = match record.field(fields::REGISTERED_PET_IDS) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(EntityId::new).ok_or_else(|| {
                    MapError::MalformedField {
                        id: record.id.clone(),
                        field: fields::REGISTERED_PET_IDS,
                        reason: format!("expected an id string, got {item}"),
                    }
                })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(MapError::MalformedField {
                id: record.id.clone(),
                field: fields::REGISTERED_PET_IDS,
                reason: format!("expected an array, got {other}"),
            });
        }
    };

    Ok(Tutor {
        id: record.id.clone(),
        name: required_str(record, fields::NAME)?.to_string(),
        email: required_str(record, fields::EMAIL)?.to_string(),
        credential: required_str(record, fields::CREDENTIAL)?.to_string(),
        registered_pet_ids,
    })
}

fn required_str<'a>(record: &'a StoredRecord, field: &'static str) -> Result<&'a str, MapError> {
    record.str_field(field).ok_or(MapError::MissingField {
        id: record.id.clone(),
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TutorDraft {
        TutorDraft {
            name: "Ana Silva".to_string(),
            email: "ana@example.com".to_string(),
            credential: "senha123".to_string(),
        }
    }

    #[test]
    fn test_new_record_round_trips() {
        let record = StoredRecord {
            id: EntityId::new("1"),
            fields: new_tutor_record(&draft()),
        };

        let tutor = tutor_from_record(&record).unwrap();
        assert_eq!(tutor.name(), "Ana Silva");
        assert_eq!(tutor.email(), "ana@example.com");
        assert!(tutor.registered_pet_ids().is_empty());
    }

    #[test]
    fn test_pet_list_keeps_order() {
        let mut fields = new_tutor_record(&draft());
        let ids = [EntityId::new("3"), EntityId::new("1"), EntityId::new("2")];
        for (name, value) in registered_pets_patch(&ids).into_fields() {
            fields.insert(name, value);
        }

        let tutor = tutor_from_record(&StoredRecord {
            id: EntityId::new("1"),
            fields,
        })
        .unwrap();
        assert_eq!(tutor.registered_pet_ids(), &ids[..]);
    }

    #[test]
    fn test_non_string_pet_id_is_rejected() {
        let mut fields = new_tutor_record(&draft());
        fields.insert(
            fields::REGISTERED_PET_IDS.into(),
            serde_json::json!([1, 2]),
        );

        let err = tutor_from_record(&StoredRecord {
            id: EntityId::new("1"),
            fields,
        })
        .unwrap_err();
        assert!(matches!(err, MapError::MalformedField { .. }));
    }
}
