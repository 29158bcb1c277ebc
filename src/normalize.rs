//! Reconciles the upper-case legacy keys and the lower-case display keys.
//!
//! Reading is done once at the storage boundary. The lower-case value wins
//! when both are present, then the upper-case one, then the type default.
//! `null` and blank strings count as absent. Anything present but not
//! coercible fails the whole load with `CorruptState`.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::error::{ClientError, Result};
use crate::fields::{Field, CLIENT_FIELDS};
use crate::record::{ClientFields, ClientRecord, Estado, Flag, KinessoType};

/// Error key used for problems found in bootstrap data.
pub const BOOTSTRAP_SOURCE: &str = "bootstrap";

/// Parses the persisted blob stored under `key`.
pub fn normalize_persisted(key: &str, raw: &str) -> Result<Vec<ClientRecord>> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|err| ClientError::corrupt(key, format!("invalid JSON: {err}")))?;
    let Some(entries) = parsed.as_array() else {
        return Err(ClientError::corrupt(key, "expected an array of clients"));
    };

    let mut seen = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let record = normalize_entry(entry)
            .map_err(|reason| ClientError::corrupt(key, format!("entry {idx}: {reason}")))?;
        if !seen.insert(record.id.clone()) {
            return Err(ClientError::corrupt(
                key,
                format!("entry {idx}: duplicate id {}", record.id),
            ));
        }
        out.push(record);
    }
    Ok(out)
}

/// Reads one bootstrap entry. Bootstrap rows carry no id; the caller assigns one.
pub fn normalize_bootstrap_entry(idx: usize, entry: &Value) -> Result<ClientFields> {
    let Some(obj) = entry.as_object() else {
        return Err(ClientError::corrupt(
            BOOTSTRAP_SOURCE,
            format!("entry {idx}: not an object"),
        ));
    };
    read_fields(obj)
        .map_err(|reason| ClientError::corrupt(BOOTSTRAP_SOURCE, format!("entry {idx}: {reason}")))
}

fn normalize_entry(entry: &Value) -> std::result::Result<ClientRecord, String> {
    let Some(obj) = entry.as_object() else {
        return Err("not an object".to_string());
    };
    let id = read_text(obj, Field::Id)?.trim().to_string();
    if id.is_empty() {
        return Err("id is missing".to_string());
    }
    let fields = read_fields(obj)?;
    Ok(ClientRecord::new(id, fields))
}

fn read_fields(obj: &Map<String, Value>) -> std::result::Result<ClientFields, String> {
    let advertiser = read_text(obj, Field::Advertiser)?;
    if advertiser.trim().is_empty() {
        return Err("advertiser is missing".to_string());
    }
    Ok(ClientFields {
        advertiser,
        directo: read_flag(obj, Field::Directo)?,
        orion: read_flag(obj, Field::Orion)?,
        kinesso: read_flag(obj, Field::Kinesso)?,
        kinesso_type: read_kinesso_type(obj)?,
        duo: read_flag(obj, Field::Duo)?,
        available_dsp_equative: read_text(obj, Field::AvailableDspEquative)?,
        notes1: read_text(obj, Field::Notes1)?,
        notes2: read_text(obj, Field::Notes2)?,
        available_deals_curados: read_text(obj, Field::AvailableDealsCurados)?,
        estado: read_estado(obj)?,
    })
}

fn pick(obj: &Map<String, Value>, field: Field) -> Option<&Value> {
    let spec = field.spec();
    present(obj.get(spec.key)).or_else(|| present(obj.get(spec.legacy_key)))
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    })
}

fn read_text(obj: &Map<String, Value>, field: Field) -> std::result::Result<String, String> {
    match pick(obj, field) {
        None => Ok(String::new()),
        Some(value) => scalar_string(value)
            .ok_or_else(|| format!("field \"{}\" is not text", field.key())),
    }
}

fn read_flag(obj: &Map<String, Value>, field: Field) -> std::result::Result<Flag, String> {
    match pick(obj, field) {
        None => Ok(Flag::Off),
        Some(value) => value_binary(value)
            .map(Flag::from)
            .ok_or_else(|| format!("field \"{}\" must be 0 or 1, got {value}", field.key())),
    }
}

fn read_estado(obj: &Map<String, Value>) -> std::result::Result<Estado, String> {
    match pick(obj, Field::Estado) {
        None => Ok(Estado::Active),
        Some(value) => match value_binary(value) {
            Some(true) => Ok(Estado::Active),
            Some(false) => Ok(Estado::Inactive),
            None => Err(format!("field \"estado\" must be 0 or 1, got {value}")),
        },
    }
}

fn read_kinesso_type(obj: &Map<String, Value>) -> std::result::Result<KinessoType, String> {
    match pick(obj, Field::KinessoType) {
        None => Ok(KinessoType::Na),
        Some(value) => value
            .as_str()
            .and_then(|text| text.parse::<KinessoType>().ok())
            .ok_or_else(|| format!("field \"kinessoType\" has unknown value {value}")),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    if let Some(number) = value.as_i64() {
        return Some(number.to_string());
    }
    if let Some(number) = value.as_u64() {
        return Some(number.to_string());
    }
    if let Some(number) = value.as_f64() {
        return Some(number.to_string());
    }
    if let Some(boolean) = value.as_bool() {
        return Some(boolean.to_string());
    }
    None
}

/// Accepts 0/1 as numbers, numeric strings or booleans.
fn value_binary(value: &Value) -> Option<bool> {
    let number = if let Some(num) = value.as_i64() {
        num
    } else if let Some(num) = value.as_f64() {
        if num.fract() != 0.0 {
            return None;
        }
        num as i64
    } else if let Some(text) = value.as_str() {
        text.trim().parse::<i64>().ok()?
    } else if let Some(boolean) = value.as_bool() {
        return Some(boolean);
    } else {
        return None;
    };
    match number {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

/// Persisted shape of one record. Legacy keys are written alongside the
/// canonical ones when `with_legacy` is set.
pub fn to_persisted(record: &ClientRecord, with_legacy: bool) -> Value {
    let mut obj = Map::new();
    for spec in CLIENT_FIELDS.iter() {
        let value = persisted_value(record, spec.field);
        if with_legacy {
            obj.insert(spec.legacy_key.to_string(), value.clone());
        }
        obj.insert(spec.key.to_string(), value);
    }
    Value::Object(obj)
}

pub fn to_persisted_array(records: &[ClientRecord], with_legacy: bool) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| to_persisted(record, with_legacy))
            .collect(),
    )
}

fn persisted_value(record: &ClientRecord, field: Field) -> Value {
    let fields = &record.fields;
    match field {
        Field::Id => json!(record.id),
        Field::Advertiser => json!(fields.advertiser),
        Field::Directo => json!(fields.directo.as_u8()),
        Field::Orion => json!(fields.orion.as_u8()),
        Field::Kinesso => json!(fields.kinesso.as_u8()),
        Field::KinessoType => json!(fields.kinesso_type.as_str()),
        Field::Duo => json!(fields.duo.as_u8()),
        Field::AvailableDspEquative => json!(fields.available_dsp_equative),
        Field::Notes1 => json!(fields.notes1),
        Field::Notes2 => json!(fields.notes2),
        Field::AvailableDealsCurados => json!(fields.available_deals_curados),
        Field::Estado => json!(fields.estado.as_u8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "clientesKinesso";

    fn load(value: Value) -> Result<Vec<ClientRecord>> {
        normalize_persisted(KEY, value.to_string().as_str())
    }

    #[test]
    fn lower_case_wins_over_legacy() {
        let records = load(json!([{
            "id": "a",
            "advertiser": "Acme",
            "ADVERTISER": "ACME OLD",
            "orion": 1,
            "ORION": 0,
        }]))
        .unwrap();
        assert_eq!(records[0].advertiser(), "Acme");
        assert_eq!(records[0].fields.orion, Flag::On);
    }

    #[test]
    fn legacy_keys_fill_missing_canonical_ones() {
        let records = load(json!([{
            "ID": "a",
            "ADVERTISER": "Globex",
            "DIRECTO": "1",
            "KINESSO_TYPE": "glass",
            "NOTES_1": "legacy note",
            "ESTADO": 0,
        }]))
        .unwrap();
        let fields = &records[0].fields;
        assert_eq!(records[0].id, "a");
        assert_eq!(fields.advertiser, "Globex");
        assert_eq!(fields.directo, Flag::On);
        assert_eq!(fields.kinesso_type, KinessoType::Glass);
        assert_eq!(fields.notes1, "legacy note");
        assert_eq!(fields.estado, Estado::Inactive);
    }

    #[test]
    fn missing_optional_fields_take_type_defaults() {
        let records = load(json!([{ "id": "a", "advertiser": "Initech" }])).unwrap();
        let fields = &records[0].fields;
        assert_eq!(fields.directo, Flag::Off);
        assert_eq!(fields.duo, Flag::Off);
        assert_eq!(fields.kinesso_type, KinessoType::Na);
        assert_eq!(fields.notes2, "");
        assert_eq!(fields.estado, Estado::Active);
    }

    #[test]
    fn null_and_blank_values_fall_back() {
        let records = load(json!([{
            "id": "a",
            "advertiser": "Umbrella",
            "notes1": null,
            "NOTES_1": "kept",
            "duo": "",
            "DUO": true,
        }]))
        .unwrap();
        assert_eq!(records[0].fields.notes1, "kept");
        assert_eq!(records[0].fields.duo, Flag::On);
    }

    #[test]
    fn invalid_flag_is_corrupt_state() {
        let err = load(json!([{ "id": "a", "advertiser": "Acme", "orion": 2 }])).unwrap_err();
        match err {
            ClientError::CorruptState { key, reason } => {
                assert_eq!(key, KEY);
                assert!(reason.contains("entry 0"), "{reason}");
                assert!(reason.contains("orion"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn structural_problems_are_corrupt_state() {
        for raw in [
            "not json".to_string(),
            json!({ "id": "a" }).to_string(),
            json!(["a string"]).to_string(),
            json!([{ "advertiser": "No Id" }]).to_string(),
            json!([{ "id": "a" }]).to_string(),
            json!([{ "id": "a", "advertiser": "X", "kinessoType": "OTHER" }]).to_string(),
            json!([{ "id": "a", "advertiser": "X", "notes1": { "nested": true } }]).to_string(),
        ] {
            let err = normalize_persisted(KEY, raw.as_str()).unwrap_err();
            assert!(
                matches!(err, ClientError::CorruptState { .. }),
                "{raw} gave {err:?}"
            );
        }
    }

    #[test]
    fn duplicate_ids_are_corrupt_state() {
        let err = load(json!([
            { "id": "a", "advertiser": "One" },
            { "id": "a", "advertiser": "Two" },
        ]))
        .unwrap_err();
        assert!(matches!(err, ClientError::CorruptState { .. }));
    }

    #[test]
    fn persisted_shape_carries_both_namings() {
        let mut fields = ClientFields::new("Acme");
        fields.kinesso = Flag::On;
        let record = ClientRecord::new("a", fields);

        let both = to_persisted(&record, true);
        assert_eq!(both["kinesso"], json!(1));
        assert_eq!(both["KINESSO"], json!(1));
        assert_eq!(both["kinessoType"], json!("NA"));
        assert_eq!(both["KINESSO_TYPE"], json!("NA"));
        assert_eq!(both.as_object().unwrap().len(), CLIENT_FIELDS.len() * 2);

        let canonical = to_persisted(&record, false);
        assert!(canonical.get("KINESSO").is_none());
        assert_eq!(canonical.as_object().unwrap().len(), CLIENT_FIELDS.len());
    }

    #[test]
    fn bootstrap_entry_reads_upper_case_keys() {
        let fields = normalize_bootstrap_entry(
            0,
            &json!({ "ADVERTISER": "Hooli", "ORION": 1, "KINESSO_TYPE": "POWERBOX" }),
        )
        .unwrap();
        assert_eq!(fields.advertiser, "Hooli");
        assert_eq!(fields.orion, Flag::On);
        assert_eq!(fields.kinesso_type, KinessoType::Powerbox);

        let err = normalize_bootstrap_entry(4, &json!(7)).unwrap_err();
        match err {
            ClientError::CorruptState { key, reason } => {
                assert_eq!(key, BOOTSTRAP_SOURCE);
                assert!(reason.starts_with("entry 4"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
