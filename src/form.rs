//! Form bridge: string form state to and from client records.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::fields::{Field, FORM_FIELDS};
use crate::ports::Notifier;
use crate::record::{ClientFields, ClientRecord, Estado, Flag, KinessoType};
use crate::storage::KeyValueStorage;
use crate::store::RecordStore;

pub const SAVED_MESSAGE: &str = "Client saved.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    Invalid(String),
}

pub type FormErrors = BTreeMap<Field, FieldError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(ClientRecord),
    Updated(ClientRecord),
    /// Validation failed; errors are on the form.
    Blocked,
}

pub fn duplicate_message(advertiser: &str) -> String {
    format!("Advertiser \"{advertiser}\" already exists.")
}

#[derive(Debug, Clone)]
pub struct ClientForm {
    values: BTreeMap<Field, String>,
    errors: FormErrors,
    disabled: BTreeSet<Field>,
    edit_target: Option<String>,
}

impl Default for ClientForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientForm {
    pub fn new() -> Self {
        let mut form = Self {
            values: BTreeMap::new(),
            errors: FormErrors::new(),
            disabled: BTreeSet::new(),
            edit_target: None,
        };
        form.reset();
        form
    }

    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Returns false when the field is disabled or not part of the form.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> bool {
        if field == Field::Id || self.disabled.contains(&field) {
            return false;
        }
        self.values.insert(field, value.into());
        self.errors.remove(&field);
        true
    }

    pub fn is_disabled(&self, field: Field) -> bool {
        self.disabled.contains(&field)
    }

    pub fn edit_target(&self) -> Option<&str> {
        self.edit_target.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Whether every required field has a value; drives the submit control.
    pub fn can_submit(&self) -> bool {
        FORM_FIELDS
            .iter()
            .filter(|field| field.is_required())
            .all(|field| !self.value(*field).trim().is_empty())
    }

    /// Back to defaults with no errors. Edit state is left alone.
    pub fn reset(&mut self) {
        self.values = FORM_FIELDS
            .iter()
            .map(|field| (*field, field.spec().form_default.to_string()))
            .collect();
        self.errors.clear();
    }

    pub fn begin_edit(&mut self, record: &ClientRecord) {
        self.values = FORM_FIELDS
            .iter()
            .map(|field| (*field, record.value_string(*field)))
            .collect();
        self.errors.clear();
        self.edit_target = Some(record.id.clone());
        self.disabled.insert(Field::Advertiser);
    }

    pub fn cancel_edit(&mut self) {
        self.edit_target = None;
        self.disabled.remove(&Field::Advertiser);
        self.reset();
    }

    /// Validates and coerces; on failure the errors are kept on the form.
    pub fn validate(&mut self) -> std::result::Result<ClientFields, FormErrors> {
        let result = self.to_fields();
        if let Err(errors) = &result {
            self.errors = errors.clone();
        }
        result
    }

    pub fn to_fields(&self) -> std::result::Result<ClientFields, FormErrors> {
        let mut errors = FormErrors::new();
        for field in FORM_FIELDS {
            if field.is_required() && self.value(field).trim().is_empty() {
                errors.insert(field, FieldError::Required);
            }
        }

        let fields = ClientFields {
            advertiser: self.text(Field::Advertiser),
            directo: self.flag(Field::Directo, &mut errors),
            orion: self.flag(Field::Orion, &mut errors),
            kinesso: self.flag(Field::Kinesso, &mut errors),
            kinesso_type: self.kinesso_type(&mut errors),
            duo: self.flag(Field::Duo, &mut errors),
            available_dsp_equative: self.text(Field::AvailableDspEquative),
            notes1: self.text(Field::Notes1),
            notes2: self.text(Field::Notes2),
            available_deals_curados: self.text(Field::AvailableDealsCurados),
            estado: self.estado(&mut errors),
        };
        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(errors)
        }
    }

    /// Inserts, or updates the edit target. A duplicate advertiser is
    /// reported to `notifier` and leaves the form untouched; success resets
    /// the form and leaves edit mode.
    pub fn submit<S, N>(
        &mut self,
        store: &mut RecordStore<S>,
        notifier: &mut N,
        duration: Duration,
    ) -> Result<SubmitOutcome>
    where
        S: KeyValueStorage,
        N: Notifier + ?Sized,
    {
        let Ok(fields) = self.validate() else {
            return Ok(SubmitOutcome::Blocked);
        };
        let outcome = match self.edit_target.as_deref() {
            Some(id) => store.update(id, fields).map(SubmitOutcome::Updated),
            None => store.insert(fields).map(SubmitOutcome::Created),
        };
        match outcome {
            Ok(outcome) => {
                notifier.notify(SAVED_MESSAGE, duration);
                self.cancel_edit();
                Ok(outcome)
            }
            Err(err) => {
                if let ClientError::DuplicateAdvertiser { advertiser } = &err {
                    notifier.notify(duplicate_message(advertiser).as_str(), duration);
                }
                Err(err)
            }
        }
    }

    fn text(&self, field: Field) -> String {
        self.value(field).trim().to_string()
    }

    fn binary(&self, field: Field, errors: &mut FormErrors) -> bool {
        match self.value(field).trim() {
            "" | "0" => false,
            "1" => true,
            other => {
                errors.insert(
                    field,
                    FieldError::Invalid(format!("expected 0 or 1, got \"{other}\"")),
                );
                false
            }
        }
    }

    fn flag(&self, field: Field, errors: &mut FormErrors) -> Flag {
        Flag::from(self.binary(field, errors))
    }

    fn estado(&self, errors: &mut FormErrors) -> Estado {
        if self.binary(Field::Estado, errors) {
            Estado::Active
        } else {
            Estado::Inactive
        }
    }

    fn kinesso_type(&self, errors: &mut FormErrors) -> KinessoType {
        let raw = self.value(Field::KinessoType);
        if raw.trim().is_empty() {
            return KinessoType::Na;
        }
        match raw.parse::<KinessoType>() {
            Ok(kind) => kind,
            Err(err) => {
                errors.insert(Field::KinessoType, FieldError::Invalid(err.to_string()));
                KinessoType::Na
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::DEFAULT_STORAGE_KEY;
    use serde_json::{json, Value};

    #[derive(Default)]
    struct Messages(Vec<(String, Duration)>);

    impl Notifier for Messages {
        fn notify(&mut self, message: &str, duration: Duration) {
            self.0.push((message.to_string(), duration));
        }
    }

    const WAIT: Duration = Duration::from_millis(3000);

    fn store_with(entries: Value) -> RecordStore<MemoryStorage> {
        let storage = MemoryStorage::new().with_entry(DEFAULT_STORAGE_KEY, entries.to_string().as_str());
        let mut store = RecordStore::new(storage, DEFAULT_STORAGE_KEY);
        store.load(&Vec::<Value>::new()).unwrap();
        store
    }

    fn filled(advertiser: &str) -> ClientForm {
        let mut form = ClientForm::new();
        form.set(Field::Advertiser, advertiser);
        form.set(Field::Directo, "1");
        form.set(Field::Orion, "0");
        form.set(Field::Kinesso, "1");
        form.set(Field::KinessoType, "GLASS");
        form.set(Field::Duo, "0");
        form
    }

    #[test]
    fn new_form_holds_defaults_and_cannot_submit() {
        let form = ClientForm::new();
        assert_eq!(form.value(Field::Advertiser), "");
        assert_eq!(form.value(Field::Estado), "1");
        assert!(!form.can_submit());
        assert!(!form.is_editing());
    }

    #[test]
    fn coerces_strings_and_trims_text() {
        let mut form = filled("  Acme Corp ");
        form.set(Field::Notes1, "  first note  ");
        let fields = form.validate().unwrap();
        assert_eq!(fields.advertiser, "Acme Corp");
        assert_eq!(fields.directo, Flag::On);
        assert_eq!(fields.orion, Flag::Off);
        assert_eq!(fields.kinesso_type, KinessoType::Glass);
        assert_eq!(fields.notes1, "first note");
        assert_eq!(fields.notes2, "");
        assert_eq!(fields.estado, Estado::Active);
    }

    #[test]
    fn missing_required_fields_block_submission() {
        let mut store = store_with(json!([]));
        let mut messages = Messages::default();
        let mut form = ClientForm::new();
        form.set(Field::Advertiser, "Acme");

        let outcome = form.submit(&mut store, &mut messages, WAIT).unwrap();
        assert_eq!(outcome, SubmitOutcome::Blocked);
        assert!(store.is_empty());
        assert!(messages.0.is_empty());
        assert_eq!(form.errors().get(&Field::Directo), Some(&FieldError::Required));
        assert!(!form.errors().contains_key(&Field::Advertiser));
        assert!(!form.errors().contains_key(&Field::Notes1));
    }

    #[test]
    fn bad_flag_and_kinesso_type_are_invalid() {
        let mut form = filled("Acme");
        form.set(Field::Orion, "yes");
        form.set(Field::KinessoType, "METAL");
        let errors = form.validate().unwrap_err();
        assert!(matches!(errors.get(&Field::Orion), Some(FieldError::Invalid(_))));
        assert!(matches!(errors.get(&Field::KinessoType), Some(FieldError::Invalid(_))));

        form.set(Field::Orion, "1");
        assert!(!form.errors().contains_key(&Field::Orion));
    }

    #[test]
    fn successful_insert_notifies_and_resets() {
        let mut store = store_with(json!([]));
        let mut messages = Messages::default();
        let mut form = filled("Acme");

        let outcome = form.submit(&mut store, &mut messages, WAIT).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Created(ref r) if r.advertiser() == "Acme"));
        assert_eq!(store.len(), 1);
        assert_eq!(messages.0, vec![(SAVED_MESSAGE.to_string(), WAIT)]);
        assert_eq!(form.value(Field::Advertiser), "");
        assert!(form.errors().is_empty());
    }

    #[test]
    fn duplicate_insert_notifies_and_keeps_form() {
        let mut store = store_with(json!([{ "id": "a", "advertiser": "Acme Corp" }]));
        let mut messages = Messages::default();
        let mut form = filled(" acme corp ");

        let err = form.submit(&mut store, &mut messages, WAIT).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.len(), 1);
        assert_eq!(messages.0.len(), 1);
        assert_eq!(messages.0[0].0, duplicate_message("acme corp"));
        assert_eq!(form.value(Field::Advertiser), " acme corp ");
        assert_eq!(form.value(Field::KinessoType), "GLASS");
    }

    #[test]
    fn edit_mode_disables_advertiser_and_updates_in_place() {
        let mut store = store_with(json!([{ "id": "g", "advertiser": "Globex", "kinessoType": "NA" }]));
        let mut messages = Messages::default();
        let mut form = ClientForm::new();

        let record = store.get("g").unwrap().clone();
        form.begin_edit(&record);
        assert_eq!(form.edit_target(), Some("g"));
        assert!(form.is_disabled(Field::Advertiser));
        assert!(!form.set(Field::Advertiser, "Renamed"));
        assert_eq!(form.value(Field::Advertiser), "Globex");
        assert_eq!(form.value(Field::Directo), "0");

        form.set(Field::Notes2, "renewal in Q3");
        let outcome = form.submit(&mut store, &mut messages, WAIT).unwrap();
        match outcome {
            SubmitOutcome::Updated(updated) => {
                assert_eq!(updated.id, "g");
                assert_eq!(updated.fields.notes2, "renewal in Q3");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.len(), 1);
        assert!(!form.is_editing());
        assert!(!form.is_disabled(Field::Advertiser));
    }

    #[test]
    fn cancel_edit_resets_and_reenables() {
        let record = ClientRecord::new("g", ClientFields::new("Globex"));
        let mut form = ClientForm::new();
        form.begin_edit(&record);
        form.cancel_edit();
        assert_eq!(form.edit_target(), None);
        assert!(!form.is_disabled(Field::Advertiser));
        assert_eq!(form.value(Field::Advertiser), "");
        assert!(form.set(Field::Advertiser, "Another"));
    }

    #[test]
    fn id_is_not_a_form_field() {
        let mut form = ClientForm::new();
        assert!(!form.set(Field::Id, "forged"));
        assert_eq!(form.value(Field::Id), "");
    }
}
