//! Field metadata for client records.
//!
//! Every place that needs a persistence key, a legacy key or a display label
//! looks it up here. Rows in [`CLIENT_FIELDS`] are ordered like the [`Field`]
//! variants so a field indexes its own row.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    Advertiser,
    Directo,
    Orion,
    Kinesso,
    KinessoType,
    Duo,
    AvailableDspEquative,
    Notes1,
    Notes2,
    AvailableDealsCurados,
    Estado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    Text,
    Flag,
    KinessoType,
    Estado,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// Lower-case key used by the display layer and preferred on read.
    pub key: &'static str,
    /// Upper-case key from the original schema.
    pub legacy_key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Value the form shows after a reset.
    pub form_default: &'static str,
}

pub static CLIENT_FIELDS: [FieldSpec; 12] = [
    FieldSpec {
        field: Field::Id,
        key: "id",
        legacy_key: "ID",
        label: "Id",
        kind: FieldKind::Id,
        required: false,
        form_default: "",
    },
    FieldSpec {
        field: Field::Advertiser,
        key: "advertiser",
        legacy_key: "ADVERTISER",
        label: "Advertiser",
        kind: FieldKind::Text,
        required: true,
        form_default: "",
    },
    FieldSpec {
        field: Field::Directo,
        key: "directo",
        legacy_key: "DIRECTO",
        label: "Directo",
        kind: FieldKind::Flag,
        required: true,
        form_default: "",
    },
    FieldSpec {
        field: Field::Orion,
        key: "orion",
        legacy_key: "ORION",
        label: "Orion",
        kind: FieldKind::Flag,
        required: true,
        form_default: "",
    },
    FieldSpec {
        field: Field::Kinesso,
        key: "kinesso",
        legacy_key: "KINESSO",
        label: "Kinesso",
        kind: FieldKind::Flag,
        required: true,
        form_default: "",
    },
    FieldSpec {
        field: Field::KinessoType,
        key: "kinessoType",
        legacy_key: "KINESSO_TYPE",
        label: "Kinesso Type",
        kind: FieldKind::KinessoType,
        required: true,
        form_default: "",
    },
    FieldSpec {
        field: Field::Duo,
        key: "duo",
        legacy_key: "DUO",
        label: "Duo",
        kind: FieldKind::Flag,
        required: true,
        form_default: "",
    },
    FieldSpec {
        field: Field::AvailableDspEquative,
        key: "availableDspEquative",
        legacy_key: "AVAILABLE_DSP_EQUATIVE",
        label: "Available DSP Equative",
        kind: FieldKind::Text,
        required: false,
        form_default: "",
    },
    FieldSpec {
        field: Field::Notes1,
        key: "notes1",
        legacy_key: "NOTES_1",
        label: "Notes 1",
        kind: FieldKind::Text,
        required: false,
        form_default: "",
    },
    FieldSpec {
        field: Field::Notes2,
        key: "notes2",
        legacy_key: "NOTES_2",
        label: "Notes 2",
        kind: FieldKind::Text,
        required: false,
        form_default: "",
    },
    FieldSpec {
        field: Field::AvailableDealsCurados,
        key: "availableDealsCurados",
        legacy_key: "AVAILABLE_DEALS_CURADOS",
        label: "Available Deals Curados",
        kind: FieldKind::Text,
        required: false,
        form_default: "",
    },
    FieldSpec {
        field: Field::Estado,
        key: "estado",
        legacy_key: "ESTADO",
        label: "Estado",
        kind: FieldKind::Estado,
        required: true,
        form_default: "1",
    },
];

/// Fields the form edits, in display order.
pub const FORM_FIELDS: [Field; 11] = [
    Field::Advertiser,
    Field::Directo,
    Field::Orion,
    Field::Kinesso,
    Field::KinessoType,
    Field::Duo,
    Field::AvailableDspEquative,
    Field::Notes1,
    Field::Notes2,
    Field::AvailableDealsCurados,
    Field::Estado,
];

impl Field {
    pub fn spec(self) -> &'static FieldSpec {
        &CLIENT_FIELDS[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn legacy_key(self) -> &'static str {
        self.spec().legacy_key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    pub fn is_required(self) -> bool {
        self.spec().required
    }

    /// Resolves either naming convention back to a field.
    pub fn from_key(key: &str) -> Option<Field> {
        CLIENT_FIELDS
            .iter()
            .find(|spec| spec.key == key || spec.legacy_key == key)
            .map(|spec| spec.field)
    }
}
