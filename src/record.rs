use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::fields::Field;

/// Boolean persisted as the integer 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Flag {
    #[default]
    Off,
    On,
}

impl Flag {
    pub fn is_on(self) -> bool {
        self == Flag::On
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Flag::Off => 0,
            Flag::On => 1,
        }
    }
}

impl From<Flag> for u8 {
    fn from(value: Flag) -> Self {
        value.as_u8()
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Flag::On
        } else {
            Flag::Off
        }
    }
}

impl TryFrom<u8> for Flag {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Flag::Off),
            1 => Ok(Flag::On),
            other => Err(format!("flag must be 0 or 1, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KinessoType {
    Powerbox,
    Glass,
    #[default]
    Na,
}

impl KinessoType {
    pub const ALL: [KinessoType; 3] = [KinessoType::Powerbox, KinessoType::Glass, KinessoType::Na];

    pub fn as_str(self) -> &'static str {
        match self {
            KinessoType::Powerbox => "POWERBOX",
            KinessoType::Glass => "GLASS",
            KinessoType::Na => "NA",
        }
    }
}

impl fmt::Display for KinessoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KinessoType {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        KinessoType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ClientError::InvalidField {
                field: Field::KinessoType.key(),
                reason: format!("unknown kinesso type \"{wanted}\""),
            })
    }
}

/// Record status. Persisted as 1 (active) or 0 (inactive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Estado {
    Inactive,
    #[default]
    Active,
}

impl Estado {
    pub fn as_u8(self) -> u8 {
        match self {
            Estado::Inactive => 0,
            Estado::Active => 1,
        }
    }
}

impl From<Estado> for u8 {
    fn from(value: Estado) -> Self {
        value.as_u8()
    }
}

impl TryFrom<u8> for Estado {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Estado::Inactive),
            1 => Ok(Estado::Active),
            other => Err(format!("estado must be 0 or 1, got {other}")),
        }
    }
}

/// Everything a client record carries except its id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFields {
    pub advertiser: String,
    pub directo: Flag,
    pub orion: Flag,
    pub kinesso: Flag,
    pub kinesso_type: KinessoType,
    pub duo: Flag,
    pub available_dsp_equative: String,
    pub notes1: String,
    pub notes2: String,
    pub available_deals_curados: String,
    pub estado: Estado,
}

impl ClientFields {
    pub fn new(advertiser: impl Into<String>) -> Self {
        Self {
            advertiser: advertiser.into(),
            ..Self::default()
        }
    }

    /// The uniqueness key for `advertiser`.
    pub fn advertiser_key(&self) -> String {
        normalize_advertiser(self.advertiser.as_str())
    }

    /// Display and form representation of a single field.
    pub fn value_string(&self, field: Field) -> String {
        match field {
            Field::Id => String::new(),
            Field::Advertiser => self.advertiser.clone(),
            Field::Directo => self.directo.as_u8().to_string(),
            Field::Orion => self.orion.as_u8().to_string(),
            Field::Kinesso => self.kinesso.as_u8().to_string(),
            Field::KinessoType => self.kinesso_type.as_str().to_string(),
            Field::Duo => self.duo.as_u8().to_string(),
            Field::AvailableDspEquative => self.available_dsp_equative.clone(),
            Field::Notes1 => self.notes1.clone(),
            Field::Notes2 => self.notes2.clone(),
            Field::AvailableDealsCurados => self.available_deals_curados.clone(),
            Field::Estado => self.estado.as_u8().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: ClientFields,
}

impl ClientRecord {
    pub fn new(id: impl Into<String>, fields: ClientFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn advertiser(&self) -> &str {
        self.fields.advertiser.as_str()
    }

    pub fn is_active(&self) -> bool {
        self.fields.estado == Estado::Active
    }

    pub fn value_string(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.clone(),
            other => self.fields.value_string(other),
        }
    }
}

pub fn normalize_advertiser(value: &str) -> String {
    value.trim().to_lowercase()
}
