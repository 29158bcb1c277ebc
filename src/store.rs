//! Authoritative list of client records and its persistence.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::bootstrap::BootstrapSource;
use crate::config::StoreConfig;
use crate::error::{ClientError, Result};
use crate::fields::Field;
use crate::ids::IdGenerator;
use crate::normalize::{normalize_bootstrap_entry, normalize_persisted, to_persisted_array};
use crate::record::{ClientFields, ClientRecord};
use crate::storage::KeyValueStorage;

pub const DEFAULT_STORAGE_KEY: &str = "clientesKinesso";
/// Version 1 is the unmarked legacy layout; it reads the same way.
pub const SCHEMA_VERSION: u8 = 2;

pub struct RecordStore<S> {
    storage: S,
    key: String,
    write_legacy_keys: bool,
    ids: IdGenerator,
    records: Vec<ClientRecord>,
}

impl<S: KeyValueStorage> RecordStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            write_legacy_keys: true,
            ids: IdGenerator::new(),
            records: Vec::new(),
        }
    }

    pub fn from_config(storage: S, config: &StoreConfig) -> Self {
        Self::new(storage, config.storage_key.as_str()).with_legacy_keys(config.write_legacy_keys)
    }

    pub fn with_legacy_keys(mut self, enabled: bool) -> Self {
        self.write_legacy_keys = enabled;
        self
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn version_key(&self) -> String {
        format!("{}.version", self.key)
    }

    pub fn records(&self) -> &[ClientRecord] {
        self.records.as_slice()
    }

    pub fn get(&self, id: &str) -> Option<&ClientRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads the persisted list, seeding it from `bootstrap` first when the
    /// key has never been written.
    pub fn load<B: BootstrapSource + ?Sized>(&mut self, bootstrap: &B) -> Result<&[ClientRecord]> {
        let records = match self.storage.get(self.key.as_str())? {
            Some(raw) => {
                self.check_version()?;
                let records = normalize_persisted(self.key.as_str(), raw.as_str())?;
                warn_duplicate_advertisers(self.key.as_str(), &records);
                info!("loaded {} clients from \"{}\"", records.len(), self.key);
                records
            }
            None => {
                let seeded = self.seed(bootstrap)?;
                info!(
                    "seeded \"{}\" with {} clients from bootstrap data",
                    self.key,
                    seeded.len()
                );
                Self::write(&mut self.storage, self.key.as_str(), &seeded, self.write_legacy_keys)?;
                seeded
            }
        };
        self.records = records;
        Ok(self.records.as_slice())
    }

    /// Persists `records` as the full list, replacing prior contents.
    /// Derived views are not refreshed here.
    pub fn save(&mut self, records: Vec<ClientRecord>) -> Result<()> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut advertisers = HashSet::with_capacity(records.len());
        for record in records.iter() {
            if record.id.trim().is_empty() {
                return Err(ClientError::InvalidField {
                    field: Field::Id.key(),
                    reason: "id must not be empty".to_string(),
                });
            }
            if !seen.insert(record.id.as_str()) {
                return Err(ClientError::InvalidField {
                    field: Field::Id.key(),
                    reason: format!("duplicate id {}", record.id),
                });
            }
            if !advertisers.insert(record.fields.advertiser_key()) {
                return Err(ClientError::DuplicateAdvertiser {
                    advertiser: record.fields.advertiser.trim().to_string(),
                });
            }
        }
        Self::write(&mut self.storage, self.key.as_str(), &records, self.write_legacy_keys)?;
        self.records = records;
        Ok(())
    }

    pub fn insert(&mut self, fields: ClientFields) -> Result<ClientRecord> {
        require_advertiser(&fields)?;
        let wanted = fields.advertiser_key();
        if self
            .records
            .iter()
            .any(|record| record.fields.advertiser_key() == wanted)
        {
            warn!("rejected duplicate advertiser \"{}\"", fields.advertiser.trim());
            return Err(ClientError::DuplicateAdvertiser {
                advertiser: fields.advertiser.trim().to_string(),
            });
        }

        let id = self.fresh_id();
        self.records.push(ClientRecord::new(id, fields));
        if let Err(err) =
            Self::write(&mut self.storage, self.key.as_str(), &self.records, self.write_legacy_keys)
        {
            self.records.pop();
            return Err(err);
        }
        let created = self.records[self.records.len() - 1].clone();
        debug!("inserted client {} ({})", created.id, created.advertiser());
        Ok(created)
    }

    /// Replaces the fields of record `id`. The id never changes and the
    /// record's own prior advertiser does not count as a duplicate.
    pub fn update(&mut self, id: &str, fields: ClientFields) -> Result<ClientRecord> {
        let Some(idx) = self.records.iter().position(|record| record.id == id) else {
            return Err(ClientError::NotFound { id: id.to_string() });
        };
        require_advertiser(&fields)?;
        let wanted = fields.advertiser_key();
        // An unchanged advertiser is never a collision, even when a loaded
        // list already holds it twice.
        let renamed = wanted != self.records[idx].fields.advertiser_key();
        if renamed
            && self
                .records
                .iter()
                .enumerate()
                .any(|(pos, record)| pos != idx && record.fields.advertiser_key() == wanted)
        {
            warn!(
                "rejected update of {id}: advertiser \"{}\" belongs to another client",
                fields.advertiser.trim()
            );
            return Err(ClientError::DuplicateAdvertiser {
                advertiser: fields.advertiser.trim().to_string(),
            });
        }

        let previous = std::mem::replace(&mut self.records[idx].fields, fields);
        if let Err(err) =
            Self::write(&mut self.storage, self.key.as_str(), &self.records, self.write_legacy_keys)
        {
            self.records[idx].fields = previous;
            return Err(err);
        }
        debug!("updated client {id}");
        Ok(self.records[idx].clone())
    }

    fn seed<B: BootstrapSource + ?Sized>(&mut self, bootstrap: &B) -> Result<Vec<ClientRecord>> {
        let raw = bootstrap.raw_records()?;
        let mut seen = HashSet::with_capacity(raw.len());
        let mut out = Vec::with_capacity(raw.len());
        for (idx, entry) in raw.iter().enumerate() {
            let fields = normalize_bootstrap_entry(idx, entry)?;
            if !seen.insert(fields.advertiser_key()) {
                warn!(
                    "skipping bootstrap entry {idx}: advertiser \"{}\" already seeded",
                    fields.advertiser.trim()
                );
                continue;
            }
            out.push(ClientRecord::new(self.ids.next_id(), fields));
        }
        Ok(out)
    }

    fn check_version(&self) -> Result<()> {
        let version_key = self.version_key();
        let Some(raw) = self.storage.get(version_key.as_str())? else {
            return Ok(());
        };
        let found = raw.trim().parse::<i64>().map_err(|_| {
            ClientError::corrupt(version_key.as_str(), format!("invalid version marker \"{raw}\""))
        })?;
        if found > SCHEMA_VERSION as i64 {
            return Err(ClientError::UnsupportedVersion {
                found,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = self.ids.next_id();
            if self.get(id.as_str()).is_none() {
                return id;
            }
        }
    }

    fn write(storage: &mut S, key: &str, records: &[ClientRecord], with_legacy: bool) -> Result<()> {
        let content = serde_json::to_string(&to_persisted_array(records, with_legacy))?;
        // Marker first: the data key is the last write, so a failure leaves
        // the previous list in place.
        storage.set(format!("{key}.version").as_str(), SCHEMA_VERSION.to_string().as_str())?;
        storage.set(key, content.as_str())?;
        debug!("saved {} clients to \"{key}\"", records.len());
        Ok(())
    }
}

fn require_advertiser(fields: &ClientFields) -> Result<()> {
    if fields.advertiser.trim().is_empty() {
        return Err(ClientError::InvalidField {
            field: Field::Advertiser.key(),
            reason: "advertiser is required".to_string(),
        });
    }
    Ok(())
}

fn warn_duplicate_advertisers(key: &str, records: &[ClientRecord]) {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.fields.advertiser_key()) {
            warn!(
                "\"{key}\" holds a duplicate advertiser \"{}\" (client {})",
                record.advertiser(),
                record.id
            );
        }
    }
}
