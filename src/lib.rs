//! Core of the Kinesso advertiser client screen.
//!
//! Client records live in key-value storage under `clientesKinesso`. Stored
//! entries may use the upper-case legacy keys, the lower-case display keys,
//! or both; [`normalize`] folds them into one [`ClientRecord`] shape on read.
//! [`RecordStore`] owns the list and enforces advertiser uniqueness,
//! [`ClientForm`] turns form strings into records, and [`ClientScreen`]
//! wires both to a notifier and a table through [`ports`].

pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fields;
pub mod filter;
pub mod form;
pub mod ids;
pub mod normalize;
pub mod ports;
pub mod record;
pub mod screen;
pub mod storage;
pub mod store;

pub use bootstrap::{BootstrapSource, JsonBootstrap};
pub use config::StoreConfig;
pub use error::{ClientError, Result};
pub use fields::{Field, FieldKind, FieldSpec, CLIENT_FIELDS, FORM_FIELDS};
pub use filter::{filter_by_advertiser, FilterView};
pub use form::{ClientForm, FieldError, FormErrors, SubmitOutcome};
pub use ids::IdGenerator;
pub use ports::{LogNotifier, Notifier, TableSink};
pub use record::{normalize_advertiser, ClientFields, ClientRecord, Estado, Flag, KinessoType};
pub use screen::ClientScreen;
pub use storage::{EncryptedFileStorage, FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{RecordStore, DEFAULT_STORAGE_KEY, SCHEMA_VERSION};
