//! One handler per UI event. Every mutation is followed by a full
//! recompute of the filtered rows, which are pushed to the table.

use std::time::Duration;

use log::debug;

use crate::bootstrap::BootstrapSource;
use crate::config::StoreConfig;
use crate::error::{ClientError, Result};
use crate::filter::FilterView;
use crate::form::{ClientForm, SubmitOutcome};
use crate::ports::{Notifier, TableSink};
use crate::record::ClientRecord;
use crate::storage::KeyValueStorage;
use crate::store::RecordStore;

pub struct ClientScreen<S, N, T> {
    store: RecordStore<S>,
    form: ClientForm,
    view: FilterView,
    notifier: N,
    table: T,
    notify_duration: Duration,
}

impl<S, N, T> ClientScreen<S, N, T>
where
    S: KeyValueStorage,
    N: Notifier,
    T: TableSink,
{
    pub fn open<B: BootstrapSource + ?Sized>(
        config: &StoreConfig,
        storage: S,
        bootstrap: &B,
        notifier: N,
        table: T,
    ) -> Result<Self> {
        let mut store = RecordStore::from_config(storage, config);
        store.load(bootstrap)?;
        let mut screen = Self {
            store,
            form: ClientForm::new(),
            view: FilterView::new(),
            notifier,
            table,
            notify_duration: config.notify_duration(),
        };
        screen.publish();
        Ok(screen)
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    pub fn form(&self) -> &ClientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ClientForm {
        &mut self.form
    }

    pub fn rows(&self) -> &[ClientRecord] {
        self.view.rows()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn set_filter(&mut self, query: &str) {
        self.view.set_query(query, self.store.records());
        self.table.show(self.view.rows());
    }

    /// Row activation: load the record into the form for editing.
    pub fn activate_row(&mut self, id: &str) -> Result<()> {
        let Some(record) = self.store.get(id) else {
            return Err(ClientError::NotFound { id: id.to_string() });
        };
        self.form.begin_edit(record);
        debug!("editing client {id}");
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.form.cancel_edit();
    }

    pub fn submit(&mut self) -> Result<SubmitOutcome> {
        let outcome = self
            .form
            .submit(&mut self.store, &mut self.notifier, self.notify_duration)?;
        if !matches!(outcome, SubmitOutcome::Blocked) {
            self.publish();
        }
        Ok(outcome)
    }

    fn publish(&mut self) {
        self.view.refresh(self.store.records());
        self.table.show(self.view.rows());
    }
}
