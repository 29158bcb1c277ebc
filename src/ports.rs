//! Collaborators the core reports to. Rendering is theirs.

use std::time::Duration;

use log::info;

use crate::record::ClientRecord;

/// Transient user notification, e.g. a snackbar.
pub trait Notifier {
    fn notify(&mut self, message: &str, duration: Duration);
}

/// Receives the filtered rows. Pagination and sorting happen on its side.
pub trait TableSink {
    fn show(&mut self, rows: &[ClientRecord]);
}

/// Notifier for headless use: messages go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str, duration: Duration) {
        info!("notify ({} ms): {message}", duration.as_millis());
    }
}

impl<T: Notifier + ?Sized> Notifier for &mut T {
    fn notify(&mut self, message: &str, duration: Duration) {
        (**self).notify(message, duration)
    }
}

impl<T: TableSink + ?Sized> TableSink for &mut T {
    fn show(&mut self, rows: &[ClientRecord]) {
        (**self).show(rows)
    }
}
