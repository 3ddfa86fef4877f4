//! Batch session: apply, then finalize or roll back
//!
//! The Gateway has no transactions. A session gets close to one by creating
//! versions and files invisible, flipping them visible only after the whole
//! batch applied, and replaying its ledger backwards as compensation when
//! anything fails.

use crate::api::{CatalogApi, ClientError, Metadata, RecordId};

use super::error::SyncError;
use super::handlers::{self, Applied, HandlerContext};
use super::identity::CatalogIndex;
use super::ledger::{Ledger, LedgerEntry, ParentIds};
use super::log::SyncLog;
use super::sequencer::sort_items;
use super::types::{Action, CatalogItem, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Applying,
    Finalized,
    RollingBack,
    RolledBack,
}

/// Counts gathered while a batch runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Records made visible (or left invisible on request) by finalize
    pub finalized: usize,
    /// Ledger entries successfully compensated during rollback
    pub compensated: usize,
    /// Compensation steps that failed or were impossible
    pub compensation_failures: usize,
    pub state: BatchState,
}

impl Default for BatchReport {
    fn default() -> Self {
        Self {
            created: 0,
            updated: 0,
            deleted: 0,
            finalized: 0,
            compensated: 0,
            compensation_failures: 0,
            state: BatchState::Pending,
        }
    }
}

impl BatchReport {
    fn record(&mut self, applied: &Applied) {
        match applied.action {
            Action::Create => self.created += 1,
            Action::Update => self.updated += 1,
            Action::Delete => self.deleted += 1,
        }
    }

    pub fn applied(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// One run of a batch against the Gateway.
///
/// Owns the identity index and the ledger for exactly one batch; create a
/// new session per batch.
pub struct SyncSession<'a, C: CatalogApi + ?Sized> {
    client: &'a C,
    log: &'a dyn SyncLog,
    index: CatalogIndex,
    ledger: Ledger,
    report: BatchReport,
}

impl<'a, C: CatalogApi + ?Sized> SyncSession<'a, C> {
    pub fn new(client: &'a C, log: &'a dyn SyncLog) -> Self {
        Self {
            client,
            log,
            index: CatalogIndex::new(),
            ledger: Ledger::new(),
            report: BatchReport::default(),
        }
    }

    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    fn set_state(&mut self, state: BatchState) {
        self.log
            .debug(&format!("batch state {:?} -> {:?}", self.report.state, state));
        self.report.state = state;
    }

    /// Sequence and apply `items`, then finalize.
    ///
    /// On any failure the ledger is rolled back and the failure that caused
    /// it is returned.
    pub async fn run(&mut self, items: Vec<CatalogItem>) -> Result<BatchReport, SyncError> {
        if self.report.state != BatchState::Pending {
            return Err(SyncError::InvalidState(self.report.state));
        }
        self.set_state(BatchState::Applying);

        let items = sort_items(items);
        self.log
            .info(&format!("Applying {} catalog item(s)", items.len()));

        for mut item in items {
            let mut ctx = HandlerContext {
                client: self.client,
                index: &mut self.index,
                ledger: &mut self.ledger,
                log: self.log,
            };
            match handlers::apply(&mut ctx, &mut item).await {
                Ok(applied) => self.report.record(&applied),
                Err(err) => return Err(self.abort(err).await),
            }
        }

        match self.finalize().await {
            Ok(finalized) => {
                self.report.finalized = finalized;
                self.set_state(BatchState::Finalized);
                self.log.info(&format!(
                    "Batch complete: {} created, {} updated, {} deleted",
                    self.report.created, self.report.updated, self.report.deleted
                ));
                Ok(self.report.clone())
            }
            Err(err) => Err(self.abort(err).await),
        }
    }

    async fn abort(&mut self, err: SyncError) -> SyncError {
        self.log.exception(
            &format!("Batch failed, rolling back {} change(s)", self.ledger.len()),
            &err,
        );
        self.set_state(BatchState::RollingBack);
        self.rollback().await;
        self.set_state(BatchState::RolledBack);
        err
    }

    /// Set the requested visibility on every version and file created in
    /// this batch. Returns how many records were touched.
    async fn finalize(&mut self) -> Result<usize, SyncError> {
        let mut finalized = 0;
        for entry in self.ledger.iter_rev() {
            let LedgerEntry::Created {
                key,
                id,
                parents,
                invisible,
            } = entry
            else {
                continue;
            };
            if key.kind() == EntityKind::Product {
                continue;
            }

            self.log.info(&format!(
                "finalize: setting invisible={} on {} {} (id {})",
                invisible,
                key.kind(),
                key,
                id
            ));
            let mut record = fetch_record(self.client, key.kind(), *id, *parents).await?;
            record.insert("id".into(), (*id).into());
            record.insert("invisible".into(), (*invisible).into());
            update_record(self.client, key.kind(), *parents, &record).await?;
            finalized += 1;
        }
        Ok(finalized)
    }

    /// Compensate the ledger newest first. Failures are logged and skipped.
    async fn rollback(&mut self) {
        for entry in self.ledger.iter_rev() {
            let kind = entry.kind();
            let key = entry.key();
            let id = entry.id();

            let result = match entry {
                LedgerEntry::Created { parents, .. } => {
                    self.log
                        .info(&format!("rollback: deleting {} {} (id {})", kind, key, id));
                    delete_record(self.client, kind, id, *parents).await
                }
                LedgerEntry::Updated {
                    parents, pre_image, ..
                } => {
                    self.log
                        .info(&format!("rollback: restoring {} {} (id {})", kind, key, id));
                    let mut restored = pre_image.clone();
                    restored.insert("id".into(), id.into());
                    update_record(self.client, kind, *parents, &restored).await
                }
                LedgerEntry::Deleted { .. } => {
                    self.log.warning(&format!(
                        "rollback: {} {} (id {}) was deleted and cannot be restored",
                        kind, key, id
                    ));
                    self.report.compensation_failures += 1;
                    continue;
                }
            };

            match result {
                Ok(()) => self.report.compensated += 1,
                Err(err) => {
                    self.report.compensation_failures += 1;
                    self.log.exception(
                        &format!("rollback: failed to undo {} of {} {}", entry.label(), kind, key),
                        &err,
                    );
                }
            }
        }
    }
}

async fn fetch_record<C>(
    client: &C,
    kind: EntityKind,
    id: RecordId,
    parents: ParentIds,
) -> Result<Metadata, ClientError>
where
    C: CatalogApi + ?Sized,
{
    match (kind, parents.product_id, parents.version_id) {
        (EntityKind::Product, _, _) => client.get_product(id).await,
        (EntityKind::Version, Some(pid), _) => client.get_version(pid, id).await,
        (EntityKind::File, Some(pid), Some(vid)) => client.get_file(pid, vid, id).await,
        _ => Err(missing_parents(kind, id)),
    }
}

async fn update_record<C>(
    client: &C,
    kind: EntityKind,
    parents: ParentIds,
    record: &Metadata,
) -> Result<(), ClientError>
where
    C: CatalogApi + ?Sized,
{
    match (kind, parents.product_id, parents.version_id) {
        (EntityKind::Product, _, _) => client.update_product(record).await,
        (EntityKind::Version, Some(pid), _) => client.update_version(pid, record).await,
        (EntityKind::File, Some(pid), Some(vid)) => client.update_file(pid, vid, record).await,
        _ => Err(missing_parents(
            kind,
            record.get("id").and_then(|v| v.as_u64()).unwrap_or_default(),
        )),
    }
}

async fn delete_record<C>(
    client: &C,
    kind: EntityKind,
    id: RecordId,
    parents: ParentIds,
) -> Result<(), ClientError>
where
    C: CatalogApi + ?Sized,
{
    match (kind, parents.product_id, parents.version_id) {
        (EntityKind::Product, _, _) => client.delete_product(id).await,
        (EntityKind::Version, Some(pid), _) => client.delete_version(pid, id).await,
        (EntityKind::File, Some(pid), Some(vid)) => client.delete_file(pid, vid, id).await,
        _ => Err(missing_parents(kind, id)),
    }
}

fn missing_parents(kind: EntityKind, id: RecordId) -> ClientError {
    ClientError::Decode(format!("no parent ids recorded for {} {}", kind, id))
}
