//! CRUD orchestrator for one collection.
//!
//! ```text
//! Loading -> Listing <-> Editing
//!            Listing -> ConfirmingDelete -> Listing
//! ```
//!
//! Every successful write goes back through `Loading`: the fetched list is
//! never patched locally.

pub mod filter;
pub mod view;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::database::record::{Record, RecordError};
use crate::editor::GenericEditor;
use crate::schema::CollectionSpec;
use crate::store::{DataStore, Query, StoreError};
use crate::table::{DataTable, TableAction};

pub use filter::{filter_options, ALL_FILTER, ALL_FILTER_LABEL};
pub use view::{DeleteConfirmation, FilterOption, Notice, NoticeLevel, SectionView};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectionError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },

    #[error("No record with id {0} in this section")]
    RecordNotFound(String),

    #[error("Unknown filter value '{0}'")]
    UnknownFilter(String),

    #[error(transparent)]
    Validation(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SectionError {
    pub fn user_message(&self) -> String {
        match self {
            SectionError::Validation(e) => e.user_message(),
            SectionError::Store(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SectionState {
    Loading,
    Listing,
    Editing(Box<GenericEditor>),
    ConfirmingDelete(Record),
}

impl SectionState {
    pub fn name(&self) -> &'static str {
        match self {
            SectionState::Loading => "loading",
            SectionState::Listing => "listing",
            SectionState::Editing(_) => "editing",
            SectionState::ConfirmingDelete(_) => "confirming-delete",
        }
    }
}

/// Identifies one fetch. A response is applied only if its ticket is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub collection: &'static str,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Inserted,
    Updated,
}

pub struct AdminSection {
    spec: &'static CollectionSpec,
    store: Arc<dyn DataStore>,
    state: SectionState,
    records: Vec<Record>,
    active_filter: String,
    generation: u64,
    notice: Option<Notice>,
}

impl AdminSection {
    pub fn new(spec: &'static CollectionSpec, store: Arc<dyn DataStore>) -> Self {
        Self {
            spec,
            store,
            state: SectionState::Loading,
            records: Vec::new(),
            active_filter: ALL_FILTER.to_string(),
            generation: 0,
            notice: None,
        }
    }

    pub fn spec(&self) -> &'static CollectionSpec {
        self.spec
    }

    pub fn state(&self) -> &SectionState {
        &self.state
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn active_filter(&self) -> &str {
        &self.active_filter
    }

    fn invalid(&self, action: &'static str) -> SectionError {
        SectionError::InvalidTransition { action, state: self.state.name() }
    }

    // ========================================
    // Fetching
    // ========================================

    pub fn query(&self) -> Query {
        Query::new().order_by(self.spec.order_by)
    }

    /// Enter `Loading` and issue a ticket for the fetch about to start
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.state = SectionState::Loading;
        FetchTicket { collection: self.spec.table, generation: self.generation }
    }

    /// Apply a fetch result. Returns false when the ticket is stale and the result was dropped.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Record>, StoreError>) -> bool {
        let current = FetchTicket { collection: self.spec.table, generation: self.generation };
        if ticket != current {
            warn!(
                "Discarding stale fetch of {} (generation {}, current {} generation {})",
                ticket.collection, ticket.generation, current.collection, current.generation
            );
            return false;
        }

        match result {
            Ok(records) => {
                info!("Loaded {} records from {}", records.len(), self.spec.table);
                self.records = records;
            }
            Err(e) => {
                warn!("Loading {} failed: {}", self.spec.table, e);
                self.records.clear();
                self.notice = Some(Notice::error(e.user_message()));
            }
        }
        self.state = SectionState::Listing;
        true
    }

    /// Fetch the collection in its configured order
    pub async fn load(&mut self) -> Result<usize, SectionError> {
        let ticket = self.begin_fetch();
        let store = Arc::clone(&self.store);
        let query = self.query();
        let result = store.select(self.spec.table, &query).await;

        let failure = result.as_ref().err().cloned();
        self.finish_fetch(ticket, result);
        match failure {
            Some(e) => Err(SectionError::Store(e)),
            None => Ok(self.records.len()),
        }
    }

    /// Point the section at another collection: filter reset, in-flight fetches invalidated
    pub fn switch_collection(&mut self, spec: &'static CollectionSpec) {
        debug!("Switching section from {} to {}", self.spec.table, spec.table);
        self.spec = spec;
        self.records.clear();
        self.active_filter = ALL_FILTER.to_string();
        self.notice = None;
        self.generation += 1;
        self.state = SectionState::Loading;
    }

    // ========================================
    // Editing
    // ========================================

    pub fn add(&mut self) -> Result<(), SectionError> {
        if !matches!(self.state, SectionState::Listing) {
            return Err(self.invalid("add"));
        }
        self.state = SectionState::Editing(Box::new(GenericEditor::new(Record::new(), self.spec.fields)));
        Ok(())
    }

    pub fn edit(&mut self, id: &str) -> Result<(), SectionError> {
        if !matches!(self.state, SectionState::Listing) {
            return Err(self.invalid("edit"));
        }
        let record = self.find(id)?.clone();
        self.state = SectionState::Editing(Box::new(GenericEditor::new(record, self.spec.fields)));
        Ok(())
    }

    fn find(&self, id: &str) -> Result<&Record, SectionError> {
        self.records
            .iter()
            .find(|r| r.id().as_deref() == Some(id))
            .ok_or_else(|| SectionError::RecordNotFound(id.to_string()))
    }

    /// Route a table action to the matching transition
    pub fn dispatch(&mut self, action: TableAction) -> Result<(), SectionError> {
        match action {
            TableAction::Add => self.add(),
            TableAction::Edit(id) => self.edit(&id),
            TableAction::Delete(id) => self.request_delete(&id),
        }
    }

    pub fn editor(&self) -> Option<&GenericEditor> {
        match &self.state {
            SectionState::Editing(editor) => Some(&**editor),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut GenericEditor> {
        match &mut self.state {
            SectionState::Editing(editor) => Some(&mut **editor),
            _ => None,
        }
    }

    /// Drop the draft without writing anything
    pub fn cancel_edit(&mut self) -> Result<(), SectionError> {
        if !matches!(self.state, SectionState::Editing(_)) {
            return Err(self.invalid("cancel editing"));
        }
        self.state = SectionState::Listing;
        Ok(())
    }

    fn reject(&mut self, err: SectionError) -> SectionError {
        let message = err.user_message();
        warn!("Save on {} rejected: {}", self.spec.table, err);
        if let Some(editor) = self.editor_mut() {
            editor.set_form_error(Some(message.clone()));
        }
        self.notice = Some(Notice::alert(message));
        err
    }

    /// Write the draft: update when it carries an id, insert otherwise.
    /// On failure the section stays in `Editing` with the draft untouched.
    pub async fn save(&mut self) -> Result<SaveKind, SectionError> {
        let submitted = match &mut self.state {
            SectionState::Editing(editor) => editor.submit(),
            _ => return Err(self.invalid("save")),
        };
        let draft = match submitted {
            Ok(draft) => draft,
            Err(e) => return Err(self.reject(e.into())),
        };
        if let Err(e) = (self.spec.validate)(&draft) {
            return Err(self.reject(e.into()));
        }

        let store = Arc::clone(&self.store);
        let table = self.spec.table;
        let (kind, result) = match draft.id() {
            Some(id) => (SaveKind::Updated, store.update(table, &id, draft).await),
            None => (SaveKind::Inserted, store.insert(table, draft).await),
        };
        if let Err(e) = result {
            return Err(self.reject(e.into()));
        }

        info!("{:?} record in {}", kind, table);
        self.notice = None;
        if let Err(e) = self.load().await {
            warn!("Refetch of {} after save failed: {}", table, e);
        }
        Ok(kind)
    }

    // ========================================
    // Deleting
    // ========================================

    pub fn request_delete(&mut self, id: &str) -> Result<(), SectionError> {
        if !matches!(self.state, SectionState::Listing) {
            return Err(self.invalid("delete"));
        }
        let record = self.find(id)?.clone();
        self.state = SectionState::ConfirmingDelete(record);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        if matches!(self.state, SectionState::ConfirmingDelete(_)) {
            self.state = SectionState::Listing;
        }
    }

    /// Delete the record awaiting confirmation. Returns false when nothing was deleted.
    pub async fn confirm_delete(&mut self) -> Result<bool, SectionError> {
        let id = match &self.state {
            SectionState::ConfirmingDelete(record) => record.id(),
            _ => return Ok(false),
        };
        self.state = SectionState::Listing;
        let Some(id) = id else {
            return Ok(false);
        };

        let store = Arc::clone(&self.store);
        if let Err(e) = store.delete(self.spec.table, &id).await {
            let err = SectionError::Store(e);
            warn!("Delete on {} failed: {}", self.spec.table, err);
            self.notice = Some(Notice::alert(err.user_message()));
            return Err(err);
        }

        info!("Deleted record {} from {}", id, self.spec.table);
        if let Err(e) = self.load().await {
            warn!("Refetch of {} after delete failed: {}", self.spec.table, e);
        }
        Ok(true)
    }

    // ========================================
    // Filtering
    // ========================================

    /// Empty when the collection has no filter column
    pub fn filter_options(&self) -> Vec<String> {
        match self.spec.filter_by {
            Some(key) => filter_options(&self.records, key),
            None => Vec::new(),
        }
    }

    pub fn set_filter(&mut self, value: &str) -> Result<(), SectionError> {
        if value == ALL_FILTER || self.filter_options().iter().any(|o| o == value) {
            self.active_filter = value.to_string();
            Ok(())
        } else {
            Err(SectionError::UnknownFilter(value.to_string()))
        }
    }

    pub fn visible_records(&self) -> Vec<&Record> {
        match self.spec.filter_by {
            Some(key) => self
                .records
                .iter()
                .filter(|r| filter::matches_filter(r, key, &self.active_filter))
                .collect(),
            None => self.records.iter().collect(),
        }
    }

    // ========================================
    // Rendering
    // ========================================

    pub fn view(&self) -> SectionView {
        let filters = self
            .filter_options()
            .into_iter()
            .map(|value| FilterOption {
                label: if value == ALL_FILTER { ALL_FILTER_LABEL.to_string() } else { value.clone() },
                active: value == self.active_filter,
                value,
            })
            .collect();

        let confirm = match &self.state {
            SectionState::ConfirmingDelete(record) => Some(DeleteConfirmation {
                id: record.id(),
                message: "Czy na pewno chcesz usunąć ten element?".to_string(),
            }),
            _ => None,
        };

        SectionView {
            collection: self.spec.table,
            title: self.spec.title,
            state: self.state.name(),
            filters,
            table: DataTable::render(self.spec.title, &self.visible_records(), self.spec.columns),
            editor: self.editor().map(GenericEditor::render),
            confirm,
            notice: self.notice.clone(),
        }
    }
}
