use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace, warn};

use crate::domain::{CMDMode, HELP_TEXT, Message, XVConfig, XVError};
use crate::format::format_cell;
use crate::inputter::{InputResult, Inputter};
use crate::record::{Record, infer_columns};
use crate::statistics::Statistics;
use crate::store::DataStore;
use crate::table::{SortDirection, TableEngine};
use crate::upload::SpreadsheetFile;
use crate::worker::{Completion, Outcome, Request, Worker};

const FETCH_FAILED: &str = "Failed to fetch data. Please try again.";
const UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";
const CLEAR_FAILED: &str = "Failed to clear data. Please try again.";
const CLEARED: &str = "All data cleared successfully.";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Debug, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    LOADING,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modus {
    TABLE,
    RECORD,
    POPUP,
    CMDINPUT,
    CONFIRM,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Fetch,
    Upload,
    Clear,
}

/// The view shell state: dataset, table view, statistics and the one
/// request that is currently in flight.
pub struct Model {
    config: XVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    records: Arc<Vec<Record>>,
    table: TableEngine,
    statistics: Option<Statistics>,
    show_statistics: bool,
    cursor_row: usize,
    cursor_column: usize,
    record_row: usize,    // Position in the filtered and sorted rows
    record_offset: usize, // First field shown in the record view
    worker: Worker,
    pending: Option<(u64, Pending)>,
    error: Option<String>,
    success: Option<String>,
    input: Inputter,
    last_input: InputResult,
    cmd_mode: Option<CMDMode>,
    search_backup: String,
    popup_message: String,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    /// Starts the store worker and requests the initial dataset.
    pub fn init(config: &XVConfig, store: Box<dyn DataStore>) -> Result<Self, XVError> {
        let mut model = Self {
            config: config.clone(),
            status: Status::EMPTY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            records: Arc::new(Vec::new()),
            table: TableEngine::new(config.page_size),
            statistics: None,
            show_statistics: true,
            cursor_row: 0,
            cursor_column: 0,
            record_row: 0,
            record_offset: 0,
            worker: Worker::spawn(store)?,
            pending: None,
            error: None,
            success: None,
            input: Inputter::default(),
            last_input: InputResult::default(),
            cmd_mode: None,
            search_backup: String::new(),
            popup_message: String::new(),
            status_message: "Started xv!".to_string(),
            last_status_message_update: Instant::now(),
        };
        model.refresh();
        Ok(model)
    }

    // -------------------- Accessors for the ui ---------------------- //

    pub fn config(&self) -> &XVConfig {
        &self.config
    }

    pub fn table(&self) -> &TableEngine {
        &self.table
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn show_statistics(&self) -> bool {
        self.show_statistics
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_column)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn popup_message(&self) -> &str {
        &self.popup_message
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn cmd_input(&self) -> Option<(CMDMode, &InputResult)> {
        match (self.modus, self.cmd_mode) {
            (Modus::CMDINPUT, Some(mode)) => Some((mode, &self.last_input)),
            _ => None,
        }
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    /// Title and (label, value) pairs of the record shown in the record view.
    pub fn record_fields(&self) -> Option<(String, Vec<(String, String)>)> {
        let record = self.table.record_at_absolute(self.record_row)?;
        let fields = self
            .table
            .columns()
            .iter()
            .skip(self.record_offset)
            .map(|c| (c.label.clone(), format_cell(record.value(&c.name))))
            .collect();
        let title = format!(
            "Record {} of {}",
            self.record_row + 1,
            self.table.filtered_count()
        );
        Some((title, fields))
    }

    // -------------------- Store requests ---------------------- //

    fn start_request(&mut self, request: Request) -> bool {
        let kind = match request {
            Request::Fetch => Pending::Fetch,
            Request::Upload(_) => Pending::Upload,
            Request::Clear => Pending::Clear,
            Request::ClearSession => {
                // Fire and forget, never waited for.
                self.worker.submit(request);
                return true;
            }
        };
        if let Some((token, running)) = self.pending {
            debug!("Request #{} ({:?}) still running, ignoring {:?}", token, running, kind);
            self.set_status_message("Busy, please wait ...");
            return false;
        }
        let token = self.worker.submit(request);
        self.pending = Some((token, kind));
        self.status = Status::LOADING;
        self.set_status_message("Processing ...");
        true
    }

    fn refresh(&mut self) {
        if self.start_request(Request::Fetch) {
            self.error = None;
        }
    }

    fn upload(&mut self, path: &str) {
        if path.trim().is_empty() {
            return;
        }
        match SpreadsheetFile::open(path) {
            Ok(file) => {
                if self.start_request(Request::Upload(file)) {
                    self.error = None;
                    self.success = None;
                }
            }
            Err(e) => {
                warn!("Rejected upload of {}: {}", path, e);
                self.error = Some(e.to_string());
                self.success = None;
            }
        }
    }

    /// Applies all completions that arrived since the last call.
    pub fn poll_worker(&mut self) {
        while let Some(completion) = self.worker.try_recv() {
            self.apply_completion(completion);
        }
    }

    pub(crate) fn apply_completion(&mut self, completion: Completion) {
        let kind = match self.pending {
            Some((token, kind)) if token == completion.token => kind,
            _ => {
                // Either a superseded request or the fire and forget session clear.
                match &completion.result {
                    Ok(Outcome::SessionCleared) => trace!("Session cleared"),
                    Err(e) => debug!("Ignoring completion #{} ({})", completion.token, e),
                    Ok(_) => warn!("Ignoring stale completion #{}", completion.token),
                }
                return;
            }
        };
        self.pending = None;

        match (kind, completion.result) {
            (Pending::Fetch, Ok(Outcome::Fetched(records))) => {
                self.set_status_message(format!("Loaded {} records", records.len()));
                self.set_dataset(records);
            }
            (Pending::Upload, Ok(Outcome::Uploaded(receipt))) => {
                self.success = Some(format!(
                    "File uploaded successfully! {} rows processed.",
                    receipt.rows_processed
                ));
                self.start_request(Request::Fetch);
            }
            (Pending::Clear, Ok(Outcome::Cleared)) => {
                self.success = Some(CLEARED.to_string());
                self.set_dataset(Vec::new());
                self.set_status_message(CLEARED);
            }
            (kind, Err(e)) => {
                error!("{:?} failed: {}", kind, e);
                let message = match kind {
                    Pending::Fetch => FETCH_FAILED,
                    Pending::Upload => e.detail().unwrap_or(UPLOAD_FAILED),
                    Pending::Clear => CLEAR_FAILED,
                };
                self.error = Some(message.to_string());
                self.set_status_message(message);
            }
            (kind, Ok(outcome)) => {
                error!("{:?} completed with unexpected {:?}", kind, outcome);
            }
        }
        self.status = self.idle_status();
    }

    fn idle_status(&self) -> Status {
        if self.pending.is_some() {
            Status::LOADING
        } else if self.records.is_empty() {
            Status::EMPTY
        } else {
            Status::READY
        }
    }

    /// Replaces the dataset as a whole and recomputes everything derived from it.
    fn set_dataset(&mut self, records: Vec<Record>) {
        let start_time = Instant::now();
        let columns = infer_columns(&records, self.config.inference);
        self.statistics = Statistics::compute(&records, self.config.inference);
        self.records = Arc::new(records);
        self.table.set_dataset(Arc::clone(&self.records), columns);

        self.cursor_row = 0;
        self.cursor_column = std::cmp::min(
            self.cursor_column,
            self.table.columns().len().saturating_sub(1),
        );
        if self.modus == Modus::RECORD {
            self.modus = Modus::TABLE;
        }
        info!(
            "Dataset replaced: {} records, {} columns in {}ms",
            self.records.len(),
            self.table.columns().len(),
            start_time.elapsed().as_millis()
        );
    }

    // -------------------- Message handling ---------------------- //

    pub fn update(&mut self, message: Option<Message>) -> Result<(), XVError> {
        self.poll_worker();

        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.move_table_selection_down(),
                    Message::MoveUp => self.move_table_selection_up(),
                    Message::MoveLeft => {
                        self.cursor_column = self.cursor_column.saturating_sub(1)
                    }
                    Message::MoveRight => self.move_table_selection_right(),
                    Message::NextPage => {
                        self.table.next_page();
                        self.clamp_cursor();
                    }
                    Message::PreviousPage => {
                        self.table.previous_page();
                        self.clamp_cursor();
                    }
                    Message::Sort => self.sort_current_column(),
                    Message::Search => self.enter_cmd_mode(CMDMode::Search),
                    Message::Upload => {
                        if self.is_loading() {
                            self.set_status_message("Busy, please wait ...");
                        } else {
                            self.enter_cmd_mode(CMDMode::Upload);
                        }
                    }
                    Message::Clear => self.confirm_clear(),
                    Message::Refresh => self.refresh(),
                    Message::ToggleStatistics => self.show_statistics = !self.show_statistics,
                    Message::Enter => self.enter(),
                    Message::Exit => {
                        self.error = None;
                        self.success = None;
                    }
                    Message::Help => self.show_help(),
                    Message::Resize(width, height) => trace!("UI was resized to {width}x{height}"),
                    _ => (),
                },
                Modus::RECORD => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveLeft | Message::PreviousPage => self.previous_record(),
                    Message::MoveRight | Message::NextPage => self.next_record(),
                    Message::MoveUp => self.record_offset = self.record_offset.saturating_sub(1),
                    Message::MoveDown => {
                        if self.record_offset + 1 < self.table.columns().len() {
                            self.record_offset += 1;
                        }
                    }
                    Message::Help => self.show_help(),
                    Message::Enter | Message::Exit => self.exit(),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Enter | Message::Exit => self.exit(),
                    _ => (),
                },
                Modus::CONFIRM => match msg {
                    Message::Enter => {
                        self.exit();
                        self.success = None;
                        self.start_request(Request::Clear);
                    }
                    Message::Exit => self.exit(),
                    _ => (),
                },
                Modus::CMDINPUT => {
                    if let Message::RawKey(key) = msg {
                        self.raw_input(key)
                    }
                }
            }
        }
        Ok(())
    }

    pub fn quit(&mut self) {
        if self.config.clear_session_on_exit {
            self.start_request(Request::ClearSession);
        }
        self.status = Status::QUITTING;
    }

    /// Gives queued requests (the session clear on quit) a short grace
    /// period, then stops the worker.
    pub fn shutdown(&mut self) {
        self.worker.shutdown(SHUTDOWN_GRACE);
    }

    fn enter(&mut self) {
        if self.table.record_at(self.cursor_row).is_some() {
            self.record_row = self.table.absolute_row(self.cursor_row);
            self.record_offset = 0;
            self.previous_modus = self.modus;
            self.modus = Modus::RECORD;
        }
    }

    fn exit(&mut self) {
        trace!("Exit {:?}", self.modus);
        self.modus = match self.modus {
            Modus::POPUP => self.previous_modus,
            _ => Modus::TABLE,
        };
        self.previous_modus = Modus::TABLE;
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup_message = HELP_TEXT.to_string();
    }

    fn confirm_clear(&mut self) {
        if self.is_loading() {
            self.set_status_message("Busy, please wait ...");
            return;
        }
        self.previous_modus = self.modus;
        self.modus = Modus::CONFIRM;
        self.popup_message = "Are you sure you want to clear all data?".to_string();
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {:?}", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.input.clear();
        if mode == CMDMode::Search {
            self.search_backup = self.table.search_term().to_string();
            self.input.set(&self.search_backup);
        }
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        let Some(mode) = self.cmd_mode else {
            return;
        };

        if mode == CMDMode::Search {
            // Search follows the input while typing, escape restores the previous term.
            let term = if self.last_input.canceled {
                self.search_backup.clone()
            } else {
                self.last_input.input.clone()
            };
            self.table.set_search_term(&term);
            self.clamp_cursor();
        }

        if self.last_input.finished {
            self.modus = Modus::TABLE;
            self.cmd_mode = None;
            if self.last_input.canceled {
                return;
            }
            match mode {
                CMDMode::Search => {
                    let found = self.table.filtered_count();
                    self.set_status_message(format!("Found {found} matching records"));
                }
                CMDMode::Upload => {
                    let path = self.last_input.input.clone();
                    self.upload(&path);
                }
            }
        }
    }

    fn sort_current_column(&mut self) {
        let Some(column) = self.table.columns().get(self.cursor_column) else {
            return;
        };
        let name = column.name.clone();
        let label = column.label.clone();
        self.table.set_sort(&name);
        self.clamp_cursor();
        let message = match self.table.sort_state().map(|s| s.direction) {
            Some(SortDirection::Ascending) => format!("Sorted by {label} ascending"),
            Some(SortDirection::Descending) => format!("Sorted by {label} descending"),
            None => "Sorting removed".to_string(),
        };
        self.set_status_message(message);
    }

    fn visible_row_count(&self) -> usize {
        self.table.visible_rows().len()
    }

    fn clamp_cursor(&mut self) {
        self.cursor_row = std::cmp::min(self.cursor_row, self.visible_row_count().saturating_sub(1));
    }

    fn move_table_selection_down(&mut self) {
        if self.cursor_row + 1 < self.visible_row_count() {
            self.cursor_row += 1;
        } else if self.table.can_next_page() {
            // At the bottom of the page, continue on the next one
            self.table.next_page();
            self.cursor_row = 0;
        }
    }

    fn move_table_selection_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
        } else if self.table.can_previous_page() {
            self.table.previous_page();
            self.cursor_row = self.visible_row_count().saturating_sub(1);
        }
    }

    fn move_table_selection_right(&mut self) {
        if self.cursor_column + 1 < self.table.columns().len() {
            self.cursor_column += 1;
        }
    }

    fn previous_record(&mut self) {
        self.record_row = self.record_row.saturating_sub(1);
    }

    fn next_record(&mut self) {
        if self.record_row + 1 < self.table.filtered_count() {
            self.record_row += 1;
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    #[cfg(test)]
    fn settle(&mut self) {
        while self.pending.is_some() {
            match self.worker.recv_timeout(Duration::from_secs(5)) {
                Some(completion) => self.apply_completion(completion),
                None => panic!("worker did not answer"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use crate::store::tests::MemoryStore;
    use pretty_assertions::assert_eq;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use std::fs;

    fn people(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                Record::new()
                    .with("name", Value::Text(format!("person {i}")))
                    .with("age", Value::Number(20.0 + i as f64))
            })
            .collect()
    }

    fn model_with(records: Vec<Record>) -> (Model, MemoryStore) {
        let store = MemoryStore::default();
        *store.records.lock().unwrap() = records;
        let config = XVConfig::default().with_clear_session_on_exit(false);
        let mut model = Model::init(&config, Box::new(store.clone())).unwrap();
        model.settle();
        (model, store)
    }

    fn type_keys(model: &mut Model, s: &str) {
        for c in s.chars() {
            model
                .update(Some(Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))))
                .unwrap();
        }
    }

    fn key(model: &mut Model, code: KeyCode) {
        model
            .update(Some(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))))
            .unwrap();
    }

    #[test]
    fn loads_dataset_on_start() {
        let (model, _) = model_with(people(2));
        assert_eq!(model.status, Status::READY);
        assert_eq!(model.table().total_count(), 2);
        let stats = model.statistics().unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.numeric_for("age").unwrap().average, "20.50");
    }

    #[test]
    fn empty_store_means_empty_status() {
        let (model, _) = model_with(Vec::new());
        assert_eq!(model.status, Status::EMPTY);
        assert!(model.statistics().is_none());
        assert_eq!(model.table().page_count(), 1);
    }

    #[test]
    fn failed_fetch_keeps_previous_dataset() {
        let (mut model, store) = model_with(people(3));
        *store.fail_next.lock().unwrap() = Some(XVError::Network("HTTP 500".into()));
        model.update(Some(Message::Refresh)).unwrap();
        model.settle();
        assert_eq!(model.error(), Some(FETCH_FAILED));
        assert_eq!(model.table().total_count(), 3);
        assert_eq!(model.status, Status::READY);
    }

    #[test]
    fn upload_then_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("four.xlsx");
        fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let (mut model, store) = model_with(people(1));
        model.update(Some(Message::Upload)).unwrap();
        assert!(model.raw_keyevents());
        type_keys(&mut model, path.to_str().unwrap());
        key(&mut model, KeyCode::Enter);
        assert!(model.is_loading());
        model.settle();

        assert_eq!(model.success(), Some("File uploaded successfully! 4 rows processed."));
        assert_eq!(model.table().total_count(), 4);
        assert_eq!(*store.calls.lock().unwrap(), vec!["fetch", "upload", "fetch"]);
    }

    #[test]
    fn failed_upload_shows_detail_and_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.xls");
        fs::write(&path, b"junk").unwrap();

        let (mut model, store) = model_with(people(2));
        *store.fail_next.lock().unwrap() =
            Some(XVError::Validation("Error processing file: bad zip".into()));
        model.update(Some(Message::Upload)).unwrap();
        type_keys(&mut model, path.to_str().unwrap());
        key(&mut model, KeyCode::Enter);
        model.settle();

        assert_eq!(model.error(), Some("Error processing file: bad zip"));
        assert_eq!(model.success(), None);
        assert_eq!(model.table().total_count(), 2);
    }

    #[test]
    fn unsupported_file_is_rejected_locally() {
        let (mut model, store) = model_with(people(2));
        model.update(Some(Message::Upload)).unwrap();
        type_keys(&mut model, "/tmp/notes.txt");
        key(&mut model, KeyCode::Enter);
        assert!(!model.is_loading());
        assert!(model.error().unwrap().contains("only .xlsx and .xls"));
        assert_eq!(*store.calls.lock().unwrap(), vec!["fetch"]);
    }

    #[test]
    fn clear_asks_for_confirmation() {
        let (mut model, store) = model_with(people(5));

        model.update(Some(Message::Clear)).unwrap();
        assert_eq!(model.modus(), Modus::CONFIRM);
        model.update(Some(Message::Exit)).unwrap();
        assert_eq!(model.modus(), Modus::TABLE);
        assert_eq!(*store.calls.lock().unwrap(), vec!["fetch"]);

        model.update(Some(Message::Clear)).unwrap();
        model.update(Some(Message::Enter)).unwrap();
        model.settle();
        assert_eq!(model.success(), Some(CLEARED));
        assert_eq!(model.table().total_count(), 0);
        assert_eq!(model.status, Status::EMPTY);
        assert!(model.statistics().is_none());
    }

    #[test]
    fn triggers_are_inert_while_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.xlsx");
        fs::write(&path, [7u8]).unwrap();

        let (mut model, store) = model_with(people(2));
        model.refresh();
        assert!(model.is_loading());

        // No polling in between, the first fetch is still pending.
        model.refresh();
        model.confirm_clear();
        assert_eq!(model.modus(), Modus::TABLE);
        model.upload(path.to_str().unwrap());
        assert_eq!(model.status_message(), "Busy, please wait ...");

        model.settle();
        assert_eq!(*store.calls.lock().unwrap(), vec!["fetch", "fetch"]);
        assert_eq!(model.table().total_count(), 2);
    }

    #[test]
    fn busy_refresh_keeps_the_error() {
        let (mut model, _) = model_with(people(2));
        model.refresh();
        model.error = Some(FETCH_FAILED.to_string());

        model.refresh();
        assert_eq!(model.error(), Some(FETCH_FAILED));
        assert_eq!(model.status_message(), "Busy, please wait ...");

        model.settle();
        model.refresh();
        assert_eq!(model.error(), None);
        model.settle();
    }

    #[test]
    fn stale_completions_are_dropped() {
        let (mut model, _) = model_with(people(2));
        model.update(Some(Message::Refresh)).unwrap();
        let (token, _) = model.pending.unwrap();

        model.apply_completion(Completion {
            token: token - 1,
            result: Ok(Outcome::Fetched(people(7))),
        });
        assert_eq!(model.table().total_count(), 2);
        assert!(model.is_loading());

        model.settle();
        assert_eq!(model.table().total_count(), 2);
        assert!(!model.is_loading());
    }

    #[test]
    fn live_search_and_escape_restores() {
        let (mut model, _) = model_with(people(30));
        model.update(Some(Message::Search)).unwrap();
        type_keys(&mut model, "PERSON 2");
        // person 2, person 20..29
        assert_eq!(model.table().filtered_count(), 11);
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::TABLE);
        assert_eq!(model.status_message(), "Found 11 matching records");

        model.update(Some(Message::Search)).unwrap();
        type_keys(&mut model, "9");
        assert_eq!(model.table().filtered_count(), 1);
        key(&mut model, KeyCode::Esc);
        assert_eq!(model.table().search_term(), "PERSON 2");
        assert_eq!(model.table().filtered_count(), 11);
    }

    #[test]
    fn moving_past_the_page_end_turns_the_page() {
        let (mut model, _) = model_with(people(23));
        for _ in 0..10 {
            model.update(Some(Message::MoveDown)).unwrap();
        }
        assert_eq!(model.table().page_index(), 1);
        assert_eq!(model.cursor(), (0, 0));

        model.update(Some(Message::MoveUp)).unwrap();
        assert_eq!(model.table().page_index(), 0);
        assert_eq!(model.cursor(), (9, 0));

        model.update(Some(Message::NextPage)).unwrap();
        model.update(Some(Message::NextPage)).unwrap();
        assert_eq!(model.table().page_index(), 2);
        // only 3 rows on the last page
        assert_eq!(model.cursor(), (2, 0));
    }

    #[test]
    fn sort_selected_column() {
        let (mut model, _) = model_with(people(3));
        model.update(Some(Message::MoveRight)).unwrap();
        model.update(Some(Message::Sort)).unwrap();
        model.update(Some(Message::Sort)).unwrap();
        assert_eq!(model.status_message(), "Sorted by Age descending");
        let first = model.table().visible_rows()[0].value("age").as_number();
        assert_eq!(first, Some(22.0));
    }

    #[test]
    fn record_view_steps_through_records() {
        let (mut model, _) = model_with(people(3));
        model.update(Some(Message::MoveDown)).unwrap();
        model.update(Some(Message::Enter)).unwrap();
        assert_eq!(model.modus(), Modus::RECORD);

        let (title, fields) = model.record_fields().unwrap();
        assert_eq!(title, "Record 2 of 3");
        assert_eq!(
            fields,
            vec![
                ("Name".to_string(), "person 1".to_string()),
                ("Age".to_string(), "21".to_string())
            ]
        );

        model.update(Some(Message::MoveRight)).unwrap();
        model.update(Some(Message::MoveRight)).unwrap();
        assert_eq!(model.record_fields().unwrap().0, "Record 3 of 3");

        model.update(Some(Message::Exit)).unwrap();
        assert_eq!(model.modus(), Modus::TABLE);
    }

    #[test]
    fn quit_clears_session_when_configured() {
        let store = MemoryStore::default();
        let mut model = Model::init(&XVConfig::default(), Box::new(store.clone())).unwrap();
        model.settle();
        model.update(Some(Message::Quit)).unwrap();
        assert_eq!(model.status, Status::QUITTING);
        model.shutdown();
        assert_eq!(*store.calls.lock().unwrap(), vec!["fetch", "session"]);
    }
}
