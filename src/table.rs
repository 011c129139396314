use std::sync::Arc;

use rayon::prelude::*;
use tracing::trace;

use crate::record::{ColumnDescriptor, Record};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

/// Filter, sort and paging over a dataset. The dataset itself is never
/// touched, only the row mapping `rows` is rebuilt.
pub struct TableEngine {
    records: Arc<Vec<Record>>,
    columns: Vec<ColumnDescriptor>,
    rows: Vec<usize>, // Mapping of view position to record index, filtered then sorted
    page_size: usize,
    page_index: usize,
    search_term: String,
    sort: Option<SortState>,
}

impl TableEngine {
    pub fn new(page_size: usize) -> Self {
        TableEngine {
            records: Arc::new(Vec::new()),
            columns: Vec::new(),
            rows: Vec::new(),
            page_size: page_size.max(1),
            page_index: 0,
            search_term: String::new(),
            sort: None,
        }
    }

    pub fn set_dataset(&mut self, records: Arc<Vec<Record>>, columns: Vec<ColumnDescriptor>) {
        self.records = records;
        self.columns = columns;
        if let Some(sort) = &self.sort
            && !self.columns.iter().any(|c| c.name == sort.column)
        {
            trace!("Sort column {} is gone, sorting removed", sort.column);
            self.sort = None;
        }
        self.page_index = 0;
        self.rebuild();
    }

    pub fn set_search_term(&mut self, term: &str) {
        if term == self.search_term {
            return;
        }
        trace!("Search term \"{}\" -> \"{}\"", self.search_term, term);
        self.search_term = term.to_string();
        self.page_index = 0;
        self.rebuild();
    }

    /// Cycles the given column through ascending, descending and unsorted.
    /// A column other than the current one always starts ascending.
    pub fn set_sort(&mut self, column: &str) {
        self.sort = match self.sort.take() {
            Some(SortState {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => Some(SortState {
                column: current,
                direction: SortDirection::Descending,
            }),
            Some(SortState {
                column: current,
                direction: SortDirection::Descending,
            }) if current == column => None,
            _ => Some(SortState {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            }),
        };
        trace!("Sort state {:?}", self.sort);
        self.page_index = 0;
        self.rebuild();
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    /// Never 0, an empty result is still one (empty) page.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn filtered_count(&self) -> usize {
        self.rows.len()
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn visible_rows(&self) -> Vec<&Record> {
        self.page_rows().iter().map(|&idx| &self.records[idx]).collect()
    }

    /// Record at the given row of the current page.
    pub fn record_at(&self, page_row: usize) -> Option<&Record> {
        self.page_rows().get(page_row).map(|&idx| &self.records[idx])
    }

    /// Position of a page row within the filtered and sorted sequence.
    pub fn absolute_row(&self, page_row: usize) -> usize {
        self.page_index * self.page_size + page_row
    }

    /// Record at a position of the filtered and sorted sequence.
    pub fn record_at_absolute(&self, row: usize) -> Option<&Record> {
        self.rows.get(row).map(|&idx| &self.records[idx])
    }

    fn page_rows(&self) -> &[usize] {
        let begin = std::cmp::min(self.page_index * self.page_size, self.rows.len());
        let end = std::cmp::min(begin + self.page_size, self.rows.len());
        &self.rows[begin..end]
    }

    fn rebuild(&mut self) {
        let term = self.search_term.to_lowercase();
        let columns = &self.columns;
        let records = &self.records;

        // Search is case insensitive over the raw text of every column.
        let mut rows: Vec<usize> = if term.is_empty() {
            (0..records.len()).collect()
        } else {
            (0..records.len())
                .into_par_iter()
                .filter(|&idx| {
                    columns.iter().any(|c| {
                        records[idx]
                            .value(&c.name)
                            .as_text()
                            .to_lowercase()
                            .contains(&term)
                    })
                })
                .collect()
        };

        if let Some(sort) = &self.sort {
            // sort_by is stable, equal keys keep their dataset order in both directions
            rows.sort_by(|&a, &b| {
                let ord = records[a]
                    .value(&sort.column)
                    .natural_cmp(records[b].value(&sort.column));
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        self.rows = rows;
        self.page_index = std::cmp::min(self.page_index, self.page_count() - 1);
        trace!(
            "Table rebuilt: {} of {} records, {} pages",
            self.rows.len(),
            self.records.len(),
            self.page_count()
        );
    }
}
