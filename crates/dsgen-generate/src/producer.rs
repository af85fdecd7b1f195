use dsgen_core::{OutputConfig, RowRange, Table};

use crate::errors::ProducerError;

/// One table and row range to materialize, with its output policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub table: Table,
    pub range: RowRange,
    pub output: OutputConfig,
}

impl GenerationRequest {
    pub fn new(table: Table, range: RowRange, output: OutputConfig) -> Self {
        Self {
            table,
            range,
            output,
        }
    }

    /// Whether row groups of this request carry child rows.
    pub fn includes_children(&self) -> bool {
        self.output.family_run && self.table.family().child.is_some()
    }

    /// Table whose rows drive the groups: the parent of a child table.
    pub fn source_table(&self) -> Table {
        self.table.family().parent
    }
}

/// A parent row and the child rows that belong to it.
///
/// Rows are already formatted, line terminator included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowGroup {
    pub row_number: u64,
    pub parent: String,
    pub children: Vec<String>,
}

impl RowGroup {
    pub fn new(row_number: u64, parent: impl Into<String>) -> Self {
        Self {
            row_number,
            parent: parent.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }
}

/// Lazy sequence of row groups in ascending row order.
pub type RowGroups<'a> = Box<dyn Iterator<Item = Result<RowGroup, ProducerError>> + 'a>;

/// Source of formatted rows for a table.
///
/// Implementations must be deterministic for a given table and range, yield
/// groups in ascending row order, stop after `range.end` and yield nothing for
/// an empty range. Child rows are only produced when
/// [`GenerationRequest::includes_children`] holds.
///
/// A request for a child table is answered with the row groups of its parent
/// ([`GenerationRequest::source_table`]) over the same range; only the child
/// rows of those groups get written.
pub trait RowProducer {
    fn produce<'a>(&'a self, request: &GenerationRequest) -> RowGroups<'a>;
}

impl<T: RowProducer + ?Sized> RowProducer for &T {
    fn produce<'a>(&'a self, request: &GenerationRequest) -> RowGroups<'a> {
        (**self).produce(request)
    }
}
