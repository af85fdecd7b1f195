use serde::{Deserialize, Serialize};

/// Text layout of one generated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFormat {
    pub column_separator: char,
    /// Emit a separator after the last column as well.
    pub terminate_rows: bool,
}

impl Default for RowFormat {
    fn default() -> Self {
        Self {
            column_separator: '|',
            terminate_rows: true,
        }
    }
}

impl RowFormat {
    /// Join column values into a newline-terminated line.
    pub fn format<S: AsRef<str>>(&self, values: &[S]) -> String {
        let width: usize = values.iter().map(|value| value.as_ref().len() + 1).sum();
        let mut line = String::with_capacity(width + 1);
        for (index, value) in values.iter().enumerate() {
            if index > 0 {
                line.push(self.column_separator);
            }
            line.push_str(value.as_ref());
        }
        if self.terminate_rows && !values.is_empty() {
            line.push(self.column_separator);
        }
        line.push('\n');
        line
    }
}
