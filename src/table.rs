//! Plain text tables, in the column layout the cf CLI uses for its own listings.
use std::{fmt::Display, iter};

/// Padding added after the widest cell of each column.
const COLUMN_PADDING: usize = 4;

/// Table representation.
///
/// The table is printed using the [`Display`] trait, one line per row, with trailing padding
/// trimmed so the output matches the cf CLI listings.
pub struct Table {
    /// Header of the table.
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Column definition: a header and a function producing the cell for an item.
pub type TableColumn<S, T> = (S, fn(&T) -> String);

impl Table {
    /// Create a new table from a header and its rows.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Build a table with one row per item.
    pub fn from_iter<'a, S, Iter, Item>(iter: Iter, columns: &[TableColumn<S, Item>]) -> Self
    where
        S: Display,
        Iter: IntoIterator<Item = &'a Item>,
        Item: 'a,
    {
        // Create the header from the column names.
        let header = columns.iter().map(|(name, _)| name.to_string()).collect();

        // One row per item, one cell per column.
        let rows = iter
            .into_iter()
            .map(|item| columns.iter().map(|(_, cell)| cell(item)).collect())
            .collect();

        Self::new(header, rows)
    }

    /// Width of each column: its widest cell, header included, plus the padding.
    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.header.len()];
        for row in iter::once(&self.header).chain(&self.rows) {
            // count chars, not bytes, so non-ascii descriptions line up
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths.iter().map(|width| width + COLUMN_PADDING).collect()
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths = self.column_widths();

        // print the header first, then every row
        for row in iter::once(&self.header).chain(&self.rows) {
            // pad every cell to the width of its column
            let line: String = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect();
            // the last column needs no padding
            writeln!(f, "{}", line.trim_end())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlagRow {
        flag: &'static str,
        description: &'static str,
    }

    #[test]
    fn test_columns_fit_the_widest_cell() {
        let options = [
            FlagRow {
                flag: "--no-push",
                description: "Do not push",
            },
            FlagRow {
                flag: "--var",
                description: "Substitution variable",
            },
        ];

        let columns: &[TableColumn<&str, FlagRow>] = &[
            ("FLAG", |row: &FlagRow| row.flag.to_string()),
            ("DESCRIPTION", |row: &FlagRow| row.description.to_string()),
        ];
        let table = Table::from_iter(options.iter(), columns);

        assert_eq!(
            table.to_string(),
            "FLAG         DESCRIPTION\n--no-push    Do not push\n--var        Substitution variable\n"
        );
    }

    #[test]
    fn test_header_only_when_empty() {
        let columns: &[TableColumn<&str, FlagRow>] = &[
            ("FLAG", |row: &FlagRow| row.flag.to_string()),
            ("DESCRIPTION", |row: &FlagRow| row.description.to_string()),
        ];
        let table = Table::from_iter(Vec::<FlagRow>::new().iter(), columns);

        assert_eq!(table.to_string(), "FLAG    DESCRIPTION\n");
    }
}
