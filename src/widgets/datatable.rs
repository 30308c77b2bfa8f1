use color_eyre::Result;
use std::borrow::Cow;
use std::sync::Arc;

use polars::prelude::*;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Padding, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::dataset::ColumnSpec;
use crate::error_display::user_message_from_polars;
use crate::filter::{FilterDefinition, FilterOperation, Predicate};

/// Grid state: the full record list, the filter applied to it and the rows
/// that survived.
pub struct DataTableState {
    original_lf: LazyFrame,
    df: Option<DataFrame>,
    pub table_state: TableState,
    pub error: Option<PolarsError>,
    pub schema: Arc<Schema>,
    pub num_rows: usize,
    columns: Vec<ColumnSpec>,
    filter: FilterDefinition,
    case_sensitive: bool,
    row_numbers: bool,
    row_start_index: usize,
}

impl DataTableState {
    pub fn new(lf: LazyFrame, columns: &[ColumnSpec]) -> Result<Self> {
        let schema = lf.clone().collect_schema()?;
        let mut state = Self {
            original_lf: lf,
            df: None,
            table_state: TableState::default(),
            error: None,
            schema,
            num_rows: 0,
            columns: columns.to_vec(),
            filter: FilterDefinition::new(),
            case_sensitive: false,
            row_numbers: false,
            row_start_index: 1,
        };
        state.collect();
        Ok(state)
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self.collect();
        self
    }

    pub fn with_row_numbers(mut self, row_numbers: bool, row_start_index: usize) -> Self {
        self.row_numbers = row_numbers;
        self.row_start_index = row_start_index;
        self
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Filter currently applied to the rows
    pub fn filter_definition(&self) -> &FilterDefinition {
        &self.filter
    }

    /// Rows currently shown
    pub fn dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Apply `filter` to the full record list, replacing any previous filter.
    pub fn filter(&mut self, filter: FilterDefinition) {
        self.filter = filter;
        self.collect();
    }

    pub fn collect(&mut self) {
        let mut lf = self.original_lf.clone();
        if let Some(predicate) = self.build_predicate() {
            lf = lf.filter(predicate);
        }

        match lf.collect() {
            Ok(df) => {
                self.num_rows = df.height();
                self.df = Some(df);
                self.error = None;
                let selected = self
                    .table_state
                    .selected()
                    .map(|i| i.min(self.num_rows.saturating_sub(1)));
                self.table_state
                    .select(if self.num_rows == 0 { None } else { selected.or(Some(0)) });
            }
            Err(e) => {
                self.num_rows = 0;
                self.df = None;
                self.error = Some(e);
                self.table_state.select(None);
            }
        }
    }

    fn build_predicate(&self) -> Option<Expr> {
        self.filter
            .iter()
            .map(|p| self.predicate_expr(p))
            .reduce(|acc, e| acc.and(e))
    }

    fn predicate_expr(&self, predicate: &Predicate) -> Expr {
        let col_expr = col(predicate.field.as_str());

        if predicate.operation == FilterOperation::Contains {
            let text = col_expr.cast(DataType::String);
            let needle = predicate.value.to_string();
            return if self.case_sensitive {
                text.str().contains_literal(lit(needle))
            } else {
                text.str()
                    .to_lowercase()
                    .str()
                    .contains_literal(lit(needle.to_lowercase()))
            };
        }

        // a value that cannot be compared with the column matches no rows
        let Some(val_lit) = self.literal(predicate) else {
            return lit(false);
        };
        match predicate.operation {
            FilterOperation::Equal => col_expr.eq(val_lit),
            FilterOperation::NotEqual => col_expr.neq(val_lit),
            FilterOperation::GreaterThan => col_expr.gt(val_lit),
            FilterOperation::GreaterThanOrEqual => col_expr.gt_eq(val_lit),
            FilterOperation::LessThan => col_expr.lt(val_lit),
            FilterOperation::LessThanOrEqual => col_expr.lt_eq(val_lit),
            FilterOperation::Contains => lit(false),
        }
    }

    /// Literal for the predicate's value, coerced to the column's dtype so
    /// that `year > "1990"` still compares numerically. `None` when a
    /// numeric column is compared with text that is not a number.
    fn literal(&self, predicate: &Predicate) -> Option<Expr> {
        match self.schema.get(predicate.field.as_str()) {
            Some(dtype) if dtype.is_integer() => {
                let n = predicate.value.as_number()?;
                Some(if n.fract() == 0.0 { lit(n as i64) } else { lit(n) })
            }
            Some(dtype) if dtype.is_float() => predicate.value.as_number().map(lit),
            _ => Some(lit(predicate.value.to_string())),
        }
    }

    pub fn select_next(&mut self) {
        if self.num_rows == 0 {
            return;
        }
        let next = self
            .table_state
            .selected()
            .map(|i| (i + 1).min(self.num_rows - 1))
            .unwrap_or(0);
        self.table_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.num_rows == 0 {
            return;
        }
        let prev = self
            .table_state
            .selected()
            .map(|i| i.saturating_sub(1))
            .unwrap_or(0);
        self.table_state.select(Some(prev));
    }

    /// Display text of the cell at `row` in column `name`
    pub fn cell(&self, row: usize, name: &str) -> Option<String> {
        let df = self.df.as_ref()?;
        let value = df.column(name).ok()?.get(row).ok()?;
        Some(cell_text(&value).into_owned())
    }
}

fn cell_text<'a>(value: &'a AnyValue<'a>) -> Cow<'a, str> {
    if matches!(value, AnyValue::Null) {
        Cow::Borrowed("")
    } else {
        value.str_value()
    }
}

pub struct DataTable {
    header_fg: Color,
    row_numbers_fg: Color,
    border_fg: Color,
    error_fg: Color,
    title: String,
}

impl Default for DataTable {
    fn default() -> Self {
        Self {
            header_fg: Color::White,
            row_numbers_fg: Color::DarkGray,
            border_fg: Color::Cyan,
            error_fg: Color::Red,
            title: String::new(),
        }
    }
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colors(
        mut self,
        header_fg: Color,
        row_numbers_fg: Color,
        border_fg: Color,
        error_fg: Color,
    ) -> Self {
        self.header_fg = header_fg;
        self.row_numbers_fg = row_numbers_fg;
        self.border_fg = border_fg;
        self.error_fg = error_fg;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl StatefulWidget for DataTable {
    type State = DataTableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_fg))
            .title(self.title.as_str());

        if let Some(error) = state.error.as_ref() {
            Paragraph::new(format!("Error: {}", user_message_from_polars(error)))
                .style(Style::default().fg(self.error_fg))
                .centered()
                .block(block.padding(Padding::top(area.height.saturating_sub(2) / 2)))
                .wrap(ratatui::widgets::Wrap { trim: true })
                .render(area, buf);
            return;
        }

        let Some(df) = state.df.as_ref() else {
            Paragraph::new("No data").block(block).render(area, buf);
            return;
        };

        // make each column as wide as it needs to be to fit the content
        let mut widths: Vec<u16> = state
            .columns
            .iter()
            .map(|c| c.title.chars().count() as u16)
            .collect();
        let mut rows: Vec<Vec<Cell>> = vec![vec![]; df.height()];

        if state.row_numbers {
            let last = state.row_start_index + df.height().saturating_sub(1);
            widths.insert(0, last.to_string().len() as u16);
            for (i, row) in rows.iter_mut().enumerate() {
                row.push(
                    Cell::from((state.row_start_index + i).to_string())
                        .style(Style::default().fg(self.row_numbers_fg)),
                );
            }
        }
        let offset = usize::from(state.row_numbers);

        for (col_index, spec) in state.columns.iter().enumerate() {
            let Ok(column) = df.column(spec.name) else {
                continue;
            };
            for (row_index, row) in rows.iter_mut().enumerate() {
                let value = column.get(row_index).unwrap_or(AnyValue::Null);
                let text = cell_text(&value).into_owned();
                widths[col_index + offset] =
                    widths[col_index + offset].max(text.chars().count() as u16);
                row.push(Cell::from(text));
            }
        }

        let mut header: Vec<Cell> = Vec::new();
        if state.row_numbers {
            header.push(Cell::from(""));
        }
        header.extend(state.columns.iter().map(|c| Cell::from(c.title)));

        let table = Table::new(
            rows.into_iter().map(Row::new),
            widths.into_iter().map(Constraint::Length),
        )
        .header(
            Row::new(header).style(
                Style::default()
                    .fg(self.header_fg)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ),
        )
        .column_spacing(2)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(block);

        StatefulWidget::render(table, area, buf, &mut state.table_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{albums, columns};

    fn album_state() -> DataTableState {
        DataTableState::new(albums().unwrap().lazy(), columns()).unwrap()
    }

    fn names(state: &DataTableState) -> Vec<String> {
        (0..state.num_rows)
            .filter_map(|i| state.cell(i, "name"))
            .collect()
    }

    #[test]
    fn test_unfiltered() {
        let state = album_state();
        assert_eq!(state.num_rows, 11);
        assert_eq!(state.table_state.selected(), Some(0));
    }

    #[test]
    fn test_filter_year_greater_than() {
        let mut state = album_state();
        state.filter(vec![Predicate::new("year", FilterOperation::GreaterThan, 1990)].into());
        assert_eq!(
            names(&state),
            vec!["Human", "The Battle of Los Angeles", "The Slim Shady LP"]
        );
    }

    #[test]
    fn test_filter_year_less_than_or_equal() {
        let mut state = album_state();
        state.filter(
            vec![Predicate::new("year", FilterOperation::LessThanOrEqual, 1990)].into(),
        );
        assert_eq!(state.num_rows, 8);
    }

    #[test]
    fn test_contains_case_insensitive_by_default() {
        let mut state = album_state();
        state.filter(vec![Predicate::new("name", FilterOperation::Contains, "UM")].into());
        assert_eq!(names(&state), vec!["Human", "Colour by Numbers"]);
    }

    #[test]
    fn test_contains_case_sensitive() {
        let mut state = album_state().with_case_sensitive(true);
        state.filter(vec![Predicate::new("name", FilterOperation::Contains, "UM")].into());
        assert_eq!(state.num_rows, 0);
        assert!(state.error.is_none());

        state.filter(vec![Predicate::new("name", FilterOperation::Contains, "Num")].into());
        assert_eq!(names(&state), vec!["Colour by Numbers"]);
    }

    #[test]
    fn test_predicates_are_anded() {
        let mut state = album_state();
        state.filter(
            vec![
                Predicate::new("artist", FilterOperation::Contains, "rolling"),
                Predicate::new("year", FilterOperation::Equal, 1967),
                Predicate::new("name", FilterOperation::NotEqual, "Between the Buttons"),
            ]
            .into(),
        );
        assert_eq!(names(&state), vec!["Their Satanic Majesties Request"]);
    }

    #[test]
    fn test_numeric_text_value_is_coerced() {
        let mut state = album_state();
        state.filter(vec![Predicate::new("year", FilterOperation::GreaterThanOrEqual, "1999")].into());
        assert_eq!(state.num_rows, 3);
    }

    #[test]
    fn test_non_numeric_year_matches_nothing() {
        let mut state = album_state();
        for value in ["abc", "-"] {
            state.filter(vec![Predicate::new("year", FilterOperation::GreaterThan, value)].into());
            assert!(state.error.is_none(), "{:?} should not be an error", value);
            assert_eq!(state.num_rows, 0);
        }

        state.filter(vec![Predicate::new("year", FilterOperation::Equal, "-")].into());
        assert!(state.error.is_none());
        assert_eq!(state.num_rows, 0);

        state.filter(vec![Predicate::new("year", FilterOperation::Equal, "1983")].into());
        assert_eq!(state.num_rows, 3);
    }

    #[test]
    fn test_unknown_column_sets_error() {
        let mut state = album_state();
        state.filter(vec![Predicate::new("genre", FilterOperation::Equal, "rock")].into());
        assert!(state.error.is_some());
        assert_eq!(state.num_rows, 0);

        state.filter(FilterDefinition::new());
        assert!(state.error.is_none());
        assert_eq!(state.num_rows, 11);
    }

    #[test]
    fn test_selection_clamped_after_filter() {
        let mut state = album_state();
        for _ in 0..20 {
            state.select_next();
        }
        assert_eq!(state.table_state.selected(), Some(10));
        state.filter(vec![Predicate::new("year", FilterOperation::Equal, 1999)].into());
        assert_eq!(state.table_state.selected(), Some(1));
        state.select_previous();
        assert_eq!(state.table_state.selected(), Some(0));
    }

    #[test]
    fn test_render_shows_titles() {
        let mut state = album_state().with_row_numbers(true, 1);
        let area = Rect::new(0, 0, 80, 16);
        let mut buf = Buffer::empty(area);
        DataTable::new().render(area, &mut buf, &mut state);
        let text: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Name"));
        assert!(text.contains("Artist"));
        assert!(text.contains("Prime Cuts"));
    }
}
