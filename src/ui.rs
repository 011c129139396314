use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::XVConfig;
use crate::format::format_cell;
use crate::model::{Model, Modus};
use crate::statistics::Statistics;
use crate::table::SortDirection;

pub const CMDLINE_HEIGH: u16 = 1;
pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2; // room for the sort marker
const MAX_STATISTICS_ROWS: usize = 6;
const STATUS_MESSAGE_FADE: Duration = Duration::from_secs(5);

fn bold(s: String) -> Span<'static> {
    Span::styled(s, Style::default().add_modifier(Modifier::BOLD))
}

pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(cfg: &XVConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let stats_height = match model.statistics() {
            Some(stats) if model.show_statistics() => Self::statistics_height(stats),
            _ => 0,
        };
        let [title_area, alert_area, stats_area, table_area, footer_area, cmd_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(stats_height),
                Constraint::Min(TABLE_HEADER_HEIGHT + 2),
                Constraint::Length(1),
                Constraint::Length(CMDLINE_HEIGH),
            ])
            .areas(frame.area());

        self.draw_title(model, frame, title_area);
        self.draw_alert(model, frame, alert_area);
        if stats_height > 0
            && let Some(stats) = model.statistics()
        {
            self.draw_statistics(stats, frame, stats_area);
        }
        match model.modus() {
            Modus::RECORD => self.draw_record(model, frame, table_area),
            _ => self.draw_table(model, frame, table_area),
        }
        self.draw_footer(model, frame, footer_area);
        self.draw_cmdline(model, frame, cmd_area);

        match model.modus() {
            Modus::POPUP => self.draw_popup(" Help ", model.popup_message(), frame, 60, 80),
            Modus::CONFIRM => {
                let text = format!("{}\n\n<Enter> yes   <Esc> no", model.popup_message());
                self.draw_popup(" Clear all data ", &text, frame, 40, 20)
            }
            _ => {}
        }
    }

    fn draw_title(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            " xv ".bold().reversed(),
            Span::raw(" spreadsheet viewer @ "),
            Span::styled(model.config().api_url.clone(), Style::default().fg(Color::Yellow)),
        ];
        if model.is_loading() {
            spans.push(Span::raw("  "));
            spans.push("Processing...".italic().fg(Color::Cyan));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_alert(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let line = if let Some(error) = model.error() {
            Line::from(Span::styled(
                format!(" ✘ {error}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        } else if let Some(success) = model.success() {
            Line::from(Span::styled(format!(" ✔ {success}"), Style::default().fg(Color::Green)))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn statistics_height(stats: &Statistics) -> u16 {
        let rows = std::cmp::max(stats.numeric.len(), stats.categorical.len());
        // borders, summary line, column headers
        (std::cmp::min(rows, MAX_STATISTICS_ROWS) + 4) as u16
    }

    fn draw_statistics(&self, stats: &Statistics, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Data Statistics ".bold());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [summary_area, detail_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
        let summary = Line::from(vec![
            "Total Records: ".into(),
            bold(stats.total_records.to_string()),
            "   Total Columns: ".into(),
            bold(stats.total_columns.to_string()),
            "   Numeric Columns: ".into(),
            bold(stats.numeric_columns.to_string()),
            "   Categorical Columns: ".into(),
            bold(stats.categorical_columns.to_string()),
        ]);
        frame.render_widget(Paragraph::new(summary), summary_area);

        let [numeric_area, categorical_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(detail_area);

        let header_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let numeric_rows = stats.numeric.iter().take(MAX_STATISTICS_ROWS).map(|s| {
            Row::new(vec![
                s.column.replace('_', " "),
                s.average.clone(),
                crate::format::format_number(s.min),
                crate::format::format_number(s.max),
            ])
        });
        let numeric = Table::new(
            numeric_rows,
            [
                Constraint::Fill(2),
                Constraint::Fill(1),
                Constraint::Fill(1),
                Constraint::Fill(1),
            ],
        )
        .header(Row::new(vec!["Column", "Average", "Min", "Max"]).style(header_style));
        frame.render_widget(numeric, numeric_area);

        let categorical_rows = stats.categorical.iter().take(MAX_STATISTICS_ROWS).map(|s| {
            Row::new(vec![
                s.column.replace('_', " "),
                s.unique.to_string(),
                format!("{} ({})", format_cell(&s.most_common), s.most_common_count),
            ])
        });
        let categorical = Table::new(
            categorical_rows,
            [Constraint::Fill(2), Constraint::Fill(1), Constraint::Fill(2)],
        )
        .header(Row::new(vec!["Column", "Unique Values", "Most Common"]).style(header_style));
        frame.render_widget(categorical, categorical_area);
    }

    /// Columns that fit into `width`, starting early enough to keep the
    /// selected column visible.
    fn visible_columns(widths: &[usize], selected: usize, width: usize) -> Vec<usize> {
        let fits = |from: usize, to: usize| -> bool {
            widths[from..=to].iter().map(|w| w + 1).sum::<usize>() <= width
        };
        let mut offset = 0;
        while offset < selected && !fits(offset, selected) {
            offset += 1;
        }
        let mut visible = vec![offset];
        for idx in offset + 1..widths.len() {
            if !fits(offset, idx) {
                break;
            }
            visible.push(idx);
        }
        visible
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let table = model.table();
        let block = Block::bordered().title(" Data Table ".bold());

        if table.total_count() == 0 || table.columns().is_empty() {
            let text = if model.is_loading() {
                "Loading data..."
            } else {
                "No Data Available\n\nUpload an Excel file (.xlsx, .xls) with <u> to get started."
            };
            frame.render_widget(Paragraph::new(text).centered().block(block), area);
            return;
        }

        let rows = table.visible_rows();
        let columns = table.columns();
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|r| columns.iter().map(|c| format_cell(r.value(&c.name))).collect())
            .collect();

        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let data_width = cells
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .max()
                    .unwrap_or(0);
                let width = std::cmp::max(c.label.chars().count() + COLUMN_WIDTH_MARGIN, data_width);
                std::cmp::min(width, self.max_column_width)
            })
            .collect();

        let (cursor_row, cursor_column) = model.cursor();
        let inner_width = area.width.saturating_sub(2) as usize;
        let visible = Self::visible_columns(&widths, cursor_column, inner_width);

        let sort = table.sort_state();
        let header = Row::new(visible.iter().map(|&idx| {
            let column = &columns[idx];
            let marker = match sort {
                Some(s) if s.column == column.name => match s.direction {
                    SortDirection::Ascending => " ▲",
                    SortDirection::Descending => " ▼",
                },
                _ => "",
            };
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if idx == cursor_column {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Cell::from(Span::styled(format!("{}{}", column.label, marker), style))
        }));

        let body = cells.iter().map(|row| {
            Row::new(visible.iter().map(|&idx| {
                let cell = Cell::from(row[idx].clone());
                if idx == cursor_column {
                    cell.style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    cell
                }
            }))
        });

        let constraints: Vec<Constraint> = visible
            .iter()
            .map(|&idx| Constraint::Length(widths[idx] as u16))
            .collect();

        if rows.is_empty() {
            let [header_area, message_area] =
                Layout::vertical([Constraint::Length(TABLE_HEADER_HEIGHT + 1), Constraint::Min(0)])
                    .areas(area);
            frame.render_widget(
                Table::new(Vec::<Row>::new(), constraints.clone())
                    .header(header)
                    .block(block),
                header_area,
            );
            frame.render_widget(
                Paragraph::new("No data found matching your search criteria.")
                    .centered()
                    .fg(Color::DarkGray)
                    .block(Block::bordered()),
                message_area,
            );
            return;
        }

        let widget = Table::new(body, constraints)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(cursor_row));
        frame.render_stateful_widget(widget, area, &mut state);
    }

    fn draw_record(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let Some((title, fields)) = model.record_fields() else {
            return;
        };
        let label_width = fields
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);
        let rows = fields
            .into_iter()
            .map(|(label, value)| Row::new(vec![Cell::from(bold(label)), Cell::from(value)]));
        let widget = Table::new(
            rows,
            [Constraint::Length(label_width as u16), Constraint::Fill(1)],
        )
        .column_spacing(2)
        .block(Block::bordered().title(bold(format!(" {title} "))));
        frame.render_widget(widget, area);
    }

    fn draw_footer(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let table = model.table();
        let mut spans = vec![
            Span::raw(format!(" Page {} of {}", table.page_index() + 1, table.page_count())),
            Span::raw(format!(
                " | Showing {} of {} records",
                table.visible_rows().len(),
                table.total_count()
            )),
        ];
        if table.filtered_count() != table.total_count() {
            spans.push(Span::raw(format!(" ({} matching)", table.filtered_count())));
        }
        if !table.search_term().is_empty() {
            spans.push(Span::styled(
                format!(" | search: \"{}\"", table.search_term()),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans.push(" | <?> help ".dark_gray());
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_cmdline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        if let Some((mode, input)) = model.cmd_input() {
            let prompt = mode.prompt();
            let line = Line::from(vec![prompt.bold(), Span::raw(input.input.clone())]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + (prompt.chars().count() + input.cursor) as u16;
            frame.set_cursor_position((std::cmp::min(x, area.right().saturating_sub(1)), area.y));
            return;
        }

        let mut style = Style::default();
        if Instant::now() - model.last_status_message_update() > STATUS_MESSAGE_FADE {
            style = style.fg(Color::DarkGray);
        }
        frame.render_widget(
            Paragraph::new(Span::styled(model.status_message().to_string(), style)),
            area,
        );
    }

    fn draw_popup(&self, title: &str, text: &str, frame: &mut Frame, percent_x: u16, percent_y: u16) {
        let area = Self::popup_area(frame.area(), percent_x, percent_y);
        let block = Block::bordered().title(bold(title.to_string()));
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(Text::from(text.to_string()))
                .wrap(Wrap { trim: false })
                .block(block),
            area,
        );
    }

    fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
        let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
        let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
        let [area] = vertical.areas(area);
        let [area] = horizontal.areas(area);
        area
    }
}
