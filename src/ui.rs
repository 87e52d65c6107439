use crate::app::{App, AppMode, FrameLayout};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use vgrid::{FontSpec, RenderedCell, SortDirection};

const COLUMN_SPACING: u16 = 1;

pub fn draw(f: &mut Frame, app: &mut App) {
    let filter_height = if app.grid.store().filter_enabled() { 3 } else { 0 };
    let pager_height = if app.grid.config().paginator { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(filter_height),
                Constraint::Min(3),
                Constraint::Length(pager_height),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(f.size());

    if filter_height > 0 {
        draw_filter(f, chunks[0], app);
    }
    draw_data(f, chunks[1], app);
    if pager_height > 0 {
        draw_paginator(f, chunks[2], app);
    }
    draw_status(f, chunks[3], app);

    if app.show_cell_viewer {
        draw_cell_viewer(f, chunks[1], app);
    }
    if app.show_help {
        draw_help(f, chunks[1]);
    }
}

fn draw_filter(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.mode == AppMode::Filter;
    let text = if app.filter_input.is_empty() && !focused {
        Span::styled(
            app.grid.config().filter_placeholder.as_str(),
            Style::default().fg(Color::DarkGray),
        )
    } else if focused {
        Span::raw(format!("{}_", app.filter_input))
    } else {
        Span::raw(app.filter_input.as_str())
    };
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let p = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title("Filter"),
    );
    f.render_widget(p, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let mode = match app.mode {
        AppMode::Normal => "NORMAL",
        AppMode::Filter => "FILTER",
    };
    let mut spans = vec![
        Span::styled(
            format!("[{mode}] "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(&app.status),
    ];
    if app.grid.is_pending() {
        spans.push(Span::styled(" | working…", Style::default().fg(Color::Yellow)));
    }
    let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::TOP));
    f.render_widget(p, area);
}

fn draw_paginator(f: &mut Frame, area: Rect, app: &App) {
    let text = format!(
        "Page {} of {}  ({} per page, n/p to change)",
        app.grid.current_page() + 1,
        app.grid.page_count(),
        app.grid.config().page_size
    );
    f.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn draw_data(f: &mut Frame, area: Rect, app: &mut App) {
    let title = format!(
        "Data ({} of {} rows)",
        app.grid.displayed_len(),
        app.grid.store().rows().len()
    );
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    let columns = app.grid.columns();

    if columns.is_empty() {
        let p = Paragraph::new("No data loaded").block(block);
        f.render_widget(p, area);
        app.layout = FrameLayout::default();
        return;
    }

    let widths = column_widths(inner.width, &columns.widths());
    let header_cells = cell_positions(inner.x, &widths);

    let sort = app.grid.sort_state();
    let header = Row::new(columns.defs().iter().map(|c| {
        let arrow = match sort {
            Some(s) if s.field == c.field => match s.direction {
                SortDirection::Ascending => " ▲",
                SortDirection::Descending => " ▼",
                SortDirection::None => "",
            },
            _ => "",
        };
        Cell::from(format!("{}{}", c.title, arrow))
    }))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let body_rows = inner.height.saturating_sub(1);
    let range = app.grid.rendered_range();
    let font = FontSpec::monospace();
    let mut rendered = Vec::with_capacity(range.len());
    let mut rows = Vec::with_capacity(range.len());
    for pos in range.clone() {
        let Some(row) = app.grid.displayed_row(pos) else {
            break;
        };
        let texts: Vec<String> = columns.defs().iter().map(|c| c.render_cell(row)).collect();
        let cells = texts.iter().enumerate().map(|(c_idx, text)| {
            let cell = Cell::from(text.clone());
            if pos == app.sel_row && c_idx == app.sel_col {
                cell.style(Style::default().bg(Color::Blue).fg(Color::Black))
            } else {
                cell
            }
        });
        rows.push(Row::new(cells.collect::<Vec<_>>()));
        rendered.push(
            texts
                .into_iter()
                .map(|t| RenderedCell::new(t, font.clone()))
                .collect(),
        );
    }

    if rows.is_empty()
        && let Some(msg) = app.grid.empty_message()
    {
        let table = Table::new(Vec::<Row>::new(), widths.iter().map(|w| Constraint::Length(*w)))
            .header(header)
            .block(block)
            .column_spacing(COLUMN_SPACING);
        f.render_widget(table, area);
        let msg_area = Rect {
            y: inner.y + 1,
            height: 1,
            ..inner
        };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            msg_area,
        );
    } else {
        let table = Table::new(rows, widths.iter().map(|w| Constraint::Length(*w)))
            .header(header)
            .block(block)
            .column_spacing(COLUMN_SPACING);
        f.render_widget(table, area);
    }

    app.layout = FrameLayout {
        header_y: inner.y,
        header_cells,
        body_y: inner.y + 1,
        body_rows,
        body_width: inner.width,
        rendered,
        first_row: range.start,
    };
}

fn draw_cell_viewer(f: &mut Frame, area: Rect, app: &App) {
    let height = (area.height / 3).max(3);
    let rect = Rect {
        y: area.y + area.height.saturating_sub(height),
        height,
        ..area
    };
    let text = app.current_cell_text().unwrap_or_default();
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Cell")),
        rect,
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let lines = [
        "/        filter (Esc clears, Enter keeps)",
        "s        cycle sort on selected column",
        "arrows   move (j/k also)",
        "PgDn/PgUp, n/p  next/previous page",
        "+ / -    move the selected column's right edge",
        "a        autosize columns",
        "v        cell viewer",
        "r        reload file",
        "mouse    click header to sort, drag its edge to resize",
        "?        close help    q  quit",
    ];
    let width = (lines.iter().map(|l| l.len()).max().unwrap_or(0) as u16 + 4).min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(lines.iter().map(|l| Line::from(*l)).collect::<Vec<_>>())
            .block(Block::default().borders(Borders::ALL).title("Keys")),
        rect,
    );
}

/// Cell widths for painting: measured widths rounded to cells, at least one
/// cell each. Columns not yet measured share whatever is left evenly.
fn column_widths(total_width: u16, widths: &[Option<f32>]) -> Vec<u16> {
    if widths.is_empty() {
        return vec![];
    }
    let gaps = u16::try_from(widths.len() - 1).unwrap_or(u16::MAX);
    let avail = total_width.saturating_sub(COLUMN_SPACING.saturating_mul(gaps));
    let fixed: u16 = widths
        .iter()
        .flatten()
        .map(|w| w.round().max(1.0) as u16)
        .fold(0, u16::saturating_add);
    let unset = u16::try_from(widths.iter().filter(|w| w.is_none()).count()).unwrap_or(u16::MAX);
    let share = if unset > 0 {
        (avail.saturating_sub(fixed) / unset).max(1)
    } else {
        0
    };
    widths
        .iter()
        .map(|w| match w {
            Some(w) => w.round().max(1.0) as u16,
            None => share,
        })
        .collect()
}

fn cell_positions(x0: u16, widths: &[u16]) -> Vec<(u16, u16)> {
    let mut x = x0;
    widths
        .iter()
        .map(|w| {
            let cell = (x, *w);
            x = x.saturating_add(*w).saturating_add(COLUMN_SPACING);
            cell
        })
        .collect()
}
