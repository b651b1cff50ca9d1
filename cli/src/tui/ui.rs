use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, BorderType, Borders, Chart, Dataset, GraphType, List,
        ListItem, Paragraph, Row, Table, Wrap,
    },
    Frame,
};
use salesdash_core::model::aggregate::{CountValue, GroupValue, HistogramBin, SeriesPoint};
use salesdash_core::{AggregateResult, ChartKind, Panel, PanelData, RecordSource, View};

use crate::render::{number, truncate};
use crate::tui::app::{DashboardApp, Focus};

struct Theme {
    primary: Color,
    muted: Color,
    text: Color,
    bar: Color,
    warn: Color,
}

const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    text: Color::White,
    bar: Color::Green,
    warn: Color::Red,
};

const LABEL_WIDTH: usize = 12;

fn block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { THEME.primary } else { THEME.muted }))
}

pub fn draw<S: RecordSource>(f: &mut Frame, app: &mut DashboardApp<S>) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Help
        ])
        .split(size);

    draw_header(f, app, main_chunks[0]);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(20)])
        .split(main_chunks[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(View::ALL.len() as u16 + 2),
            Constraint::Min(3),
        ])
        .split(content_chunks[0]);

    draw_view_menu(f, app, sidebar[0]);
    draw_filters(f, app, sidebar[1]);
    draw_main(f, app, content_chunks[1]);

    let footer = Paragraph::new(
        "Tab: Focus | j/k: Move | Space: Toggle | h/l: Panel | c: Clear | r: Reload | q: Quit",
    )
    .style(Style::default().fg(THEME.muted))
    .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[2]);
}

fn draw_header<S: RecordSource>(f: &mut Frame, app: &DashboardApp<S>, area: Rect) {
    let counts = match &app.response {
        Some(r) => format!("{} of {} rows", r.filtered_rows, r.total_rows),
        None => String::new(),
    };
    let filters = if app.selection.is_unconstrained() {
        "no filters".to_string()
    } else {
        app.selection
            .iter()
            .map(|(field, values)| format!("{}={}", field.key(), values.len()))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let line = Line::from(vec![
        Span::styled(
            "SALESDASH  ",
            Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            app.current_view().title(),
            Style::default().fg(THEME.text).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}  ({})", counts, filters), Style::default().fg(THEME.muted)),
    ]);
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, area);
}

fn draw_view_menu<S: RecordSource>(f: &mut Frame, app: &mut DashboardApp<S>, area: Rect) {
    let items: Vec<ListItem> = View::ALL.iter().map(|v| ListItem::new(v.title())).collect();
    let list = List::new(items)
        .block(block(" Views ".to_string(), app.focus == Focus::Views))
        .highlight_style(Style::default().bg(THEME.muted).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, area, &mut app.views);
}

fn draw_filters<S: RecordSource>(f: &mut Frame, app: &mut DashboardApp<S>, area: Rect) {
    let items: Vec<ListItem> = app
        .entries
        .iter()
        .map(|entry| {
            let mark = if app.is_checked(entry) { "[x]" } else { "[ ]" };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", mark)),
                Span::styled(
                    format!("{:<8}", entry.field.key()),
                    Style::default().fg(THEME.muted),
                ),
                Span::raw(entry.value.clone()),
            ]))
        })
        .collect();

    // An empty group means every value of that field passes.
    let list = List::new(items)
        .block(block(" Filters (none = all) ".to_string(), app.focus == Focus::Filters))
        .highlight_style(Style::default().bg(THEME.muted).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.filters);
}

fn draw_main<S: RecordSource>(f: &mut Frame, app: &DashboardApp<S>, area: Rect) {
    if let Some(message) = &app.error {
        let error = Paragraph::new(message.as_str())
            .style(Style::default().fg(THEME.warn))
            .wrap(Wrap { trim: true })
            .block(block(" Error ".to_string(), false));
        f.render_widget(error, area);
        return;
    }

    let Some(panel) = app.current_panel() else {
        f.render_widget(
            Paragraph::new("No data available").alignment(Alignment::Center),
            area,
        );
        return;
    };

    let title = format!(" {} ({}/{}) ", panel.title, app.panel + 1, app.panel_count());
    draw_panel(f, panel, title, area);
}

fn draw_panel(f: &mut Frame, panel: &Panel, title: String, area: Rect) {
    let frame = block(title, true);
    match &panel.data {
        PanelData::NoData { reason } => {
            let msg = Paragraph::new(reason.as_str())
                .style(Style::default().fg(THEME.muted))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(frame);
            f.render_widget(msg, area);
        }
        PanelData::Columns { names } => {
            let lines: Vec<Line> = names.iter().map(|n| Line::from(n.as_str())).collect();
            f.render_widget(Paragraph::new(lines).block(frame), area);
        }
        PanelData::Records { rows } => {
            let header = ["Date", "City", "Gender", "Product line", "Total", "Rating"];
            let body = rows
                .iter()
                .map(|r| {
                    vec![
                        r.date.format("%Y-%m-%d").to_string(),
                        r.city.clone(),
                        r.gender.to_string(),
                        truncate(&r.product_line, 22),
                        number(r.total),
                        format!("{:.1}", r.rating),
                    ]
                })
                .collect();
            draw_table(f, frame, &header, body, area);
        }
        PanelData::Aggregate { result } if result.is_empty() => {
            let msg = Paragraph::new("No rows match the current filters.")
                .alignment(Alignment::Center)
                .block(frame);
            f.render_widget(msg, area);
        }
        PanelData::Aggregate { result } => draw_result(f, panel.chart, result, frame, area),
    }
}

fn draw_result(f: &mut Frame, chart: ChartKind, result: &AggregateResult, frame: Block<'static>, area: Rect) {
    match result {
        AggregateResult::Counts(counts) => {
            let horizontal = chart == ChartKind::Pie;
            draw_bars(f, frame, count_bars(counts), horizontal, area);
        }
        AggregateResult::Groups(groups) => {
            let horizontal = matches!(chart, ChartKind::HorizontalBar | ChartKind::Sunburst);
            draw_bars(f, frame, group_bars(groups), horizontal, area);
        }
        AggregateResult::Histogram(bins) => draw_bars(f, frame, histogram_bars(bins), false, area),
        AggregateResult::Series(points) => draw_series(f, frame, points, area),
        AggregateResult::Correlation(matrix) => {
            let mut header = vec![""];
            header.extend(matrix.fields.iter().map(|field| field.column()));
            let body: Vec<Vec<String>> = matrix
                .fields
                .iter()
                .zip(&matrix.values)
                .map(|(field, row)| {
                    std::iter::once(field.column().to_string())
                        .chain(row.iter().map(|v| number(*v)))
                        .collect::<Vec<_>>()
                })
                .collect();
            draw_table(f, frame, &header, body, area);
        }
        AggregateResult::Boxes(boxes) => {
            let header = ["Group", "N", "Min", "Q1", "Median", "Q3", "Max"];
            let body = boxes
                .iter()
                .map(|b| {
                    vec![
                        b.key.clone(),
                        b.count.to_string(),
                        number(b.min),
                        number(b.q1),
                        number(b.median),
                        number(b.q3),
                        number(b.max),
                    ]
                })
                .collect();
            draw_table(f, frame, &header, body, area);
        }
        AggregateResult::Summary(columns) => {
            let header = ["Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"];
            let fmt = |v: Option<f64>| v.map(number).unwrap_or_else(|| "-".to_string());
            let body = columns
                .iter()
                .map(|c| {
                    vec![
                        c.field.column().to_string(),
                        c.count.to_string(),
                        fmt(c.mean),
                        fmt(c.std),
                        fmt(c.min),
                        fmt(c.p25),
                        fmt(c.p50),
                        fmt(c.p75),
                        fmt(c.max),
                    ]
                })
                .collect();
            draw_table(f, frame, &header, body, area);
        }
        AggregateResult::Points(points) => {
            let header = ["x", "y", "z", "hue", "label"];
            let fmt = |v: Option<f64>| v.map(number).unwrap_or_else(|| "-".to_string());
            let body = points
                .iter()
                .map(|p| {
                    vec![
                        number(p.x),
                        number(p.y),
                        fmt(p.z),
                        fmt(p.hue),
                        p.label.clone().unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            draw_table(f, frame, &header, body, area);
        }
    }
}

/// (label, bar length, text shown on the bar)
type BarData = Vec<(String, u64, String)>;

fn count_bars(counts: &[CountValue]) -> BarData {
    counts
        .iter()
        .map(|c| (truncate(&c.key, LABEL_WIDTH), c.count as u64, c.count.to_string()))
        .collect()
}

fn group_bars(groups: &[GroupValue]) -> BarData {
    groups
        .iter()
        .map(|g| {
            let label = truncate(&g.key.to_string(), 2 * LABEL_WIDTH);
            (label, g.value.max(0.0).round() as u64, number(g.value))
        })
        .collect()
}

fn histogram_bars(bins: &[HistogramBin]) -> BarData {
    bins.iter()
        .map(|b| (format!("{:.1}", b.lower), b.count as u64, b.count.to_string()))
        .collect()
}

fn draw_bars(f: &mut Frame, frame: Block<'static>, data: BarData, horizontal: bool, area: Rect) {
    let bars: Vec<Bar> = data
        .into_iter()
        .map(|(label, value, text)| {
            Bar::default()
                .label(Line::from(label))
                .value(value)
                .style(Style::default().fg(THEME.bar))
                .text_value(text)
        })
        .collect();

    let mut chart = BarChart::default()
        .block(frame)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    chart = if horizontal {
        chart.direction(Direction::Horizontal).bar_width(1)
    } else {
        chart.bar_width(LABEL_WIDTH as u16 / 2)
    };
    f.render_widget(chart, area);
}

fn draw_series(f: &mut Frame, frame: Block<'static>, points: &[SeriesPoint], area: Rect) {
    let data: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect();
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    let first = points.first().map(|p| p.date.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let last = points.last().map(|p| p.date.format("%Y-%m-%d").to_string()).unwrap_or_default();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(THEME.bar))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(frame)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(THEME.muted))
                .bounds([0.0, data.len().saturating_sub(1).max(1) as f64])
                .labels([first, last]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(THEME.muted))
                .bounds([0.0, max.max(1.0)])
                .labels(["0".to_string(), number(max)]),
        );
    f.render_widget(chart, area);
}

fn draw_table(f: &mut Frame, frame: Block<'static>, header: &[&str], body: Vec<Vec<String>>, area: Rect) {
    let widths: Vec<Constraint> = header
        .iter()
        .enumerate()
        .map(|(i, _)| if i == 0 { Constraint::Min(12) } else { Constraint::Length(10) })
        .collect();
    let rows: Vec<Row> = body.into_iter().map(Row::new).collect();
    let header = Row::new(header.iter().map(|h| h.to_string()))
        .style(Style::default().fg(Color::Yellow));

    let table = Table::new(rows, widths).header(header).block(frame);
    f.render_widget(table, area);
}
