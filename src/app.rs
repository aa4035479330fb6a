use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use wxdash::display::{DisplayWeather, HourSlot, Metric, Reading};
use wxdash::Dashboard;

const TICK: Duration = Duration::from_millis(250);

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    dashboard: Dashboard,
    refresh: Arc<Notify>,
) -> io::Result<()> {
    loop {
        let weather = dashboard.current();
        let loading = dashboard.is_loading();
        terminal.draw(|f| ui(f, &weather, loading))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('r') => refresh.notify_one(),
                _ => {}
            }
        }
    }
}

fn panel<'a>(title: String, highlight: bool) -> Block<'a> {
    let border = if highlight { Color::Yellow } else { Color::Cyan };
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {title} "), Style::default().fg(Color::Yellow)))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(border))
        .border_type(BorderType::Rounded)
}

fn temperature(reading: &Reading) -> String {
    match reading {
        Reading::Number(t) => format!("{t}°C"),
        other => other.to_string(),
    }
}

fn with_unit(reading: &Reading, unit: &str) -> String {
    if reading.is_placeholder() || unit.is_empty() {
        reading.to_string()
    } else {
        format!("{reading} {unit}")
    }
}

fn display_headline(weather: &DisplayWeather) -> Paragraph {
    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                weather.day.clone(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(weather.location.clone(), Style::default().fg(Color::Yellow)),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn display_current_conditions(weather: &DisplayWeather) -> Paragraph {
    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(format!(" {} ", weather.condition_icon.glyph())),
            Span::styled(weather.condition.clone(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                temperature(&weather.temperature_c),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
    ])
    .block(panel("Current Conditions".to_string(), false))
}

fn display_metric(metric: &Metric) -> Paragraph {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::raw(format!(" {} ", metric.icon.glyph())),
            Span::styled(
                with_unit(&metric.value, &metric.unit),
                Style::default().fg(Color::Green),
            ),
        ]),
    ])
    .block(panel(metric.title.clone(), false))
}

fn display_hour(slot: &HourSlot) -> Paragraph {
    let value = if slot.is_current {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    let temp = match &slot.temperature_c {
        Reading::Number(t) => format!("{t}°"),
        other => other.to_string(),
    };
    Paragraph::new(vec![
        Line::from(Span::styled(slot.description.clone(), value)),
        Line::from(slot.icon.glyph()),
        Line::from(Span::styled(temp, value)),
    ])
    .alignment(Alignment::Center)
    .block(panel(slot.time.clone(), slot.is_current))
}

fn display_status(loading: bool) -> Paragraph<'static> {
    let line = if loading {
        Line::from(Span::styled(
            " Loading weather data...",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(" r refresh  q quit", Style::default().fg(Color::DarkGray)))
    };
    Paragraph::new(line)
}

fn ui(f: &mut Frame, weather: &DisplayWeather, loading: bool) {
    let [headline, current, metrics, hourly, status] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .margin(1)
    .areas(f.area());

    f.render_widget(display_headline(weather), headline);
    f.render_widget(display_current_conditions(weather), current);

    let boxes: [Rect; 4] = Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(metrics);
    let metrics = [
        &weather.wind,
        &weather.humidity,
        &weather.uv_index,
        &weather.visibility,
    ];
    for (metric, area) in metrics.into_iter().zip(boxes) {
        f.render_widget(display_metric(metric), area);
    }

    let slots: [Rect; 3] = Layout::horizontal([Constraint::Ratio(1, 3); 3]).areas(hourly);
    for (slot, area) in weather.hourly.iter().zip(slots) {
        f.render_widget(display_hour(slot), area);
    }

    f.render_widget(display_status(loading), status);
}
