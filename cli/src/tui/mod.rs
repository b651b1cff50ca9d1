pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use salesdash_core::{DashboardUseCase, RecordSource, View};

use crate::tui::app::DashboardApp;

pub fn run<S: RecordSource>(dashboard: DashboardUseCase<S>, view: View) -> Result<()> {
    // Build the state before touching the terminal so load errors print normally.
    let mut app = DashboardApp::new(dashboard, view)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: Backend, S: RecordSource>(
    terminal: &mut Terminal<B>,
    app: &mut DashboardApp<S>,
) -> io::Result<()> {
    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Tab => app.switch_focus(),
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Right | KeyCode::Char('l') => app.next_panel(),
            KeyCode::Left | KeyCode::Char('h') => app.previous_panel(),
            KeyCode::Char(' ') | KeyCode::Enter => app.toggle_filter(),
            KeyCode::Char('c') => app.clear_filters(),
            KeyCode::Char('r') => app.reload(),
            _ => {}
        }
    }
}
