pub mod app;
pub mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use todoboard_core::TaskApi;
use tracing::{error, info};

use crate::tui::app::{ApiEvent, App, Focus};

const TICK: Duration = Duration::from_millis(100);

pub fn run(api: Arc<dyn TaskApi>, runtime: Handle) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (mut app, mut events) = App::new(api, runtime);
    app.refresh();
    info!("tui started");
    let res = run_app(&mut terminal, &mut app, &mut events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "tui loop failed");
        println!("{:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut UnboundedReceiver<ApiEvent>,
) -> io::Result<()> {
    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        while let Ok(answer) = events.try_recv() {
            app.handle(answer);
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if !handle_key(app, key) {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns `false` when the user asked to quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return false;
    }
    app.flash = None;

    match app.focus {
        Focus::List => match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Char(' ') => app.toggle_selected(),
            KeyCode::Char('e') | KeyCode::Enter => app.open_editor(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            KeyCode::Char('a') | KeyCode::Tab => app.focus_create(),
            KeyCode::Char('r') => app.refresh(),
            _ => {}
        },
        Focus::Create(_) => match key.code {
            KeyCode::Esc => app.focus_list(),
            KeyCode::Tab => app.next_field(),
            KeyCode::Enter => app.submit(),
            KeyCode::Char(c) => app.input_char(c),
            KeyCode::Backspace => app.delete_char(),
            _ => {}
        },
        Focus::Edit(_) => match key.code {
            KeyCode::Esc => app.close_editor(),
            KeyCode::Tab => app.next_field(),
            KeyCode::Enter => app.submit(),
            KeyCode::Char(c) => app.input_char(c),
            KeyCode::Backspace => app.delete_char(),
            _ => {}
        },
    }
    true
}
