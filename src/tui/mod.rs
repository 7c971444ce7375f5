//! Interactive reader.
//!
//! - [`pane`]: scrollable bordered regions with off-screen buffers
//! - [`layout`]: pane geometry for a terminal size
//! - [`screen`]: the five panes and their static text
//! - [`app`]: selection state and key actions
//! - [`draw`]: rewrites the panes whose state changed

pub mod app;
pub mod draw;
pub mod event;
pub mod layout;
pub mod messages;
pub mod pane;
pub mod screen;

use std::io::{self, Stdout};

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppContext, Result};

use self::app::TuiApp;
use self::event::{AppEvent, EventHandler};
use self::screen::Screen;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the reader until the user quits. `notices` are shown in the messages
/// pane before anything else.
pub async fn run(ctx: &AppContext, notices: Vec<String>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, notices).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: &AppContext, notices: Vec<String>) -> Result<()> {
    let mut screen = Screen::new(terminal.size()?, ctx.config.buffer_lines, &ctx.keys);
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new();

    for notice in notices {
        tui_app.log.push(notice);
    }

    // Show the frame before the first refresh stalls the loop
    draw::render(&mut tui_app, &mut screen, ctx).await;
    terminal.draw(|frame| screen.blit(frame.buffer_mut()))?;
    tui_app.start(ctx).await?;

    loop {
        let size = terminal.size()?;
        if size != screen.size() {
            tui_app.resize(&mut screen, size);
        }

        draw::render(&mut tui_app, &mut screen, ctx).await;
        terminal.draw(|frame| screen.blit(frame.buffer_mut()))?;

        match event_handler.next()? {
            AppEvent::Key(key) => {
                if let Some(action) = ctx.keys.action_for(&key) {
                    tui_app.handle_action(action, ctx, &mut screen).await;
                }
            }
            AppEvent::Resize(size) => {
                terminal.autoresize()?;
                tui_app.resize(&mut screen, size);
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}
