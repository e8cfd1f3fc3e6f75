//! Terminal session management and the main UI event loop.
//!
//! Terminal input and command results are merged into one [`Msg`] stream;
//! each message goes through the navigator, the resulting commands are
//! spawned, and the frame is redrawn.

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::cmd::{self, Command};
use crate::config::Config;
use crate::nav::{Msg, Navigator};
use crate::source::DataSource;
use crate::ui::draw::draw;

/// Raw mode plus alternate screen, undone on drop.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn init() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        restore_terminal();
    }
}

/// Leaves raw mode and the alternate screen. Safe to call more than once.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

fn dispatch(commands: Vec<Command>, source: &Arc<dyn DataSource>, tx: &mpsc::UnboundedSender<Msg>) {
    for command in commands {
        cmd::execute(command, source.clone(), tx.clone());
    }
}

/// Runs the UI until the user quits.
pub async fn run(config: Arc<Config>, source: Arc<dyn DataSource>) -> io::Result<()> {
    let mut session = TerminalSession::init()?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();
    let mut navigator = Navigator::new(config);

    let size = session.terminal.size()?;
    navigator.update(Msg::Resize(size.width, size.height));
    dispatch(navigator.start(), &source, &tx);
    tracing::info!(width = size.width, height = size.height, "session started");

    let mut events = EventStream::new();
    loop {
        session.terminal.draw(|f| draw(f, &navigator))?;

        let msg = tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => Msg::Key(key),
                Some(Ok(Event::Resize(width, height))) => Msg::Resize(width, height),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e),
                None => break,
            },
            Some(msg) = rx.recv() => msg,
        };

        let commands = navigator.update(msg);
        dispatch(commands, &source, &tx);
        if navigator.should_quit() {
            break;
        }
    }

    tracing::info!("session finished");
    Ok(())
}
