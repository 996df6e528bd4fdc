//! Interactive line reader: a minimal stand-in for a shell session that
//! shows the router's ghost text while the user types.
//!
//! The prompt, typed text and ghost text go to stderr. Submitted lines go to
//! stdout so the binary can be used in a pipeline.

use crate::collaborator::LocalCollaborator;
use crate::collaborator::local::SessionWrite;
use crate::config::GhostConfig;
use crate::router::{EventRouter, KeyInput};
use crate::terminal::{CursorPosition, GhostPainter, TerminalRenderer, display_width};
use anyhow::{Context as _, Result};
use crossterm::cursor::MoveLeft;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use ghostline_types::SessionId;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

const NONE: KeyModifiers = KeyModifiers::NONE;
const CTRL: KeyModifiers = KeyModifiers::CONTROL;
const SHIFT: KeyModifiers = KeyModifiers::SHIFT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplAction {
    Key(KeyInput),
    Exit,
}

/// Map a terminal key event to a line-editor action.
pub fn map_key(event: &KeyEvent) -> Option<ReplAction> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let action = match (event.code, event.modifiers) {
        (KeyCode::Char('c'), CTRL) | (KeyCode::Char('d'), CTRL) => ReplAction::Exit,
        (KeyCode::Char('f'), CTRL) => ReplAction::Key(KeyInput::Accept),
        (KeyCode::Char('u'), CTRL) => ReplAction::Key(KeyInput::Clear),
        (KeyCode::Char(ch), NONE) | (KeyCode::Char(ch), SHIFT) => {
            ReplAction::Key(KeyInput::Char(ch))
        }
        (KeyCode::Backspace, _) => ReplAction::Key(KeyInput::Backspace),
        (KeyCode::Enter, _) => ReplAction::Key(KeyInput::Submit),
        (KeyCode::Tab, _) | (KeyCode::Right, NONE) => ReplAction::Key(KeyInput::Accept),
        (KeyCode::Esc, _) => ReplAction::Key(KeyInput::Clear),
        _ => return None,
    };
    Some(action)
}

pub struct Repl {
    prompt: String,
    once: bool,
    router: EventRouter,
    collaborator: Arc<LocalCollaborator>,
    session_rx: UnboundedReceiver<SessionWrite>,
    painter: GhostPainter,
}

impl Repl {
    pub fn new(
        prompt: String,
        once: bool,
        config: GhostConfig,
        collaborator: Arc<LocalCollaborator>,
    ) -> Self {
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        collaborator.attach_session(session_tx);
        let painter = GhostPainter::new(config.paint_strategy);
        let router = EventRouter::new(SessionId(1), collaborator.clone(), config);
        Self {
            prompt,
            once,
            router,
            collaborator,
            session_rx,
            painter,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let result = self.event_loop().await;

        let mut renderer = TerminalRenderer::stderr();
        self.painter.erase(&mut renderer).ok();
        renderer.flush().ok();
        disable_raw_mode().ok();
        self.router.shutdown();
        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        let mut reader = EventStream::new();
        self.router.start();
        self.print_prompt()?;

        loop {
            tokio::select! {
                event = reader.next() => {
                    match event {
                        Some(Ok(Event::Key(key))) => match map_key(&key) {
                            Some(ReplAction::Exit) => {
                                debug!("exit requested");
                                break;
                            }
                            Some(ReplAction::Key(input)) => {
                                if self.on_key(input).await? {
                                    break;
                                }
                            }
                            None => {}
                        },
                        Some(Ok(Event::Resize(_, _))) => self.repaint()?,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => return Err(err).context("failed to read terminal event"),
                        None => break,
                    }
                }
                Some(message) = self.router.next_message() => {
                    self.router.handle_message(message);
                    self.repaint()?;
                }
                Some(write) = self.session_rx.recv() => {
                    self.echo(&write)?;
                    self.repaint()?;
                }
            }
        }
        Ok(())
    }

    /// Returns true when the loop should stop.
    async fn on_key(&mut self, input: KeyInput) -> Result<bool> {
        let mut renderer = TerminalRenderer::stderr();
        self.painter.erase(&mut renderer)?;

        let typed_width = display_width(self.router.input());
        let last_width = self
            .router
            .input()
            .chars()
            .last()
            .and_then(UnicodeWidthChar::width)
            .unwrap_or(0);

        let outcome = self.router.handle_key(input).await;
        match input {
            KeyInput::Char(ch) => queue!(renderer, Print(ch))?,
            KeyInput::Backspace if last_width > 0 => queue!(
                renderer,
                MoveLeft(last_width as u16),
                Clear(ClearType::UntilNewLine)
            )?,
            KeyInput::Clear if typed_width > 0 => queue!(
                renderer,
                MoveLeft(typed_width as u16),
                Clear(ClearType::UntilNewLine)
            )?,
            _ => {}
        }
        renderer.flush()?;

        // accepted text comes back through the session like any shell echo
        while let Ok(write) = self.session_rx.try_recv() {
            self.echo(&write)?;
        }

        if let Some(line) = outcome.submitted {
            queue!(renderer, Print("\r\n"))?;
            renderer.flush()?;
            self.painter.forget();
            self.collaborator.record_command(&line);

            let mut stdout = std::io::stdout();
            write!(stdout, "{line}\r\n")?;
            stdout.flush()?;
            if self.once {
                return Ok(true);
            }
            self.print_prompt()?;
        }

        self.repaint()?;
        Ok(false)
    }

    fn echo(&mut self, write: &SessionWrite) -> Result<()> {
        debug!("session {} echo: {:?}", write.session, write.text);
        let mut renderer = TerminalRenderer::stderr();
        self.painter.erase(&mut renderer)?;
        queue!(renderer, Print(&write.text))?;
        renderer.flush()?;
        Ok(())
    }

    fn print_prompt(&mut self) -> Result<()> {
        let mut renderer = TerminalRenderer::stderr();
        queue!(renderer, Print(&self.prompt))?;
        renderer.flush()?;
        Ok(())
    }

    fn repaint(&mut self) -> Result<()> {
        let mut renderer = TerminalRenderer::stderr();
        self.painter.erase(&mut renderer)?;
        renderer.flush()?;

        let ghost = self.router.ghost_text();
        if ghost.is_empty() {
            return Ok(());
        }
        let (column, row) = crossterm::cursor::position().context("failed to query cursor")?;
        let (width, _) = crossterm::terminal::size().context("failed to query terminal size")?;
        self.painter
            .paint(&mut renderer, ghost, CursorPosition::new(column, row), width)?;
        renderer.flush()?;
        Ok(())
    }
}
