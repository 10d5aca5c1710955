//! TUI rendering and terminal management (impure shell)
//!
//! The terminal host for a layout session: scrolling drives pagination,
//! pages are fetched on a worker thread, assets load on their own threads,
//! and every completion is applied on this thread between frames.

pub mod board;

pub use board::{Board, FeedStatus};

use crate::layout::ColumnGeometry;
use crate::model::AppError;
use crate::pagination::FetchRequest;
use crate::session::{LayoutSession, SessionConfig};
use crate::source::{spawn_loads, AssetLoader, DataSource, PageFetcher};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long the loop waits for terminal input before servicing the session.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Application error
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    terminal: Terminal<B>,
    session: LayoutSession,
    board: Board,
    fetcher: PageFetcher,
    loader: Arc<dyn AssetLoader>,
    /// Container width and terminal width at startup; resizes scale from these.
    base_container_width: f64,
    base_terminal_width: u16,
    paused: bool,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen
    pub fn new(
        config: SessionConfig,
        source: Box<dyn DataSource>,
        loader: Arc<dyn AssetLoader>,
    ) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Self::with_terminal(terminal, config, source, loader)
    }

    /// Run the main event loop
    ///
    /// Returns when the user quits (q, Esc or Ctrl+C).
    pub fn run(&mut self) -> Result<(), TuiError> {
        let request = self.session.prime(&mut self.board);
        self.dispatch(request);
        self.draw()?;

        loop {
            let mut dirty = false;
            if event::poll(TICK_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            self.session.teardown();
                            return Ok(());
                        }
                        dirty = true;
                    }
                    Event::Resize(width, height) => {
                        self.handle_resize(width, height);
                        dirty = true;
                    }
                    _ => {}
                }
            }

            dirty |= self.service(Instant::now());
            if dirty {
                self.draw()?;
            }
        }
    }
}

impl<B> TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    /// Build an app around an already-initialized terminal.
    pub fn with_terminal(
        terminal: Terminal<B>,
        config: SessionConfig,
        source: Box<dyn DataSource>,
        loader: Arc<dyn AssetLoader>,
    ) -> Result<Self, TuiError> {
        let width = match terminal.size() {
            Ok(size) if size.width > 0 => size.width,
            _ => 80,
        };
        let units_per_row = units_per_row(&config.geometry, width);
        let board = Board::new(config.geometry.columns(), units_per_row);
        info!(
            columns = config.geometry.columns(),
            terminal_width = width,
            units_per_row,
            "Terminal board ready"
        );

        Ok(Self {
            terminal,
            base_container_width: config.geometry.container_width(),
            base_terminal_width: width,
            session: LayoutSession::new(config),
            board,
            fetcher: PageFetcher::spawn(source),
            loader,
            paused: false,
        })
    }

    /// The render sink.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The layout session.
    pub fn session(&self) -> &LayoutSession {
        &self.session
    }

    /// Apply finished pages and asset completions, then re-check the scroll
    /// position. Returns true if anything changed on screen.
    fn service(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while let Some(response) = self.fetcher.try_recv() {
            let loads = self
                .session
                .on_page_fetched(response.page, response.result, &mut self.board);
            debug!(page = %response.page, loads = loads.len(), "Starting asset loads");
            // Workers are detached; results come back through the session queue
            drop(spawn_loads(
                Arc::clone(&self.loader),
                loads,
                self.session.completion_sender(),
            ));
            changed = true;
        }

        if self.session.pump(&mut self.board) > 0 {
            changed = true;
        }

        let bottom = self.viewport_bottom();
        let request = if changed {
            // Content moved under a still viewport; evaluate as a scroll
            self.session.on_scroll(bottom, now, &mut self.board)
        } else {
            self.session.on_tick(bottom, now, &mut self.board)
        };
        if request.is_some() {
            changed = true;
        }
        self.dispatch(request);
        changed
    }

    fn dispatch(&mut self, request: Option<FetchRequest>) {
        if let Some(request) = request {
            if !self.fetcher.request(request) {
                warn!("Page fetcher is gone; request dropped");
            }
        }
    }

    /// Handle a single keyboard event
    ///
    /// Returns true if app should quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        let rows = self.viewport_rows();
        let page = rows.max(1) as isize;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.board.scroll_by(1, rows),
            KeyCode::Up | KeyCode::Char('k') => self.board.scroll_by(-1, rows),
            KeyCode::PageDown | KeyCode::Char(' ') => self.board.scroll_by(page, rows),
            KeyCode::PageUp => self.board.scroll_by(-page, rows),
            KeyCode::Home | KeyCode::Char('g') => self.board.scroll_to_top(),
            KeyCode::End | KeyCode::Char('G') => self.board.scroll_to_bottom(rows),
            KeyCode::Char('s') => {
                self.paused = !self.paused;
                if self.paused {
                    self.session.stop();
                } else {
                    self.session.start();
                }
                info!(paused = self.paused, "Pagination toggled");
                return false;
            }
            _ => return false,
        }

        let bottom = self.viewport_bottom();
        let request = self
            .session
            .on_scroll(bottom, Instant::now(), &mut self.board);
        self.dispatch(request);
        false
    }

    /// Scale the container width with the terminal width.
    fn handle_resize(&mut self, width: u16, height: u16) {
        debug!("Handling resize to {}x{}", width, height);
        let width = if width > 0 { width } else { 80 };
        let container_width =
            self.base_container_width * f64::from(width) / f64::from(self.base_terminal_width);
        if let Err(err) = self.session.resize(container_width, &mut self.board) {
            warn!(%err, container_width, "Resize rejected");
        }
    }

    /// Body rows below the header line.
    fn viewport_rows(&self) -> usize {
        match self.terminal.size() {
            Ok(size) => size.height.saturating_sub(1) as usize,
            Err(_) => 0,
        }
    }

    fn viewport_bottom(&self) -> f64 {
        self.board.viewport_bottom(self.viewport_rows())
    }

    /// Render the current frame
    fn draw(&mut self) -> Result<(), TuiError> {
        let board = &self.board;
        self.terminal
            .draw(|frame| frame.render_widget(board, frame.area()))?;
        Ok(())
    }
}

/// Layout units per terminal row such that a square asset spans about as
/// many rows as half its column's cell width (terminal cells are tall).
pub fn units_per_row(geometry: &ColumnGeometry, terminal_width: u16) -> f64 {
    let columns = geometry.columns().max(1);
    let gaps = columns.saturating_sub(1);
    let cells = (terminal_width as usize).saturating_sub(gaps) / columns;
    let rows_per_square = (cells as f64 / 2.0).max(1.0);
    (geometry.column_width() / rows_per_square).max(1.0)
}

/// Initialize the terminal and run the viewer until the user quits.
pub fn run(
    config: SessionConfig,
    source: Box<dyn DataSource>,
    loader: Arc<dyn AssetLoader>,
) -> Result<(), TuiError> {
    let mut app = TuiApp::new(config, source, loader)?;

    // Run the app and ensure cleanup happens even on error
    let result = app.run();

    // Always restore terminal state
    restore_terminal()?;

    result
}

/// Restore terminal to normal mode
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
