use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use noeul_config::Config;
use noeul_sky::{FrameStats, PointerEvent, PointerKind, SkyContext, SkyOptions};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::{Color, Stylize},
    text::Line,
};
use tracing::{debug, info};

use crate::terminal::{
    CELL_HEIGHT, SkyView, TerminalBackend, TerminalHost, cell_center, viewport_for,
};

const FOOTER_COLOR: Color = Color::Rgb(212, 165, 116);

/// The main application which holds the sky and the terminal state.
pub struct App {
    /// Is the application running?
    running: bool,
    /// The sky, absent while the terminal has no cells.
    sky: Option<SkyContext<TerminalBackend>>,
    config: Config,
    started: Instant,
    frame_interval: Duration,
    /// Whether the terminal has focus.
    focused: bool,
    /// Paused by the user.
    paused: bool,
    /// Footer row, shared with the pointer exclusion test.
    footer_row: Rc<Cell<Option<u16>>>,
    last_stats: FrameStats,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new(config: Config) -> Self {
        let frame_interval = Duration::from_secs_f64(1.0 / config.target_fps.max(1) as f64);
        Self {
            running: false,
            sky: None,
            config,
            started: Instant::now(),
            frame_interval,
            focused: true,
            paused: false,
            footer_row: Rc::new(Cell::new(None)),
            last_stats: FrameStats::default(),
        }
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        let size = terminal.size()?;
        self.mount(size.width, size.height)?;

        self.running = true;
        while self.running {
            let frame_start = Instant::now();
            let now = self.now_ms();
            if let Some(sky) = self.sky.as_mut() {
                let stats = sky.tick(now);
                if stats.rendered {
                    self.last_stats = stats;
                }
            }
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events(frame_start)?;
        }

        if let Some(sky) = self.sky.as_mut() {
            sky.dispose();
        }
        Ok(())
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Start the sky on a `cols` by `rows` terminal.
    fn mount(&mut self, cols: u16, rows: u16) -> color_eyre::Result<()> {
        self.update_footer_row(rows);
        let mut host = TerminalHost::new(cols, rows, self.config.clone());
        let footer_row = Rc::clone(&self.footer_row);
        let options = SkyOptions::new()
            .with_tier(self.config.tier)
            .with_policy(self.config.detection.clone())
            .with_seed(self.config.seed)
            .with_exclusion(move |event| {
                let footer_top = footer_row.get().map(|row| row as f32 * CELL_HEIGHT);
                footer_top.is_some_and(|top| event.position.y >= top)
            });
        self.sky = SkyContext::init(&mut host, options)?;
        match &self.sky {
            Some(sky) => info!(cols, rows, tier = %sky.tier(), "sky mounted"),
            None => debug!(cols, rows, "terminal has no cells, waiting for a resize"),
        }
        Ok(())
    }

    fn update_footer_row(&self, rows: u16) {
        let row = (self.config.show_help && rows > 0).then(|| rows - 1);
        self.footer_row.set(row);
    }

    /// Renders the user interface.
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if let Some(sky) = &self.sky {
            frame.render_widget(SkyView::new(sky.backend()), area);
        }

        if !self.config.show_help {
            return;
        }
        let [_, footer] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let stats = &self.last_stats;
        let status = if self.paused {
            " paused".to_string()
        } else {
            format!(" {} stars  {} meteors", stats.stars, stats.meteors)
        };
        let help = Line::from(vec![
            "q".bold().fg(FOOTER_COLOR),
            " quit  ".dark_gray(),
            "space".bold().fg(FOOTER_COLOR),
            " pause  ".dark_gray(),
            "m".bold().fg(FOOTER_COLOR),
            " meteor  ".dark_gray(),
            "click".bold().fg(FOOTER_COLOR),
            " meteor ".dark_gray(),
            status.dark_gray(),
        ])
        .centered();
        frame.render_widget(help, footer);
    }

    /// Reads the crossterm events until the next frame is due.
    fn handle_crossterm_events(&mut self, frame_start: Instant) -> color_eyre::Result<()> {
        loop {
            let timeout = self.frame_interval.saturating_sub(frame_start.elapsed());
            if !event::poll(timeout)? {
                return Ok(());
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(mouse) => self.on_mouse_event(mouse),
                Event::Resize(cols, rows) => self.on_resize(cols, rows)?,
                Event::FocusLost => {
                    self.focused = false;
                    self.sync_visibility();
                }
                Event::FocusGained => {
                    self.focused = true;
                    self.sync_visibility();
                }
                _ => {}
            }
            if !self.running {
                return Ok(());
            }
        }
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char(' ')) => self.toggle_pause(),
            (_, KeyCode::Char('m')) => {
                if let Some(sky) = self.sky.as_mut() {
                    sky.spawn_meteor();
                }
            }
            _ => {}
        }
    }

    fn on_mouse_event(&mut self, mouse: MouseEvent) {
        if !matches!(mouse.kind, MouseEventKind::Down(_)) {
            return;
        }
        let event = PointerEvent {
            position: cell_center(mouse.column, mouse.row),
            kind: PointerKind::Mouse,
        };
        if let Some(sky) = self.sky.as_mut() {
            sky.on_pointer_down(&event);
        }
    }

    fn on_resize(&mut self, cols: u16, rows: u16) -> color_eyre::Result<()> {
        let now = self.now_ms();
        self.update_footer_row(rows);
        if let Some(sky) = self.sky.as_mut() {
            sky.on_resize(viewport_for(cols, rows), now);
        } else {
            self.mount(cols, rows)?;
            self.sync_visibility();
        }
        Ok(())
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.sync_visibility();
    }

    /// The sky animates only while focused and not paused.
    fn sync_visibility(&mut self) {
        let visible = self.focused && !self.paused;
        let now = self.now_ms();
        if let Some(sky) = self.sky.as_mut() {
            sky.on_visibility(visible, now);
        }
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}
