use crate::cache::{CacheDir, DEFAULT_MAX_FILES};
use crate::config::Config;
use crate::fetch::HttpClient;
use crate::manager::{RefreshOutcome, WallpaperManager};
use crate::screen::SystemDisplay;
use crate::setter::{SwwwSetter, WallpaperSetter};
use crate::ui;
use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Bounded wait for an in-flight download on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Events from background threads.
pub enum AppEvent {
    Key(event::KeyEvent),
    RefreshDone(RefreshOutcome),
    Tick,
}

/// What the status line reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    Downloading,
    Updated,
    UsedCache,
    NoWallpaper,
    Error(String),
}

impl Status {
    pub fn message(&self) -> String {
        match self {
            Status::Ready => "Ready".to_string(),
            Status::Downloading => "Downloading wallpaper...".to_string(),
            Status::Updated => "Wallpaper updated ✓".to_string(),
            Status::UsedCache => "Using cached wallpaper ✓".to_string(),
            Status::NoWallpaper => "No wallpaper available".to_string(),
            Status::Error(msg) => format!("Error: {msg}"),
        }
    }
}

pub struct App {
    pub config: Config,
    manager: Arc<WallpaperManager>,
    setter: Box<dyn WallpaperSetter>,
    event_tx: Sender<AppEvent>,
    /// A download worker is running. Pickers are disabled and further
    /// refresh requests are no-ops until it reports back.
    pub busy: bool,
    pub status: Status,
    pub should_quit: bool,
    pub show_help: bool,
    /// When the self-renewing schedule fires next. Armed only while no
    /// download is in flight; re-armed after each cycle completes.
    next_refresh_at: Option<Instant>,
    /// Wall-clock label for the status line.
    pub next_refresh_label: Option<String>,
    download_handle: Option<JoinHandle<()>>,
    /// Where the config is persisted. Tests point this at a temp dir.
    config_path: PathBuf,
    image_picker: Picker,
    pub preview: Option<Box<dyn StatefulProtocol>>,
}

impl App {
    pub fn new(event_tx: Sender<AppEvent>) -> Result<Self> {
        let config = Config::load();
        let manager = Arc::new(WallpaperManager::new(
            Box::new(HttpClient::new()?),
            Box::new(SystemDisplay),
            CacheDir::open_default()?,
            DEFAULT_MAX_FILES,
        ));

        // Halfblock fallback when the terminal font size cannot be probed
        let image_picker = Picker::from_termios()
            .map(|mut p| {
                p.guess_protocol();
                p
            })
            .unwrap_or_else(|_| Picker::new((8, 16)));

        let mut app = Self {
            config,
            manager,
            setter: Box::new(SwwwSetter),
            event_tx,
            busy: false,
            status: Status::Ready,
            should_quit: false,
            show_help: false,
            next_refresh_at: None,
            next_refresh_label: None,
            download_handle: None,
            config_path: Config::config_path(),
            image_picker,
            preview: None,
        };

        if let Some(path) = app.config.current_wallpaper.clone() {
            app.load_preview(&path);
        }
        app.arm_schedule();
        Ok(app)
    }

    /// Kick off a download cycle on the worker thread. A refresh already
    /// in flight makes this a no-op.
    pub fn trigger_refresh(&mut self) {
        if self.busy {
            return;
        }
        self.busy = true;
        self.status = Status::Downloading;
        self.next_refresh_at = None;

        let manager = Arc::clone(&self.manager);
        let config = self.config.clone();
        let tx = self.event_tx.clone();
        self.download_handle = Some(thread::spawn(move || {
            let outcome = manager.refresh(&config);
            // Receiver gone means the app is shutting down
            let _ = tx.send(AppEvent::RefreshDone(outcome));
        }));
    }

    /// Worker finished; apply the result and re-arm the schedule.
    pub fn handle_refresh_done(&mut self, outcome: RefreshOutcome) {
        self.busy = false;
        self.download_handle = None;

        match outcome {
            RefreshOutcome::Fresh(path) => self.apply_wallpaper(&path, Status::Updated),
            RefreshOutcome::Cached(path) => self.apply_wallpaper(&path, Status::UsedCache),
            RefreshOutcome::Unavailable => {
                self.status = Status::NoWallpaper;
            }
        }

        self.arm_schedule();
    }

    fn apply_wallpaper(&mut self, path: &Path, on_success: Status) {
        match self.setter.set(path) {
            Ok(()) => {
                self.config.current_wallpaper = Some(path.to_path_buf());
                if let Err(e) = self.config.save_to(&self.config_path) {
                    warn!(error = %e, "failed to persist config");
                }
                self.load_preview(path);
                self.status = on_success;
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to set wallpaper");
                self.status = Status::Error(e.to_string());
            }
        }
    }

    fn load_preview(&mut self, path: &Path) {
        match image::open(path) {
            Ok(img) => {
                self.preview = Some(self.image_picker.new_resize_protocol(img));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load preview");
                self.preview = None;
            }
        }
    }

    /// Fire the scheduled refresh when due. Called on every tick; does
    /// nothing while a download is in flight.
    pub fn tick(&mut self) {
        if self.busy {
            return;
        }
        if let Some(due) = self.next_refresh_at {
            if Instant::now() >= due {
                info!("scheduled refresh firing");
                self.trigger_refresh();
            }
        }
    }

    /// Arm the next refresh `refresh_interval_secs` from now. Interval 0
    /// means manual-only. The schedule is self-renewing: armed after each
    /// completed cycle rather than at a fixed rate, so it drifts by the
    /// duration of each refresh and cycles never overlap.
    fn arm_schedule(&mut self) {
        let secs = self.config.refresh_interval_secs;
        if secs == 0 {
            self.next_refresh_at = None;
            self.next_refresh_label = None;
            return;
        }
        self.next_refresh_at = Some(Instant::now() + Duration::from_secs(secs));
        let wall = Local::now() + chrono::Duration::seconds(secs as i64);
        self.next_refresh_label = Some(wall.format("%H:%M:%S").to_string());
        info!(interval_secs = secs, "next refresh scheduled");
    }

    /// Persist a control-surface change and restart the schedule.
    fn config_changed(&mut self) {
        if let Err(e) = self.config.save_to(&self.config_path) {
            error!(error = %e, "failed to save config");
            self.status = Status::Error("config save failed".to_string());
        }
        self.arm_schedule();
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('r') | KeyCode::Enter => self.trigger_refresh(),
            // Pickers are disabled while a download is in flight
            _ if self.busy => {}
            KeyCode::Char('s') => {
                self.config.next_source();
                self.config_changed();
            }
            KeyCode::Char('b') => {
                self.config.resolution = self.config.resolution.next();
                self.config_changed();
            }
            KeyCode::Char('i') => {
                self.config.next_interval();
                self.config_changed();
            }
            _ => {}
        }
    }

    /// Wait (bounded) for an in-flight download before releasing the
    /// terminal.
    pub fn shutdown(&mut self) {
        self.next_refresh_at = None;
        if let Some(handle) = self.download_handle.take() {
            let deadline = Instant::now() + SHUTDOWN_GRACE;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(50));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!("download still running at shutdown, detaching");
            }
        }
    }
}

pub fn run_tui() -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let mut app = App::new(event_tx.clone())?;

    // Spawn event polling thread
    let event_tx_input = event_tx.clone();
    thread::spawn(move || {
        input_worker(event_tx_input);
    });

    let res = run_app(&mut terminal, &mut app, event_rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown();
    if let Err(e) = app.config.save_to(&app.config_path) {
        warn!(error = %e, "failed to save config on exit");
    }

    res
}

/// Background thread that polls for input events.
fn input_worker(tx: Sender<AppEvent>) {
    loop {
        if event::poll(Duration::from_millis(50)).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
        } else if tx.send(AppEvent::Tick).is_err() {
            break;
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_rx: Receiver<AppEvent>,
) -> Result<()> {
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            terminal.draw(|f| ui::draw(f, app))?;
            needs_redraw = false;
        }

        let events: Vec<AppEvent> = match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let mut events = vec![event];
                while let Ok(e) = event_rx.try_recv() {
                    events.push(e);
                }
                events
            }
            Err(_) => continue,
        };

        for event in events {
            match event {
                AppEvent::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    app.handle_key(key.code);
                    needs_redraw = true;
                }
                AppEvent::RefreshDone(outcome) => {
                    app.handle_refresh_done(outcome);
                    needs_redraw = true;
                }
                AppEvent::Tick => {
                    let was_busy = app.busy;
                    app.tick();
                    if app.busy != was_busy {
                        needs_redraw = true;
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, RemoteClient};
    use crate::screen::FakeDisplay;
    use crate::setter::fake::RecordingSetter;
    use std::fs;

    /// Every request fails, so a spawned refresh resolves quickly.
    struct OfflineClient;

    impl RemoteClient for OfflineClient {
        fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Status(503))
        }
    }

    fn test_app(root: &Path) -> (App, Arc<RecordingSetter>, Receiver<AppEvent>) {
        let (event_tx, event_rx) = mpsc::channel();
        let setter = Arc::new(RecordingSetter::default());
        let manager = Arc::new(WallpaperManager::new(
            Box::new(OfflineClient),
            Box::new(FakeDisplay(1920, 1080)),
            CacheDir::open(root.join("cache")).unwrap(),
            DEFAULT_MAX_FILES,
        ));

        let app = App {
            config: Config::default(),
            manager,
            setter: Box::new(Arc::clone(&setter)),
            event_tx,
            busy: false,
            status: Status::Ready,
            should_quit: false,
            show_help: false,
            next_refresh_at: None,
            next_refresh_label: None,
            download_handle: None,
            config_path: root.join("config.json"),
            image_picker: Picker::new((8, 16)),
            preview: None,
        };
        (app, setter, event_rx)
    }

    #[test]
    fn fresh_outcome_applies_and_persists_the_wallpaper() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, setter, _rx) = test_app(dir.path());
        let wallpaper = dir.path().join("cache").join("wallpaper_0001.jpg");
        fs::write(&wallpaper, b"img").unwrap();

        app.handle_refresh_done(RefreshOutcome::Fresh(wallpaper.clone()));

        assert_eq!(setter.applied_paths(), vec![wallpaper.clone()]);
        assert_eq!(app.config.current_wallpaper, Some(wallpaper.clone()));
        assert_eq!(app.status, Status::Updated);
        // The new active wallpaper was persisted immediately
        let saved = Config::load_from(&dir.path().join("config.json"));
        assert_eq!(saved.current_wallpaper, Some(wallpaper));
    }

    #[test]
    fn unavailable_leaves_active_wallpaper_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, setter, _rx) = test_app(dir.path());
        let previous = PathBuf::from("/tmp/previous.jpg");
        app.config.current_wallpaper = Some(previous.clone());

        app.handle_refresh_done(RefreshOutcome::Unavailable);

        assert!(setter.applied_paths().is_empty());
        assert_eq!(app.config.current_wallpaper, Some(previous));
        assert_eq!(app.status, Status::NoWallpaper);
    }

    #[test]
    fn refresh_in_flight_is_not_reentered() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _setter, rx) = test_app(dir.path());

        app.trigger_refresh();
        assert!(app.busy);
        app.trigger_refresh();

        // Exactly one worker reports back (offline client, empty cache)
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            event,
            AppEvent::RefreshDone(RefreshOutcome::Unavailable)
        ));
        app.shutdown();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn pickers_are_inert_while_downloading() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _setter, _rx) = test_app(dir.path());
        app.busy = true;
        app.status = Status::Downloading;

        let source = app.config.current_source.clone();
        app.handle_key(KeyCode::Char('s'));
        app.handle_key(KeyCode::Char('i'));

        assert_eq!(app.config.current_source, source);
        assert_eq!(app.config.refresh_interval_secs, 3600);
    }
}
