//! Application event loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, KeyEvent, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};
use tracing::{info, warn};

use crate::application::session::{Gate, SessionGuard, SessionReader};
use crate::application::toasts::ToastQueue;
use crate::application::upload::UploadPipeline;
use crate::application::queries::page_cache;
use crate::domain::ports::{AuthPort, CatalogPort, NotifierPort, OAuthProvider};
use crate::domain::query::QueryState;
use crate::infrastructure::{ImageViewer, StorageManager, ViewState};
use crate::presentation::events::EventHandler;
use crate::presentation::layout::ResizeNotifier;
use crate::presentation::widgets::ToastStack;

use super::gallery_screen::{GalleryOutcome, GalleryScreen};
use super::login_screen::LoginScreen;
use super::splash_screen::SplashScreen;
use super::upload_screen::{UploadOutcome, UploadScreen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Gallery,
    Upload,
}

/// The terminal application.
pub struct App {
    session: Arc<SessionGuard>,
    session_reader: SessionReader,
    gate: Gate,
    gallery: GalleryScreen,
    upload: UploadScreen,
    login: LoginScreen,
    splash: SplashScreen,
    toasts: ToastQueue,
    storage: Option<StorageManager>,
    screen: Screen,
    should_quit: bool,
}

impl App {
    /// Wires the screens over the shared services and subscribes to the
    /// session entry, which starts the `/auth/me` fetch.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        auth: Arc<dyn AuthPort>,
        notifier: Arc<dyn NotifierPort>,
        storage: Option<StorageManager>,
        initial: QueryState,
        prestage: Vec<PathBuf>,
    ) -> Self {
        let toasts = ToastQueue::new();
        let pages = page_cache(Arc::clone(&catalog));
        let pipeline = UploadPipeline::new(
            Arc::clone(&catalog),
            pages.clone(),
            toasts.clone(),
            notifier,
        );
        let viewer = Arc::new(ImageViewer::new(Arc::clone(&catalog)));
        let tag_column = Arc::new(ResizeNotifier::new(0));

        let session = Arc::new(SessionGuard::new(Arc::clone(&auth)));
        let session_reader = session.subscribe();

        let login = LoginScreen::new(
            auth.login_url(OAuthProvider::Google),
            auth.login_url(OAuthProvider::Github),
        );
        let gallery = GalleryScreen::new(
            pages,
            catalog,
            toasts.clone(),
            viewer,
            tag_column,
            initial,
        );
        let upload = UploadScreen::new(pipeline, toasts.clone());

        for path in prestage {
            upload.enqueue(path);
        }

        Self {
            session,
            session_reader,
            gate: Gate::Loading,
            gallery,
            upload,
            login,
            splash: SplashScreen,
            toasts,
            storage,
            screen: Screen::Gallery,
            should_quit: false,
        }
    }

    /// Runs the UI loop until quit, then persists the view state.
    ///
    /// # Errors
    /// Returns an error when drawing or event polling fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        info!("UI loop started");
        let mut events = EventHandler::new();
        // Redraw at least this often so cache updates land without input.
        let mut ticker = tokio::time::interval(Duration::from_millis(100));

        while !self.should_quit {
            self.tick();
            terminal.draw(|frame| self.render(frame))?;

            let event = tokio::select! {
                event = events.next() => event.transpose()?,
                _ = ticker.tick() => None,
            };
            if let Some(event) = event {
                self.handle_event(&event);
            }
        }
        self.persist_view_state();
        Ok(())
    }

    /// Drains session and cache updates.
    fn tick(&mut self) {
        if self.session_reader.changed() {
            let status = self.session_reader.latest();
            let gate = SessionGuard::decide(&status);
            let was_allowed = matches!(self.gate, Gate::Allow(_));
            match &gate {
                Gate::Allow(user) => {
                    info!(user = %user.display_name(), "session resolved");
                    self.gallery.set_user(Some(user.clone()));
                    if !was_allowed {
                        self.gallery.activate();
                    }
                }
                _ => self.gallery.set_user(None),
            }
            self.gate = gate;
        }

        if matches!(self.gate, Gate::Allow(_)) {
            self.gallery.tick();
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        match &self.gate {
            Gate::Loading => frame.render_widget(&self.splash, area),
            Gate::Login => frame.render_widget(&self.login, area),
            Gate::Allow(_) => match self.screen {
                Screen::Gallery => self.gallery.render(frame, area),
                Screen::Upload => self.upload.render(frame, area),
            },
        }

        let toasts = self.toasts.visible();
        frame.render_widget(ToastStack::new(&toasts), area);
    }

    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            // Widths are re-published on the next draw; nothing else to do.
            Event::Resize(..) => {}
            _ => {}
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        match &self.gate {
            Gate::Loading => {
                if EventHandler::is_quit_event(key) {
                    self.should_quit = true;
                }
            }
            Gate::Login => {
                if EventHandler::is_quit_event(key) {
                    self.should_quit = true;
                } else {
                    let _ = self.login.handle_key(key);
                }
            }
            Gate::Allow(_) => match self.screen {
                Screen::Gallery => match self.gallery.handle_key(key) {
                    GalleryOutcome::Quit => self.should_quit = true,
                    GalleryOutcome::OpenUpload => self.screen = Screen::Upload,
                    GalleryOutcome::Logout => self.logout(),
                    GalleryOutcome::Handled => {}
                },
                Screen::Upload => match self.upload.handle_key(key) {
                    UploadOutcome::Quit => self.should_quit = true,
                    UploadOutcome::Back => self.screen = Screen::Gallery,
                    UploadOutcome::Handled => {}
                },
            },
        }
    }

    fn logout(&self) {
        let session = Arc::clone(&self.session);
        let toasts = self.toasts.clone();
        tokio::spawn(async move {
            if let Err(e) = session.logout().await {
                toasts.error(format!("Logout failed: {e}"));
            }
        });
    }

    fn persist_view_state(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let state = ViewState {
            last_location: Some(self.gallery.location()),
        };
        if let Err(e) = storage.save_view_state(&state) {
            warn!(error = %e, "failed to persist view state");
        }
    }
}
