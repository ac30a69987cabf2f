//! Interactive gallery browser.

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures_util::StreamExt;
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    widgets::TableState,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::services::{
    GalleryView, UploadEvent, UploadPipeline, UploadReport, UploadSettings,
};
use crate::domain::entities::{ImageId, ImagePage, UploadId};
use crate::domain::errors::{HttpError, ValidationError};
use crate::domain::ports::{ImageApiPort, PreviewPort};
use crate::presentation::events::{BrowseAction, InputMode, map_key};
use crate::presentation::theme::Theme;
use crate::presentation::widgets::{GalleryTable, StatusBar, StatusLevel, TextInput};

/// Rows from the end of the list at which the next page is requested.
const LOAD_MORE_THRESHOLD: usize = 5;

const KEY_HINTS: &str = "j/k move  / filter  s sort  o order  u upload  d delete  r reload  q quit";

/// Results of background work, fed back into the event loop.
#[derive(Debug)]
enum Action {
    PageLoaded {
        page: u32,
        result: Result<ImagePage, HttpError>,
    },
    UploadQueued(Result<UploadId, ValidationError>),
    UploadFinished(UploadReport),
    Deleted {
        id: ImageId,
        result: Result<(), HttpError>,
    },
}

fn notify(tx: &mpsc::UnboundedSender<Action>, action: Action) {
    if tx.send(action).is_err() {
        debug!("Browser closed before background work finished");
    }
}

/// Full-screen gallery browser.
pub struct BrowseApp {
    gallery: GalleryView,
    api: Arc<dyn ImageApiPort>,
    uploads: Arc<UploadPipeline>,
    upload_rx: mpsc::UnboundedReceiver<UploadEvent>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    table_state: TableState,
    prompt: TextInput,
    mode: InputMode,
    status: StatusBar,
    theme: Theme,
    running: bool,
}

impl BrowseApp {
    /// Creates the browser. Nothing is fetched until [`Self::run`].
    #[must_use]
    pub fn new(
        api: Arc<dyn ImageApiPort>,
        previewer: Arc<dyn PreviewPort>,
        settings: UploadSettings,
        page_size: u32,
        theme: Theme,
    ) -> Self {
        let (upload_tx, upload_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let uploads = Arc::new(UploadPipeline::new(
            Arc::clone(&api),
            previewer,
            upload_tx,
            settings,
        ));

        Self {
            gallery: GalleryView::new(Arc::clone(&api), page_size),
            api,
            uploads,
            upload_rx,
            action_tx,
            action_rx,
            table_state: TableState::default(),
            prompt: TextInput::new(""),
            mode: InputMode::Normal,
            status: StatusBar::info("Loading images…").hints(KEY_HINTS),
            theme,
            running: true,
        }
    }

    /// Runs until the user quits.
    ///
    /// # Errors
    /// Returns error if drawing to the terminal fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        self.request_page(1);
        self.run_event_loop(terminal).await?;
        info!("Browser exiting normally");
        Ok(())
    }

    async fn run_event_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        let mut terminal_events = EventStream::new();

        terminal.draw(|frame| self.render(frame))?;

        while self.running {
            tokio::select! {
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }

                Some(event) = self.upload_rx.recv() => {
                    self.handle_upload_event(event);
                }

                Some(Ok(event)) = terminal_events.next() => {
                    if let Event::Key(key) = event {
                        self.handle_key(key);
                    }
                }

                else => break,
            }
            terminal.draw(|frame| self.render(frame))?;
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let prompt_height = if self.mode == InputMode::Normal { 0 } else { 3 };
        let [table_area, prompt_area, status_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(prompt_height),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_stateful_widget(
            GalleryTable::new(&self.gallery, &self.theme),
            table_area,
            &mut self.table_state,
        );
        if self.mode != InputMode::Normal {
            frame.render_widget(&self.prompt, prompt_area);
        }
        frame.render_widget(&self.status, status_area);
    }

    fn request_page(&mut self, page: u32) {
        if !self.gallery.begin_load() {
            return;
        }
        debug!(page, "Requesting gallery page");

        let query = self.gallery.query_for(page);
        let api = Arc::clone(&self.api);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = api.list_images(query).await;
            notify(&tx, Action::PageLoaded { page, result });
        });
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::PageLoaded { page, result } => match self.gallery.finish_load(page, result) {
                Ok(()) => {
                    self.clamp_selection();
                    self.show_gallery_status();
                }
                Err(e) => {
                    error!(error = %e, page, "Failed to load gallery page");
                    self.set_status(StatusBar::error(format!("Failed to load images: {e}")));
                }
            },
            Action::UploadQueued(Err(e)) => {
                self.set_status(StatusBar::error(e.to_string()));
            }
            Action::UploadQueued(Ok(id)) => {
                debug!(id = %id, "Upload queued");
            }
            Action::UploadFinished(report) => {
                let level = if report.failed() > 0 {
                    StatusLevel::Error
                } else {
                    StatusLevel::Success
                };
                let mut message = format!(
                    "{} uploaded, {} failed",
                    report.completed(),
                    report.failed()
                );
                if let Some(reason) = report.outcomes.iter().find_map(|o| o.error.as_ref()) {
                    message = format!("{message}: {reason}");
                }
                self.set_status(StatusBar::new(message, level));
            }
            Action::Deleted { id, result: Ok(()) } => {
                info!(id = %id, "Image deleted");
                self.gallery.remove_local(&id);
                self.clamp_selection();
                self.set_status(StatusBar::success(format!("Deleted {id}")));
            }
            Action::Deleted { id, result: Err(e) } => {
                warn!(id = %id, error = %e, "Delete failed");
                self.set_status(StatusBar::error(format!("Delete failed: {e}")));
            }
        }
    }

    fn handle_upload_event(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Progress { percent, .. } => {
                self.set_status(StatusBar::info(format!("Uploading… {percent}%")));
            }
            UploadEvent::StatusChanged { id, status } => {
                debug!(id = %id, status = %status, "Upload status changed");
            }
            UploadEvent::ImageUploaded(record) => {
                info!(id = %record.id, "Showing uploaded image");
                self.gallery.on_image_uploaded(record);
                self.table_state.select(Some(0));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let Some(action) = map_key(&key, self.mode) else {
            return;
        };

        match action {
            BrowseAction::Quit => self.running = false,
            BrowseAction::Down => self.move_selection(1),
            BrowseAction::Up => self.move_selection(-1),
            BrowseAction::Top => self.select_index(0),
            BrowseAction::Bottom => {
                self.select_index(self.gallery.visible_len().saturating_sub(1));
            }
            BrowseAction::CycleSort => {
                self.gallery
                    .sort_images(self.gallery.sort().next(), self.gallery.order());
            }
            BrowseAction::ToggleOrder => {
                self.gallery
                    .sort_images(self.gallery.sort(), self.gallery.order().toggled());
            }
            BrowseAction::Reload => self.request_page(1),
            BrowseAction::Delete => self.delete_selected(),
            BrowseAction::StartFilter => {
                self.open_prompt(InputMode::Filter, " Filter ", "title, tags or description");
                let current = self.gallery.filter().to_string();
                self.prompt.set_value(current);
            }
            BrowseAction::StartUpload => {
                self.open_prompt(InputMode::UploadPath, " Upload file ", "path to an image");
            }
            BrowseAction::PromptInput(c) => {
                self.prompt.input_char(c);
                self.on_prompt_edited();
            }
            BrowseAction::PromptBackspace => {
                self.prompt.backspace();
                self.on_prompt_edited();
            }
            BrowseAction::PromptLeft => self.prompt.move_left(),
            BrowseAction::PromptRight => self.prompt.move_right(),
            BrowseAction::PromptAccept => self.accept_prompt(),
            BrowseAction::PromptCancel => {
                if self.mode == InputMode::Filter {
                    self.gallery.filter_images("");
                    self.clamp_selection();
                }
                self.close_prompt();
            }
        }
    }

    fn open_prompt(&mut self, mode: InputMode, label: &str, placeholder: &str) {
        self.mode = mode;
        self.prompt = TextInput::new(label).placeholder(placeholder);
        self.prompt.set_focused(true);
    }

    fn close_prompt(&mut self) {
        self.mode = InputMode::Normal;
        self.prompt.set_focused(false);
    }

    fn on_prompt_edited(&mut self) {
        if self.mode == InputMode::Filter {
            self.gallery.filter_images(self.prompt.value());
            self.clamp_selection();
        }
    }

    fn accept_prompt(&mut self) {
        if self.mode == InputMode::UploadPath {
            let path = PathBuf::from(self.prompt.value().trim());
            if !path.as_os_str().is_empty() {
                self.spawn_upload(path);
            }
        }
        self.close_prompt();
    }

    fn spawn_upload(&mut self, path: PathBuf) {
        info!(path = %path.display(), "Queueing upload");
        self.set_status(StatusBar::info(format!("Preparing {}…", path.display())));

        let uploads = Arc::clone(&self.uploads);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let queued = match UploadPipeline::read_file(&path).await {
                Ok(file) => uploads.add_file(file).await,
                Err(e) => Err(e),
            };
            let accepted = queued.is_ok();
            notify(&tx, Action::UploadQueued(queued));
            if accepted {
                let report = uploads.start_upload().await;
                if !report.is_empty() {
                    notify(&tx, Action::UploadFinished(report));
                }
            }
        });
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        debug!(id = %id, "Deleting image");
        self.set_status(StatusBar::info(format!("Deleting {id}…")));

        let api = Arc::clone(&self.api);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = api.delete_image(&id).await;
            notify(&tx, Action::Deleted { id, result });
        });
    }

    fn selected_id(&self) -> Option<ImageId> {
        let position = self.table_state.selected()?;
        self.gallery.visible_at(position).map(|r| r.id.clone())
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.gallery.visible_len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.select_index(next);
    }

    fn select_index(&mut self, position: usize) {
        if self.gallery.visible_len() == 0 {
            self.table_state.select(None);
            return;
        }
        self.table_state.select(Some(position));
        if self.gallery.should_load_more(position, LOAD_MORE_THRESHOLD) {
            self.request_page(self.gallery.page() + 1);
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.gallery.visible_len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn show_gallery_status(&mut self) {
        let status = if self.gallery.source().is_degraded() {
            StatusBar::warning("Backend unreachable, showing sample images")
        } else {
            StatusBar::info(format!(
                "{} of {} images",
                self.gallery.images().len(),
                self.gallery.total()
            ))
        };
        self.set_status(status);
    }

    fn set_status(&mut self, status: StatusBar) {
        self.status = status.hints(KEY_HINTS);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::domain::entities::{DataSource, ImageRecord};
    use crate::domain::ports::mocks::{MockImageApiPort, MockPreviewPort};

    fn record(id: &str, title: &str) -> ImageRecord {
        ImageRecord {
            id: ImageId::new(id),
            url: format!("https://img.example.com/{id}.jpg"),
            thumbnail: None,
            title: title.to_string(),
            description: String::new(),
            tags: Vec::new(),
            upload_date: None,
            size: 100,
            filename: format!("{id}.jpg"),
            likes: None,
            views: None,
        }
    }

    fn page(records: Vec<ImageRecord>, source: DataSource) -> ImagePage {
        ImagePage {
            total: records.len() as u64,
            images: records,
            page: 1,
            total_pages: 1,
            has_more: false,
            source,
        }
    }

    fn app(api: MockImageApiPort) -> BrowseApp {
        BrowseApp::new(
            Arc::new(api),
            Arc::new(MockPreviewPort::new()),
            UploadSettings::default(),
            20,
            Theme::default(),
        )
    }

    fn loaded(app: &mut BrowseApp, source: DataSource) {
        assert!(app.gallery.begin_load());
        app.handle_action(Action::PageLoaded {
            page: 1,
            result: Ok(page(
                vec![record("1", "Harbor"), record("2", "Snowfield"), record("3", "Dunes")],
                source,
            )),
        });
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_first_page_selects_first_row() {
        let mut app = app(MockImageApiPort::new());
        loaded(&mut app, DataSource::Live);

        assert_eq!(app.table_state.selected(), Some(0));
        assert_eq!(app.status.status_level(), StatusLevel::Info);
    }

    #[tokio::test]
    async fn test_fallback_page_warns() {
        let mut app = app(MockImageApiPort::new());
        loaded(&mut app, DataSource::Fallback);

        assert_eq!(app.status.status_level(), StatusLevel::Warning);
    }

    #[tokio::test]
    async fn test_selection_stops_at_last_row() {
        let mut app = app(MockImageApiPort::new());
        loaded(&mut app, DataSource::Live);

        for _ in 0..5 {
            app.handle_key(press(KeyCode::Char('j')));
        }

        assert_eq!(app.table_state.selected(), Some(2));
    }

    #[tokio::test]
    async fn test_filter_prompt_narrows_rows() {
        let mut app = app(MockImageApiPort::new());
        loaded(&mut app, DataSource::Live);

        app.handle_key(press(KeyCode::Char('/')));
        for c in "snow".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        assert_eq!(app.gallery.visible_len(), 1);

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.gallery.visible_len(), 3);
    }

    async fn next_action(app: &mut BrowseApp) {
        let action = app.action_rx.recv().await.unwrap();
        app.handle_action(action);
    }

    #[tokio::test]
    async fn test_delete_runs_in_background() {
        let mut api = MockImageApiPort::new();
        api.expect_delete_image()
            .withf(|id| id.as_str() == "1")
            .times(1)
            .returning(|_| Ok(()));
        let mut app = app(api);
        loaded(&mut app, DataSource::Live);

        app.handle_key(press(KeyCode::Char('d')));
        assert_eq!(app.gallery.visible_len(), 3);
        assert!(app.status.message().starts_with("Deleting"));

        app.handle_key(press(KeyCode::Char('q')));
        assert!(!app.running);

        next_action(&mut app).await;
        assert_eq!(app.gallery.visible_len(), 2);
        assert_eq!(app.gallery.total(), 2);
        assert_eq!(app.status.status_level(), StatusLevel::Success);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_row() {
        let mut api = MockImageApiPort::new();
        api.expect_delete_image()
            .returning(|_| Err(HttpError::status(404, "Not Found")));
        let mut app = app(api);
        loaded(&mut app, DataSource::Live);

        app.handle_key(press(KeyCode::Char('d')));
        next_action(&mut app).await;

        assert_eq!(app.gallery.visible_len(), 3);
        assert_eq!(app.status.status_level(), StatusLevel::Error);
    }

    #[tokio::test]
    async fn test_uploaded_image_is_prepended() {
        let mut app = app(MockImageApiPort::new());
        loaded(&mut app, DataSource::Live);

        app.handle_upload_event(UploadEvent::ImageUploaded(record("9", "Fresh")));

        assert_eq!(app.gallery.visible_at(0).map(|r| r.title.as_str()), Some("Fresh"));
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_quit_key_stops_loop() {
        let mut app = app(MockImageApiPort::new());
        app.handle_key(press(KeyCode::Char('q')));
        assert!(!app.running);
    }
}
