//! Gallery, search, and similar-results screen.
//!
//! One screen serves all three browse modes; the current [`QueryState`]
//! decides which. Every navigation re-derives the cache key and re-binds
//! the reader, so the cache does all coalescing and refresh work.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::debug;

use crate::application::cache::{CacheReader, CacheStatus};
use crate::application::queries::{PageCache, PageControls};
use crate::application::toasts::ToastQueue;
use crate::domain::entities::{ImageId, ImageMeta, ImagePage, ImagePatch, UserProfile};
use crate::domain::ports::CatalogPort;
use crate::domain::query::{Browse, QueryKey, QueryState};
use crate::infrastructure::ImageViewer;
use crate::presentation::layout::ResizeNotifier;
use crate::presentation::widgets::{InputAction, StatusBar, StatusLevel, TagRow, TextInput};

/// Placeholder glyph standing in for a thumbnail.
const THUMB_GLYPH: &str = "▢";

/// Fixed columns around the tag column, in cells.
const NAME_WIDTH: u16 = 28;
const SIMILARITY_WIDTH: u16 = 8;
const DATE_WIDTH: u16 = 12;
const ROW_PREFIX_WIDTH: u16 = 4;

/// What the app should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryOutcome {
    /// Nothing further.
    Handled,
    /// Switch to the upload screen.
    OpenUpload,
    /// Sign out.
    Logout,
    /// Quit the application.
    Quit,
}

enum Prompt {
    Search(TextInput),
    Edit {
        target: ImageId,
        name: TextInput,
        tags: TextInput,
        tags_focused: bool,
    },
    ConfirmDelete(ImageId),
}

/// Normalizes a comma-separated tag list: trimmed, lowercased, deduplicated.
fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',') {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// The browsing screen.
pub struct GalleryScreen {
    pages: PageCache,
    catalog: Arc<dyn CatalogPort>,
    toasts: ToastQueue,
    viewer: Arc<ImageViewer>,
    tag_column: Arc<ResizeNotifier>,
    query: QueryState,
    reader: Option<CacheReader<QueryKey, ImagePage>>,
    status: Option<CacheStatus<ImagePage>>,
    selected: usize,
    tag_rows: Vec<TagRow>,
    prompt: Option<Prompt>,
    user: Option<UserProfile>,
}

impl GalleryScreen {
    /// Creates the screen and binds the initial query.
    #[must_use]
    pub fn new(
        pages: PageCache,
        catalog: Arc<dyn CatalogPort>,
        toasts: ToastQueue,
        viewer: Arc<ImageViewer>,
        tag_column: Arc<ResizeNotifier>,
        initial: QueryState,
    ) -> Self {
        Self {
            pages,
            catalog,
            toasts,
            viewer,
            tag_column,
            query: initial,
            reader: None,
            status: None,
            selected: 0,
            tag_rows: Vec::new(),
            prompt: None,
            user: None,
        }
    }

    /// Binds the stored query. Deferred until the session guard allows the
    /// screen, so no request goes out pre-auth.
    pub fn activate(&mut self) {
        self.set_query(self.query.clone());
    }

    /// Sets the signed-in user; gates the edit and delete actions.
    pub fn set_user(&mut self, user: Option<UserProfile>) {
        self.user = user;
    }

    /// Current location string, for persistence.
    #[must_use]
    pub fn location(&self) -> String {
        self.query.to_location()
    }

    /// Current query state.
    #[must_use]
    pub const fn query(&self) -> &QueryState {
        &self.query
    }

    /// Whether a reader is bound (a blank search binds none).
    #[must_use]
    pub const fn has_reader(&self) -> bool {
        self.reader.is_some()
    }

    /// Navigates to a new query state.
    pub fn set_query(&mut self, query: QueryState) {
        debug!(location = %query.to_location(), "navigating");
        self.query = query;
        self.selected = 0;
        self.bind();
    }

    fn bind(&mut self) {
        match self.query.key() {
            Some(key) => {
                let reader = self.pages.read(&key);
                self.status = Some(reader.snapshot());
                self.reader = Some(reader);
            }
            None => {
                // Blank search: no key, no request.
                self.reader = None;
                self.status = None;
            }
        }
        self.rebuild_tag_rows();
    }

    /// Drains pending cache and resize updates.
    pub fn tick(&mut self) {
        let mut fresh = false;
        if let Some(reader) = &mut self.reader
            && reader.changed()
        {
            self.status = Some(reader.latest());
            fresh = true;
        }
        if fresh {
            self.rebuild_tag_rows();
            let len = self.page().map_or(0, |page| page.items.len());
            if len > 0 {
                self.selected = self.selected.min(len - 1);
            } else {
                self.selected = 0;
            }
        } else {
            for row in &mut self.tag_rows {
                row.refresh();
            }
        }
    }

    fn page(&self) -> Option<&ImagePage> {
        self.status.as_ref().and_then(CacheStatus::value)
    }

    fn controls(&self) -> PageControls {
        self.page().map_or_else(
            || PageControls::empty(self.query.page),
            |page| PageControls::from_page(self.query.page, page.items.len(), self.query.page_size),
        )
    }

    fn selected_image(&self) -> Option<&ImageMeta> {
        self.page().and_then(|page| page.items.get(self.selected)).map(|hit| &hit.meta)
    }

    fn rebuild_tag_rows(&mut self) {
        self.tag_rows = self.page().map_or_else(Vec::new, |page| {
            page.items
                .iter()
                .map(|hit| TagRow::new(hit.meta.tags.clone(), self.tag_column.subscribe()))
                .collect()
        });
    }

    /// Handles a key press.
    pub fn handle_key(&mut self, key: &KeyEvent) -> GalleryOutcome {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return GalleryOutcome::Handled;
        }

        match key.code {
            KeyCode::Char('q') => return GalleryOutcome::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return GalleryOutcome::Quit;
            }
            KeyCode::Char('u') => return GalleryOutcome::OpenUpload,
            KeyCode::Char('x') => return GalleryOutcome::Logout,

            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.selected = self.selected.saturating_sub(1),

            KeyCode::Char('n') | KeyCode::Right => {
                if self.controls().next_enabled() {
                    self.set_query(self.query.clone().next_page());
                }
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if self.controls().prev_enabled() {
                    self.set_query(self.query.clone().prev_page());
                }
            }
            KeyCode::Char('z') => {
                let size = self.query.page_size.cycle();
                self.set_query(self.query.clone().with_page_size(size));
            }

            KeyCode::Char('/') => {
                let mut input = TextInput::new(" Search ")
                    .placeholder("e.g. sunset over mountains, a red car...");
                if let Browse::Search { query } = &self.query.browse {
                    input.set_value(query);
                }
                self.prompt = Some(Prompt::Search(input));
            }
            KeyCode::Char('v') => {
                if let Some(image) = self.selected_image() {
                    let state =
                        QueryState::similar(image.id.clone()).with_page_size(self.query.page_size);
                    self.set_query(state);
                }
            }
            KeyCode::Char('b') | KeyCode::Esc => {
                if !matches!(self.query.browse, Browse::List) {
                    let size = self.query.page_size;
                    self.set_query(QueryState::list().with_page_size(size));
                }
            }

            KeyCode::Char('e') => self.open_edit_prompt(),
            KeyCode::Char('d') => {
                if let Some(image) = self.selected_image()
                    && self.can_modify(image)
                {
                    self.prompt = Some(Prompt::ConfirmDelete(image.id.clone()));
                }
            }
            KeyCode::Char('o') => self.open_selected(false),
            KeyCode::Char('t') => self.open_selected(true),
            KeyCode::Char('r') => {
                if let Some(reader) = &self.reader {
                    self.pages.invalidate(reader.key());
                }
            }
            _ => {}
        }
        GalleryOutcome::Handled
    }

    fn select_next(&mut self) {
        let len = self.page().map_or(0, |page| page.items.len());
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    fn can_modify(&self, image: &ImageMeta) -> bool {
        self.user.as_ref().is_some_and(|user| user.can_modify(image))
    }

    fn open_edit_prompt(&mut self) {
        let Some(image) = self.selected_image() else {
            return;
        };
        if !self.can_modify(image) {
            self.toasts.error("You cannot edit this image");
            return;
        }
        let mut name = TextInput::new(" Name ");
        name.set_value(&image.name);
        let mut tags = TextInput::new(" Tags (comma separated) ");
        tags.set_value(&image.tags.join(", "));
        self.prompt = Some(Prompt::Edit {
            target: image.id.clone(),
            name,
            tags,
            tags_focused: false,
        });
    }

    fn handle_prompt_key(&mut self, key: &KeyEvent) {
        let Some(prompt) = &mut self.prompt else {
            return;
        };

        match prompt {
            Prompt::Search(input) => match input.handle_key(key) {
                InputAction::Submitted => {
                    if !input.is_blank() {
                        let state = QueryState::search(input.value())
                            .with_page_size(self.query.page_size);
                        self.prompt = None;
                        self.set_query(state);
                    }
                }
                InputAction::Cancelled => self.prompt = None,
                _ => {}
            },
            Prompt::Edit { target, name, tags, tags_focused } => {
                if key.code == KeyCode::Tab {
                    *tags_focused = !*tags_focused;
                    return;
                }
                let action = if *tags_focused {
                    tags.handle_key(key)
                } else {
                    name.handle_key(key)
                };
                match action {
                    InputAction::Submitted => {
                        let target = target.clone();
                        let new_name = name.value().trim().to_owned();
                        let new_tags = parse_tags(&tags.value());
                        self.prompt = None;
                        self.save_edit(target, new_name, new_tags);
                    }
                    InputAction::Cancelled => self.prompt = None,
                    _ => {}
                }
            }
            Prompt::ConfirmDelete(target) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    let target = target.clone();
                    self.prompt = None;
                    self.delete_image(target);
                }
                KeyCode::Char('n') | KeyCode::Esc => self.prompt = None,
                _ => {}
            },
        }
    }

    /// Persists an edit, then invalidates the page being viewed.
    pub fn save_edit(&self, target: ImageId, name: String, tags: Vec<String>) {
        let patch = ImagePatch { name: Some(name), tags: Some(tags) };
        let catalog = Arc::clone(&self.catalog);
        let pages = self.pages.clone();
        let toasts = self.toasts.clone();
        let key = self.query.key();

        tokio::spawn(async move {
            match catalog.update(&target, patch).await {
                Ok(_) => {
                    if let Some(key) = key {
                        pages.invalidate(&key);
                    }
                    toasts.success("Image updated");
                }
                Err(e) => {
                    toasts.error(format!("Update failed: {e}"));
                }
            }
        });
    }

    /// Deletes an image, then invalidates the page being viewed.
    pub fn delete_image(&self, target: ImageId) {
        let catalog = Arc::clone(&self.catalog);
        let pages = self.pages.clone();
        let toasts = self.toasts.clone();
        let key = self.query.key();

        tokio::spawn(async move {
            match catalog.delete(&target).await {
                Ok(_) => {
                    if let Some(key) = key {
                        pages.invalidate(&key);
                    }
                    toasts.success("Image deleted");
                }
                Err(e) => {
                    toasts.error(format!("Delete failed: {e}"));
                }
            }
        });
    }

    fn open_selected(&self, thumbnail: bool) {
        let Some(image) = self.selected_image().cloned() else {
            return;
        };
        let viewer = Arc::clone(&self.viewer);
        let toasts = self.toasts.clone();
        tokio::spawn(async move {
            let result = if thumbnail {
                viewer.open_thumbnail(&image).await
            } else {
                viewer.open(&image).await
            };
            if let Err(e) = result {
                toasts.error(format!("Could not open image: {e}"));
            }
        });
    }

    /// Renders the screen.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ]);
        let [header_area, list_area, paging_area, status_area] = layout.areas(area);

        self.render_header(frame, header_area);
        self.render_list(frame, list_area);
        self.render_paging(frame, paging_area);
        self.render_status(frame, status_area);

        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, area, prompt);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.query.browse {
            Browse::List => "GALLERY".to_owned(),
            Browse::Search { query } => format!("SEARCH: {query}"),
            Browse::Similar { image_id } => format!("SIMILAR TO: {image_id}"),
        };
        let count = self.page().map_or_else(String::new, |page| format!("{} images", page.count));

        let mut spans = vec![Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        if !count.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(count, Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            format!("  {}/page", self.query.page_size),
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        match &self.status {
            None => {
                let hint = Paragraph::new("Press '/' and enter a query to search")
                    .centered()
                    .style(Style::default().fg(Color::DarkGray));
                frame.render_widget(hint, area);
            }
            Some(CacheStatus::Pending) => {
                let skeleton = Paragraph::new("Loading...")
                    .centered()
                    .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM));
                frame.render_widget(skeleton, area);
            }
            Some(CacheStatus::Error(e)) => {
                let message = Paragraph::new(format!("Failed to load images: {e}"))
                    .centered()
                    .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
                frame.render_widget(message, area);
            }
            Some(CacheStatus::Resolved(page)) => {
                if page.items.is_empty() {
                    let empty = Paragraph::new("No images here. Upload some with 'u'!")
                        .centered()
                        .style(Style::default().fg(Color::Yellow));
                    frame.render_widget(empty, area);
                    return;
                }
                self.render_rows(frame, area, page);
            }
        }
    }

    fn render_rows(&self, frame: &mut Frame, area: Rect, page: &ImagePage) {
        let tag_width = area
            .width
            .saturating_sub(ROW_PREFIX_WIDTH + NAME_WIDTH + SIMILARITY_WIDTH + DATE_WIDTH);
        self.tag_column.publish(tag_width);

        for (i, hit) in page.items.iter().take(usize::from(area.height)).enumerate() {
            let row_area = Rect::new(area.x, area.y + u16::try_from(i).unwrap_or(0), area.width, 1);
            let columns = Layout::horizontal([
                Constraint::Length(ROW_PREFIX_WIDTH),
                Constraint::Length(NAME_WIDTH),
                Constraint::Fill(1),
                Constraint::Length(SIMILARITY_WIDTH),
                Constraint::Length(DATE_WIDTH),
            ]);
            let [prefix_area, name_area, tags_area, similarity_area, date_area] =
                columns.areas(row_area);

            let selected = i == self.selected;
            let marker = if selected { "▶" } else { " " };
            let name_style = if selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };

            frame.render_widget(Paragraph::new(format!("{marker} {THUMB_GLYPH}")), prefix_area);
            frame.render_widget(
                Paragraph::new(hit.meta.name.as_str()).style(name_style),
                name_area,
            );
            if let Some(row) = self.tag_rows.get(i) {
                frame.render_widget(row, tags_area);
            }
            if let Some(similarity) = hit.similarity {
                frame.render_widget(
                    Paragraph::new(format!("{:.1}%", similarity * 100.0))
                        .style(Style::default().fg(Color::Green)),
                    similarity_area,
                );
            }
            frame.render_widget(
                Paragraph::new(hit.meta.created_at.format("%Y-%m-%d").to_string())
                    .style(Style::default().fg(Color::DarkGray)),
                date_area,
            );
        }
    }

    fn render_paging(&self, frame: &mut Frame, area: Rect) {
        let controls = self.controls();
        let style_for = |enabled: bool| {
            if enabled {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
            }
        };

        let line = Line::from(vec![
            Span::styled("← prev", style_for(controls.prev_enabled())),
            Span::styled(
                format!("  Page {}  ", controls.page),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled("next →", style_for(controls.next_enabled())),
        ]);
        frame.render_widget(Paragraph::new(line).centered(), area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let who = self
            .user
            .as_ref()
            .map_or_else(String::new, |user| user.display_name().to_owned());
        let bar = StatusBar::new()
            .message(who)
            .hints("/ search  v similar  e edit  d delete  o/t view  u upload  x logout  q quit")
            .level(StatusLevel::Info);
        frame.render_widget(&bar, area);
    }

    fn render_prompt(&self, frame: &mut Frame, area: Rect, prompt: &Prompt) {
        let width = 60.min(area.width.saturating_sub(4));
        let height = match prompt {
            Prompt::Search(_) | Prompt::ConfirmDelete(_) => 4,
            Prompt::Edit { .. } => 7,
        };
        let popup = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, popup);

        match prompt {
            Prompt::Search(input) => {
                frame.render_widget(input, popup);
            }
            Prompt::Edit { name, tags, tags_focused, .. } => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Edit image ");
                let inner = block.inner(popup);
                frame.render_widget(block, popup);

                let fields = Layout::vertical([Constraint::Length(3), Constraint::Length(3)]);
                let [name_area, tags_area] = fields.areas(inner);
                frame.render_widget(name, name_area);
                frame.render_widget(tags, tags_area);

                let focused_area = if *tags_focused { tags_area } else { name_area };
                frame.render_widget(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                    focused_area,
                );
            }
            Prompt::ConfirmDelete(_) => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .title(" Delete image ");
                let inner = block.inner(popup);
                frame.render_widget(block, popup);
                frame.render_widget(
                    Paragraph::new("This cannot be undone. Delete? (y/n)")
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                    inner,
                );
            }
        }
    }
}
