use iced::alignment::Vertical;
use iced::event::{self, Event};
use iced::widget::scrollable::Scrollbar;
use iced::widget::{button, column, container, horizontal_space, row, scrollable, stack, text};
use iced::{time, window, Alignment, Element, Length, Subscription, Task, Theme};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

mod error;
mod logging;
mod settings;
mod source;
mod state;
mod ui;

use settings::Settings;
use source::{OverlayFetcher, OverlayLayer, OverlayRefresh, RefreshOutcome};
use state::query::LaunchQuery;
use state::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use state::{ImageRef, OverlayController, OverlayState};
use ui::controls::{self, PresetChoice};
use ui::dropzone::{DropZone, DroppedItem};
use ui::stage;
use ui::toast::{Level, Toasts};

/// Main application state
struct DesignOverlay {
    /// Owner of the overlay state
    controller: OverlayController,
    /// Drag-and-drop indicator for the stage
    drop_zone: DropZone,
    /// Fetches or renders the overlay layer
    fetcher: Option<OverlayFetcher>,
    /// Overlay layer and its fetch lifecycle
    refresh: OverlayRefresh,
    /// Raw text of the width field
    width_input: String,
    /// Raw text of the height field
    height_input: String,
    /// Whether the controls panel is shown
    controls_open: bool,
    /// Transient notices
    toasts: Toasts,
    settings: Settings,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the empty stage
    PickImage,
    /// The file chooser closed
    DesignPicked(Option<PathBuf>),
    /// Background decode of the design finished
    DesignLoaded(Result<ImageRef, String>),
    /// Files are hovering over the window
    DragOver,
    /// Hovering files left the window
    DragLeave,
    /// A file was dropped on the window
    Dropped(PathBuf),
    WidthChanged(String),
    HeightChanged(String),
    OpacityChanged(u8),
    UrlInputChanged(String),
    SubmitUrl,
    ClearUrl,
    AddPreset,
    PresetSelected(PresetChoice),
    RemovePreset(usize),
    ToggleControls,
    /// Time to re-fetch the overlay layer
    RefreshOverlay,
    /// An overlay fetch for the given URL finished
    OverlayFetched(String, Result<OverlayLayer, String>),
    /// Periodic tick used to expire notices
    Tick(Instant),
}

impl DesignOverlay {
    /// Create a new instance of the application
    fn new(settings: Settings, query: LaunchQuery) -> (Self, Task<Message>) {
        let store: Box<dyn KeyValueStore + Send> = match JsonFileStore::new() {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!(error = %e, "presets will not be saved this session");
                Box::new(MemoryStore::default())
            }
        };

        let initial = OverlayState::new(
            settings.initial_width,
            settings.initial_height,
            settings.initial_opacity,
        );
        let mut controller = OverlayController::new(initial, store);
        controller.subscribe(|state| {
            debug!(
                width = state.width,
                height = state.height,
                opacity = state.opacity,
                url = ?state.overlay_url,
                presets = state.presets.len(),
                "state changed"
            );
        });
        controller.seed(&query);

        let fetcher = match OverlayFetcher::new() {
            Ok(fetcher) => Some(fetcher),
            Err(e) => {
                warn!(error = %e, "overlay layer disabled");
                None
            }
        };

        let mut app = DesignOverlay {
            controller,
            drop_zone: DropZone::default(),
            fetcher,
            refresh: OverlayRefresh::default(),
            width_input: String::new(),
            height_input: String::new(),
            controls_open: false,
            toasts: Toasts::new(settings.notice_duration()),
            settings,
        };
        app.sync_dimension_inputs();

        let task = app.refresh_overlay();
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let url_before = self.controller.state().overlay_url.clone();
        let showed_before = self.controller.state().shows_overlay();

        let mut task = self.handle(message);

        for warning in self.controller.take_warnings() {
            self.toasts.push(Level::Warning, warning, Instant::now());
        }

        // A new URL starts from a blank layer and fetches right away
        let state = self.controller.state();
        let url_changed = state.overlay_url != url_before;
        let newly_shown = state.shows_overlay() && !showed_before;
        if url_changed {
            self.refresh.reset();
        }
        if url_changed || newly_shown {
            task = Task::batch([task, self.refresh_overlay()]);
        }

        task
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                if !self.controller.begin_pick() {
                    return Task::none();
                }
                Task::perform(source::pick_design_file(), Message::DesignPicked)
            }
            Message::DesignPicked(path) => {
                self.controller.end_pick();
                match path {
                    Some(path) => load_design(path),
                    None => {
                        debug!("file chooser cancelled");
                        Task::none()
                    }
                }
            }
            Message::DesignLoaded(Ok(image)) => {
                self.controller.set_image(image);
                Task::none()
            }
            Message::DesignLoaded(Err(e)) => {
                warn!(error = %e, "could not load design image");
                self.notify(Level::Warning, format!("Could not open image: {}", e));
                Task::none()
            }
            Message::DragOver => {
                self.drop_zone.drag_over();
                Task::none()
            }
            Message::DragLeave => {
                self.drop_zone.drag_leave();
                Task::none()
            }
            Message::Dropped(path) => {
                let mut dropped = None;
                self.drop_zone
                    .drop(&[DroppedItem::file(path)], |file| dropped = Some(file));
                dropped.map(load_design).unwrap_or_else(Task::none)
            }
            Message::WidthChanged(input) => {
                self.controller.set_width(&input);
                self.width_input = input;
                Task::none()
            }
            Message::HeightChanged(input) => {
                self.controller.set_height(&input);
                self.height_input = input;
                Task::none()
            }
            Message::OpacityChanged(percent) => {
                self.controller.set_opacity(i32::from(percent));
                Task::none()
            }
            Message::UrlInputChanged(input) => {
                self.controller.set_url_input(input);
                Task::none()
            }
            Message::SubmitUrl => {
                self.controller.submit_overlay_url();
                Task::none()
            }
            Message::ClearUrl => {
                self.controller.clear_overlay_url();
                Task::none()
            }
            Message::AddPreset => {
                if let Ok(preset) = self.controller.add_preset() {
                    self.notify(Level::Info, format!("Saved preset {}", preset));
                }
                Task::none()
            }
            Message::PresetSelected(choice) => {
                if self.controller.select_preset(choice.index()) {
                    self.sync_dimension_inputs();
                }
                Task::none()
            }
            Message::RemovePreset(index) => {
                self.controller.remove_preset(index);
                Task::none()
            }
            Message::ToggleControls => {
                self.controls_open = !self.controls_open;
                Task::none()
            }
            Message::RefreshOverlay => self.refresh_overlay(),
            Message::OverlayFetched(url, result) => {
                let current = self.controller.state().overlay_url.as_deref();
                match self.refresh.finish(&url, current, result) {
                    RefreshOutcome::Stale => self.refresh_overlay(),
                    RefreshOutcome::Failed(e) => {
                        warn!(%url, error = %e, "overlay fetch failed");
                        self.notify(Level::Warning, e);
                        Task::none()
                    }
                    RefreshOutcome::Updated | RefreshOutcome::StillFailing => Task::none(),
                }
            }
            Message::Tick(now) => {
                self.toasts.prune(now);
                Task::none()
            }
        }
    }

    /// Start an overlay fetch unless one is running or nothing is drawn
    fn refresh_overlay(&mut self) -> Task<Message> {
        let Some(fetcher) = self.fetcher.clone() else {
            return Task::none();
        };
        let state = self.controller.state();
        let current = state.overlay_url.as_deref().filter(|_| state.shows_overlay());
        let Some(url) = self.refresh.begin(current) else {
            return Task::none();
        };

        let viewport = (state.width, state.height);
        Task::perform(
            async move {
                let result = fetcher
                    .fetch(url.clone(), viewport)
                    .await
                    .map_err(|e| e.to_string());
                (url, result)
            },
            |(url, result)| Message::OverlayFetched(url, result),
        )
    }

    fn notify(&mut self, level: Level, message: String) {
        self.toasts.push(level, message, Instant::now());
    }

    /// Show the controller's dimensions in the text fields
    fn sync_dimension_inputs(&mut self) {
        let state = self.controller.state();
        self.width_input = state.width.to_string();
        self.height_input = state.height.to_string();
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let state = self.controller.state();

        let status = if self.controller.is_picking() {
            "Waiting for the file chooser..."
        } else if state.image.is_none() {
            "Click or drop an image onto the stage"
        } else {
            ""
        };

        let header = row![
            text("Design Overlay").size(24),
            text(status).size(14),
            horizontal_space(),
            button(if self.controls_open { "Hide controls" } else { "Controls" })
                .on_press(Message::ToggleControls)
                .padding(10),
        ]
        .spacing(20)
        .padding([12, 20])
        .align_y(Alignment::Center);

        let stage_area = scrollable(
            column![
                stage::stage(
                    state,
                    self.refresh.layer(state.overlay_url.as_deref()),
                    self.drop_zone.is_active(),
                ),
                controls::url_bar(state.overlay_url.as_deref(), self.controller.url_input()),
            ]
            .padding(20)
            .align_x(Alignment::Center),
        )
        .direction(scrollable::Direction::Both {
            vertical: Scrollbar::new(),
            horizontal: Scrollbar::new(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        let body = row![stage_area].push_maybe(
            self.controls_open
                .then(|| controls::panel(state, &self.width_input, &self.height_input)),
        );

        let notices = container(self.toasts.view())
            .padding(20)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_y(Vertical::Bottom);

        stack![column![header, body], notices].into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen_with(window_event)];

        if self.controller.state().shows_overlay() {
            subscriptions.push(
                time::every(self.settings.refresh_interval()).map(|_| Message::RefreshOverlay),
            );
        }
        if !self.toasts.is_empty() {
            subscriptions.push(time::every(Duration::from_millis(250)).map(Message::Tick));
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Decode a design image on a worker and report back
fn load_design(path: PathBuf) -> Task<Message> {
    Task::perform(
        async move { source::load_design(path).await.map_err(|e| e.to_string()) },
        Message::DesignLoaded,
    )
}

/// Map native drag-and-drop window events to messages
fn window_event(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Window(window::Event::FileHovered(_)) => Some(Message::DragOver),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::DragLeave),
        Event::Window(window::Event::FileDropped(path)) => Some(Message::Dropped(path)),
        _ => None,
    }
}

fn main() -> iced::Result {
    let loaded = Settings::load();
    logging::init(loaded.as_ref().map(|s| s.debug_logging).unwrap_or(false));

    let settings = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "using default settings");
        Settings::default()
    });

    // The first argument is a query string: ?w=800&h=600&o=50&url=...
    let query = std::env::args()
        .nth(1)
        .map(|arg| LaunchQuery::parse(&arg))
        .unwrap_or_default();
    info!(?query, "starting design overlay");

    iced::application("Design Overlay", DesignOverlay::update, DesignOverlay::view)
        .subscription(DesignOverlay::subscription)
        .theme(DesignOverlay::theme)
        .window_size((1440.0, 960.0))
        .centered()
        .run_with(move || DesignOverlay::new(settings, query))
}
