use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_input, Column, Row};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::fmt;
use std::path::PathBuf;

mod config;
mod error;
mod search;
mod state;

use config::Config;
use error::CatalogError;
use search::session::{Effect, Outcome, SearchSession};
use state::data::{Facets, ImportResult, Record};
use state::import::import_folder_async;
use state::library::{find_async, load_facets_async, Library};

/// Width of the per-row action column
const ACTION_WIDTH: f32 = 80.0;

/// Dropdown entry: no constraint, or one concrete value
#[derive(Debug, Clone, PartialEq, Eq)]
enum Choice {
    All,
    Value(String),
}

impl Choice {
    fn from_option(value: Option<&str>) -> Self {
        match value {
            Some(value) => Choice::Value(value.to_string()),
            None => Choice::All,
        }
    }

    fn into_option(self) -> Option<String> {
        match self {
            Choice::All => None,
            Choice::Value(value) => Some(value),
        }
    }

    fn options(values: &[String]) -> Vec<Choice> {
        std::iter::once(Choice::All)
            .chain(values.iter().cloned().map(Choice::Value))
            .collect()
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str("All"),
            Choice::Value(value) => f.write_str(value),
        }
    }
}

/// Main application state
struct Inventory {
    /// Catalog database file; every background task opens its own connection
    db_path: PathBuf,
    /// Query state, dispatcher and derived views
    session: SearchSession,
    /// Dropdown contents
    facets: Facets,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// Search box text changed
    SearchChanged(String),
    /// Debounce timer with this token fired
    DebounceElapsed(u64),
    BrandSelected(Choice),
    TypeSelected(Choice),
    /// User clicked a suggestion (model name)
    SuggestionPicked(String),
    /// Store answered the dispatch with this sequence number
    QueryFinished(u64, Result<Vec<Record>, CatalogError>),
    FacetsLoaded(Result<Facets, CatalogError>),
    /// Copy table row to the clipboard
    CopyRow(usize),
    /// User clicked the "Import Folder" button
    ImportFolder,
    /// Background import completed with results
    ImportComplete(Result<ImportResult, CatalogError>),
}

impl Inventory {
    /// Create a new instance of the application
    fn new(config: Config, db_path: PathBuf, item_count: i64) -> (Self, Task<Message>) {
        let (session, mount) = SearchSession::new(&config.search);

        let app = Inventory {
            db_path,
            session,
            facets: Facets::default(),
            status: format!("Ready. {} items in catalog.", item_count),
        };

        let task = Task::batch([app.run(mount), app.load_facets()]);
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SearchChanged(term) => {
                let effect = self.session.edit_term(term);
                self.run(effect)
            }
            Message::DebounceElapsed(token) => {
                let effect = self.session.debounce_elapsed(token);
                self.run(effect)
            }
            Message::BrandSelected(choice) => {
                let effect = self.session.select_brand(choice.into_option());
                self.run(effect)
            }
            Message::TypeSelected(choice) => {
                let effect = self.session.select_type(choice.into_option());
                self.run(effect)
            }
            Message::SuggestionPicked(model) => {
                let effect = self.session.select_suggestion(&model);
                self.run(effect)
            }
            Message::QueryFinished(seq, result) => {
                match self.session.query_finished(seq, result) {
                    Outcome::Applied => {
                        self.status = format!("{} items found.", self.session.view().table.len());
                    }
                    Outcome::Failed => {
                        if let Some(diagnostic) = self.session.diagnostic() {
                            self.status = format!("⚠️  {}", diagnostic);
                        }
                    }
                    Outcome::Stale => {}
                }
                Task::none()
            }
            Message::FacetsLoaded(result) => {
                match result {
                    Ok(facets) => self.facets = facets,
                    Err(err) => {
                        tracing::warn!("Failed to load filter options: {err}");
                        self.status = format!("⚠️  {}", err);
                    }
                }
                Task::none()
            }
            Message::CopyRow(index) => {
                let Some(record) = self.session.view().table.get(index) else {
                    return Task::none();
                };
                let line = record.clipboard_line();
                self.status = format!("Copied: {}", line);
                iced::clipboard::write(line)
            }
            Message::ImportFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder with Catalog Files")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    self.status = format!("Importing from {}...", folder_path.display());

                    return Task::perform(
                        import_folder_async(folder_path, self.db_path.clone()),
                        Message::ImportComplete,
                    );
                }

                Task::none()
            }
            Message::ImportComplete(Err(err)) => {
                self.status = format!("⚠️  Import failed: {}", err);
                Task::none()
            }
            Message::ImportComplete(Ok(result)) => {
                self.status = format!(
                    "✅ Import complete! Added {} items, skipped {} duplicates, {} files failed.",
                    result.imported_count, result.skipped_count, result.failed_files
                );

                // Catalog changed: reload dropdowns and re-run the current filter
                let refresh = self.session.refresh();
                Task::batch([self.load_facets(), self.run(refresh)])
            }
        }
    }

    /// Turn a session effect into a runtime task
    fn run(&self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::None => Task::none(),
            Effect::Schedule { token, delay } => {
                Task::perform(tokio::time::sleep(delay), move |_| {
                    Message::DebounceElapsed(token)
                })
            }
            Effect::Dispatch(ticket) => {
                let seq = ticket.seq;
                Task::perform(
                    find_async(self.db_path.clone(), ticket.filter),
                    move |result| Message::QueryFinished(seq, result),
                )
            }
        }
    }

    fn load_facets(&self) -> Task<Message> {
        Task::perform(load_facets_async(self.db_path.clone()), Message::FacetsLoaded)
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let query = self.session.query();
        let results = self.session.view();

        let brand_picker = pick_list(
            Choice::options(&self.facets.brands),
            Some(Choice::from_option(query.brand.as_deref())),
            Message::BrandSelected,
        )
        .padding(8);

        let type_picker = pick_list(
            Choice::options(&self.facets.types),
            Some(Choice::from_option(query.kind.as_deref())),
            Message::TypeSelected,
        )
        .padding(8);

        let search_box = text_input("Search by model...", &query.term)
            .on_input(Message::SearchChanged)
            .padding(8);

        let suggestions: Column<Message> = Column::with_children(results.suggestions.iter().map(|record| {
            button(text(record.model.clone()))
                .on_press(Message::SuggestionPicked(record.model.clone()))
                .style(button::text)
                .width(Length::Fill)
                .into()
        }))
        .spacing(2);

        let filters = row![
            brand_picker,
            type_picker,
            column![search_box, suggestions]
                .spacing(4)
                .width(Length::FillPortion(2)),
            button("Import Folder")
                .on_press(Message::ImportFolder)
                .padding(8),
        ]
        .spacing(16);

        let header: Row<Message> = Row::with_children(
            results
                .columns
                .iter()
                .map(|column| {
                    text(column.to_uppercase())
                        .width(Length::FillPortion(1))
                        .into()
                })
                .chain(std::iter::once(
                    text("").width(Length::Fixed(ACTION_WIDTH)).into(),
                )),
        )
        .spacing(10);

        let body: Element<Message> = if results.is_empty() {
            container(text("Data not found"))
                .padding(16)
                .center_x(Length::Fill)
                .into()
        } else {
            let rows: Column<Message> = Column::with_children(
                results
                    .table
                    .iter()
                    .enumerate()
                    .map(|(index, record)| table_row(index, record, &results.columns)),
            )
            .spacing(6);
            rows.into()
        };

        let status = if self.session.is_searching() {
            format!("{} Searching...", self.status)
        } else {
            self.status.clone()
        };

        let content: Column<Message> = column![
            text("Inventory").size(32),
            filters,
            text(status).size(14),
            header,
            scrollable(body).height(Length::Fill),
        ]
        .spacing(16)
        .padding(24);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// One table row: a cell per derived column plus the Copy button
fn table_row<'a>(index: usize, record: &'a Record, columns: &'a [String]) -> Element<'a, Message> {
    let row: Row<'a, Message> = Row::with_children(columns.iter().map(|column| {
        text(record.display(column))
            .width(Length::FillPortion(1))
            .into()
    }))
    .push(
        button("Copy")
            .on_press(Message::CopyRow(index))
            .width(Length::Fixed(ACTION_WIDTH)),
    )
    .spacing(10)
    .align_y(Alignment::Center);

    row.into()
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!("{err}; using default configuration");
        Config::default()
    });
    let db_path = config.database_path();

    // Open once up front so schema problems surface before the window does
    let item_count = match Library::open(&db_path).and_then(|library| library.item_count()) {
        Ok(count) => count,
        Err(err) => {
            tracing::error!("Failed to open catalog at {}: {err}", db_path.display());
            std::process::exit(1);
        }
    };
    tracing::info!("Inventory initialized with {} items at {}", item_count, db_path.display());

    iced::application("Inventory", Inventory::update, Inventory::view)
        .theme(Inventory::theme)
        .centered()
        .run_with(move || Inventory::new(config, db_path, item_count))
}
