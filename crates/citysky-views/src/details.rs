//! Details view for one city: weather plus locally persisted notes.
//!
//! The city name is the identity key for both lookups. Notes move through
//! `draft -> saved -> editing -> draft`; only the saved text is persisted.

use citysky_core::StorageError;
use citysky_weather::{CacheKey, WeatherRecord};
use tokio_util::sync::CancellationToken;

use crate::services::{Origin, ViewServices};
use crate::state::ViewState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesState {
    draft: String,
    saved: Option<String>,
}

impl NotesState {
    /// Text being edited. Not persisted.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn saved(&self) -> Option<&str> {
        self.saved.as_deref()
    }

    /// True while there is no saved note on display, i.e. the editor is open.
    pub fn is_editing(&self) -> bool {
        self.saved.is_none()
    }
}

pub struct DetailsView {
    services: ViewServices,
    cancel: CancellationToken,
    city: String,
    weather: ViewState<WeatherRecord>,
    origin: Option<Origin>,
    notes: NotesState,
}

impl DetailsView {
    /// Open the view for `city`. Saved notes come from the cache; nothing
    /// touches the network until [`DetailsView::load`].
    pub fn open(services: ViewServices, city: impl Into<String>) -> Self {
        let city = city.into();
        let saved = services.cache.get::<String>(&CacheKey::notes(city.as_str()));
        if saved.is_some() {
            tracing::debug!("Loaded saved notes for {}", city);
        }

        Self {
            services,
            cancel: CancellationToken::new(),
            city,
            weather: ViewState::default(),
            origin: None,
            notes: NotesState { draft: String::new(), saved },
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn weather(&self) -> &ViewState<WeatherRecord> {
        &self.weather
    }

    /// Whether the displayed record is live or came from the cache.
    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    pub fn notes(&self) -> &NotesState {
        &self.notes
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fetch the city's weather, falling back to the cache when offline.
    pub async fn load(&mut self) {
        self.weather.begin();
        self.origin = None;
        self.services.notifier.loading();

        let Some(outcome) = self.services.fetch_city(&self.cancel, &self.city).await else {
            self.weather.reset();
            return;
        };

        match outcome {
            Ok((record, origin)) => {
                let message = match origin {
                    Origin::Network => {
                        format!("Weather data for {} loaded successfully.", self.city)
                    }
                    Origin::Cache => format!("Loaded weather data for {} from cache.", self.city),
                };
                self.services.notifier.success(message);
                self.origin = Some(origin);
                self.weather.settle(Ok(record));
            }
            Err(message) => {
                self.services.notifier.error(message.as_str());
                self.weather.settle(Err(message));
            }
        }
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.notes.draft = text.into();
    }

    /// Persist the draft under `notes-<city>` and show it as saved.
    pub fn save_notes(&mut self) -> Result<(), StorageError> {
        self.services
            .cache
            .put(&CacheKey::notes(self.city.as_str()), &self.notes.draft)?;
        self.notes.saved = Some(self.notes.draft.clone());
        self.services.notifier.success("Notes saved successfully!");
        Ok(())
    }

    /// Reopen the editor with the saved text. The cache entry stays until
    /// the next save or delete.
    pub fn edit_notes(&mut self) {
        self.notes.draft = self.notes.saved.take().unwrap_or_default();
    }

    pub fn delete_notes(&mut self) -> Result<(), StorageError> {
        self.services
            .cache
            .delete(&CacheKey::notes(self.city.as_str()))?;
        self.notes = NotesState::default();
        self.services.notifier.success("Notes deleted successfully!");
        Ok(())
    }
}

impl Drop for DetailsView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
