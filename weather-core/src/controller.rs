//! Search flow: input → proxy lookups → rendering → history.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    client::{FetchError, ProxyClient},
    history::{HistoryEntry, HistoryStore, Storage},
    model::CityQuery,
    render::{ChartHandle, CurrentPanel, ForecastChart, render_current, render_forecast},
};

/// Where the controller draws its output.
pub trait View: Send {
    fn show_current(&mut self, panel: &CurrentPanel);
    fn show_forecast(&mut self, chart: &ForecastChart);
    fn show_history(&mut self, entries: &[HistoryEntry]);
    /// Blocking notification of a failed search.
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank input, nothing happened.
    Skipped,
    Completed,
    Failed,
    /// A newer search took over before this one finished.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Could not save search history: {0}")]
    History(#[source] anyhow::Error),
}

enum Flow {
    Done,
    Cancelled,
}

#[derive(Debug)]
pub struct SearchController<S> {
    client: ProxyClient,
    history: HistoryStore<S>,
    chart: Mutex<ChartHandle>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl<S: Storage> SearchController<S> {
    pub fn new(client: ProxyClient, history: HistoryStore<S>) -> Self {
        Self {
            client,
            history,
            chart: Mutex::new(ChartHandle::new()),
            in_flight: Mutex::new(None),
        }
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    /// Draw the persisted history list.
    pub fn init(&self, view: &mut dyn View) {
        view.show_history(&self.history.entries());
    }

    /// Abort the in-flight search, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.in_flight.lock().take() {
            token.cancel();
        }
    }

    /// Run a search for the text in the query field.
    pub async fn search(&self, raw: &str, view: &mut dyn View) -> SearchOutcome {
        let Some(city) = CityQuery::parse(raw) else {
            return SearchOutcome::Skipped;
        };

        let token = self.begin();
        info!(%city, "searching");

        match self.run(&city, &token, view).await {
            Ok(Flow::Done) => SearchOutcome::Completed,
            Ok(Flow::Cancelled) => {
                debug!(%city, "search superseded");
                SearchOutcome::Cancelled
            }
            Err(_) if token.is_cancelled() => SearchOutcome::Cancelled,
            Err(err) => {
                warn!(%city, error = %err, "search failed");
                view.alert(&err.to_string());
                SearchOutcome::Failed
            }
        }
    }

    /// Re-run the search for the history entry at `position`.
    pub async fn activate_history(&self, position: usize, view: &mut dyn View) -> SearchOutcome {
        let entries = self.history.entries();
        match entries.get(position) {
            Some(entry) => self.search(&entry.city, view).await,
            None => SearchOutcome::Skipped,
        }
    }

    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.lock().replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    async fn run(
        &self,
        city: &CityQuery,
        token: &CancellationToken,
        view: &mut dyn View,
    ) -> Result<Flow, SearchError> {
        let reading = tokio::select! {
            _ = token.cancelled() => return Ok(Flow::Cancelled),
            reading = self.client.current(city) => reading?,
        };
        view.show_current(&render_current(&reading));

        let series = tokio::select! {
            _ = token.cancelled() => return Ok(Flow::Cancelled),
            series = self.client.forecast(city) => series?,
        };
        if token.is_cancelled() {
            return Ok(Flow::Cancelled);
        }

        let chart = {
            let mut slot = self.chart.lock();
            let handle = std::mem::take(&mut *slot);
            *slot = render_forecast(handle, &series);
            slot.chart().cloned()
        };
        if let Some(chart) = chart {
            view.show_forecast(&chart);
        }

        self.history.add_city(city).map_err(SearchError::History)?;
        view.show_history(&self.history.entries());

        Ok(Flow::Done)
    }
}
