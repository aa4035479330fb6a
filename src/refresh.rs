use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::display::DisplayWeather;
use crate::source::Source;

/// Owner of the current display state. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    state: Arc<watch::Sender<DisplayWeather>>,
    loading: Arc<watch::Sender<bool>>,
}

impl Dashboard {
    pub fn new(initial: DisplayWeather) -> Self {
        let (state, _) = watch::channel(initial);
        let (loading, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
            loading: Arc::new(loading),
        }
    }

    /// Whether a refresh is in flight.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    fn start_loading(&self) -> LoadingGuard<'_> {
        self.loading.send_replace(true);
        LoadingGuard(&self.loading)
    }

    pub fn current(&self) -> DisplayWeather {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayWeather> {
        self.state.subscribe()
    }

    /// Replaces the whole state.
    pub fn replace(&self, weather: DisplayWeather) {
        self.state.send_replace(weather);
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DisplayWeather::placeholder())
    }
}

// Clears the loading flag on every exit path, including cancellation.
struct LoadingGuard<'a>(&'a watch::Sender<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

/// Runs one refresh against `dashboard`. Failures are logged and leave the
/// previous state in place. Returns whether the state was replaced.
pub async fn refresh_once(source: &mut Source, dashboard: &Dashboard) -> bool {
    let previous = dashboard.current();
    let _loading = dashboard.start_loading();
    match source.refresh(&previous).await {
        Ok(Some(weather)) => {
            dashboard.replace(weather);
            true
        }
        Ok(None) => false,
        Err(e) => {
            warn!(source = source.name(), error = %e, "refresh failed; keeping previous weather");
            false
        }
    }
}

/// Handle to the background refresh task. Dropping it stops the task.
#[derive(Debug)]
pub struct Refresher {
    handle: JoinHandle<()>,
    trigger: Arc<Notify>,
}

impl Refresher {
    /// Asks for a refresh outside the regular period.
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    pub fn trigger(&self) -> Arc<Notify> {
        self.trigger.clone()
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Refreshes immediately, then every `period` (or only on demand when
/// `period` is `None` or zero). Refreshes never overlap; a slow one delays
/// the next tick rather than racing it.
pub fn spawn_refresher(mut source: Source, dashboard: Dashboard, period: Option<Duration>) -> Refresher {
    let period = match period {
        Some(p) if p.is_zero() => {
            warn!("zero refresh period; refreshing on demand only");
            None
        }
        other => other,
    };
    let trigger = Arc::new(Notify::new());
    let notified = trigger.clone();

    let handle = tokio::spawn(async move {
        refresh_once(&mut source, &dashboard).await;

        let Some(period) = period else {
            loop {
                notified.notified().await;
                refresh_once(&mut source, &dashboard).await;
            }
        };

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => debug!(source = source.name(), "scheduled refresh"),
                _ = notified.notified() => debug!(source = source.name(), "forced refresh"),
            }
            refresh_once(&mut source, &dashboard).await;
        }
    });

    Refresher { handle, trigger }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Reading;
    use crate::source::PolledSource;

    fn polled(path: &std::path::Path) -> Source {
        let http = crate::http::client(Duration::from_secs(5)).unwrap();
        Source::Polled(PolledSource::new(http, path.to_string_lossy()))
    }

    #[tokio::test]
    async fn test_refresh_once_replaces_state() {
        let dashboard = Dashboard::default();
        assert!(refresh_once(&mut Source::Static, &dashboard).await);
        assert_eq!(dashboard.current(), DisplayWeather::sample());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::new(DisplayWeather::sample());

        let mut source = polled(&dir.path().join("missing.json"));
        assert!(!refresh_once(&mut source, &dashboard).await);
        assert_eq!(dashboard.current(), DisplayWeather::sample());
    }

    #[tokio::test]
    async fn test_loading_cleared_after_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::default();
        let mut loading = dashboard.subscribe_loading();

        let mut failing = polled(&dir.path().join("missing.json"));
        assert!(!refresh_once(&mut failing, &dashboard).await);
        assert!(loading.has_changed().unwrap());
        assert!(!*loading.borrow_and_update());
        assert!(!dashboard.is_loading());

        assert!(refresh_once(&mut Source::Static, &dashboard).await);
        assert!(loading.has_changed().unwrap());
        assert!(!dashboard.is_loading());
    }

    #[tokio::test]
    async fn test_zero_period_refreshes_on_demand() {
        let dashboard = Dashboard::default();
        let mut updates = dashboard.subscribe();
        let refresher = spawn_refresher(Source::Static, dashboard.clone(), Some(Duration::ZERO));

        updates.changed().await.unwrap();
        dashboard.replace(DisplayWeather::placeholder());
        drop(updates.borrow_and_update());

        refresher.refresh_now();
        updates.changed().await.unwrap();
        assert_eq!(dashboard.current(), DisplayWeather::sample());
        assert!(!refresher.handle.is_finished());
    }

    #[tokio::test]
    async fn test_refresher_honours_forced_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weatherData.json");
        std::fs::write(&path, r#"{"temperature": 10}"#).unwrap();

        let dashboard = Dashboard::default();
        let mut updates = dashboard.subscribe();
        let refresher = spawn_refresher(polled(&path), dashboard.clone(), None);

        updates.changed().await.unwrap();
        assert_eq!(dashboard.current().temperature_c, Reading::Number(10));

        std::fs::write(&path, r#"{"temperature": 12}"#).unwrap();
        refresher.refresh_now();
        updates.changed().await.unwrap();
        assert_eq!(dashboard.current().temperature_c, Reading::Number(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_ticks_on_period() {
        let dashboard = Dashboard::new(DisplayWeather::placeholder());
        let mut updates = dashboard.subscribe();
        let _refresher = spawn_refresher(Source::Static, dashboard.clone(), Some(Duration::from_secs(60)));

        updates.changed().await.unwrap();
        dashboard.replace(DisplayWeather::placeholder());
        drop(updates.borrow_and_update());

        tokio::time::advance(Duration::from_secs(61)).await;
        updates.changed().await.unwrap();
        assert_eq!(dashboard.current(), DisplayWeather::sample());
    }
}
