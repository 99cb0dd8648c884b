use std::sync::Arc;

use crate::{
    model::{HistoryReceipt, RecordView, ViewSource},
    providers::HistoryRecorder,
};

/// Moves the host to another view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, destination: &str) {
        self(destination)
    }
}

/// Records a view, then navigates. Recording never blocks navigation.
pub struct NavigationOrchestrator<N> {
    recorder: Arc<HistoryRecorder>,
    navigator: N,
}

impl<N: Navigator> NavigationOrchestrator<N> {
    pub fn new(recorder: Arc<HistoryRecorder>, navigator: N) -> Self {
        Self {
            recorder,
            navigator,
        }
    }

    /// Navigates to `destination`. With a `movie_id`, the view is recorded
    /// first; a failed recording is logged and dropped.
    #[tracing::instrument(name = "navigate", skip(self))]
    pub async fn open(&self, destination: &str, movie_id: Option<&str>) -> Option<HistoryReceipt> {
        let movie_id = movie_id.map(str::trim).filter(|id| !id.is_empty());

        let receipt = match movie_id {
            Some(movie_id) => {
                let view = RecordView::now(movie_id, ViewSource::Navigate);
                match self.recorder.record_view(view).await {
                    Ok(receipt) => Some(receipt),
                    Err(kind) => {
                        tracing::warn!(err.kind = %kind, "Could not record view, navigating anyway");
                        None
                    }
                }
            }
            None => None,
        };

        self.navigator.navigate(destination);

        receipt
    }
}
