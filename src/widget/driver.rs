//! Widget handle: runs a controller on its own tokio task.
//!
//! Actions go in through a bounded channel and are applied strictly in
//! order. Effects run as tasks in a `JoinSet` owned by the widget task; each
//! one resolves to the action that reports its completion. Dropping the set
//! on teardown aborts any outstanding fetch or timer.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::WidgetConfig;
use crate::error::{Result, SuggestError};
use crate::source::OptionSource;
use crate::widget::controller::AutocompleteWidget;
use crate::widget::model::{Effect, WidgetAction, WidgetView};
use crate::widget::selection::HiddenField;

const CHANNEL_CAPACITY: usize = 100;
const CHANGE_CAPACITY: usize = 16;

/// An action plus an optional acknowledgement carrying the resulting view
struct Envelope {
    action: WidgetAction,
    ack: Option<oneshot::Sender<WidgetView>>,
}

/// A mounted widget running on the tokio runtime
pub struct WidgetHandle {
    tx: Option<mpsc::Sender<Envelope>>,
    view_rx: watch::Receiver<WidgetView>,
    changes: broadcast::Sender<Vec<HiddenField>>,
    task: Option<JoinHandle<()>>,
}

impl WidgetHandle {
    /// Mount a widget. Must be called from within a tokio runtime.
    pub fn mount<S: OptionSource>(config: &WidgetConfig, source: S) -> Self {
        Self::start(AutocompleteWidget::new(config, source))
    }

    /// Run an already constructed controller
    pub fn start<S: OptionSource>(widget: AutocompleteWidget<S>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (view_tx, view_rx) = watch::channel(widget.view());
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        let task = tokio::spawn(run(widget, rx, view_tx, changes.clone()));

        Self {
            tx: Some(tx),
            view_rx,
            changes,
            task: Some(task),
        }
    }

    /// Queue an action for the widget task
    pub async fn dispatch(&self, action: WidgetAction) -> Result<()> {
        self.send(Envelope { action, ack: None }).await
    }

    /// Apply an action and return the view right after it was handled.
    ///
    /// Effects the action started (a fetch, a close timer) may still be
    /// running; use `wait_until` to observe their completion.
    pub async fn apply(&self, action: WidgetAction) -> Result<WidgetView> {
        let (ack, done) = oneshot::channel();
        self.send(Envelope {
            action,
            ack: Some(ack),
        })
        .await?;
        done.await.map_err(|_| SuggestError::Unmounted)
    }

    async fn send(&self, envelope: Envelope) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(SuggestError::Unmounted)?;
        tx.send(envelope).await.map_err(|_| SuggestError::Unmounted)
    }

    /// Latest published view
    pub fn view(&self) -> WidgetView {
        self.view_rx.borrow().clone()
    }

    /// Receiver notified on every view change
    pub fn subscribe(&self) -> watch::Receiver<WidgetView> {
        self.view_rx.clone()
    }

    /// Receiver of committed-selection changes (the new hidden fields)
    pub fn on_change(&self) -> broadcast::Receiver<Vec<HiddenField>> {
        self.changes.subscribe()
    }

    /// Wait until the published view satisfies `predicate`
    pub async fn wait_until<F>(&self, timeout: Duration, mut predicate: F) -> Result<WidgetView>
    where
        F: FnMut(&WidgetView) -> bool,
    {
        let mut rx = self.view_rx.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|view| predicate(view))).await {
            Ok(Ok(view)) => Ok(view.clone()),
            Ok(Err(_)) => Err(SuggestError::Unmounted),
            Err(_) => Err(SuggestError::Other(format!(
                "widget did not reach the expected state within {:?}",
                timeout
            ))),
        }
    }

    /// Tear the widget down: pending actions are drained, outstanding
    /// requests and timers are aborted.
    pub async fn dispose(mut self) {
        self.tx.take();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("widget task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<S: OptionSource>(
    mut widget: AutocompleteWidget<S>,
    mut rx: mpsc::Receiver<Envelope>,
    view_tx: watch::Sender<WidgetView>,
    changes: broadcast::Sender<Vec<HiddenField>>,
) {
    let mut effects: JoinSet<WidgetAction> = JoinSet::new();

    loop {
        let (action, ack) = tokio::select! {
            envelope = rx.recv() => match envelope {
                Some(Envelope { action, ack }) => (action, ack),
                None => break,
            },
            Some(joined) = effects.join_next() => match joined {
                Ok(action) => (action, None),
                Err(e) => {
                    if !e.is_cancelled() {
                        tracing::warn!("widget effect task failed: {e}");
                    }
                    continue;
                }
            },
        };

        for effect in widget.dispatch(action) {
            spawn_effect(effect, &mut effects, &changes);
        }

        let view = widget.view();
        if let Some(ack) = ack {
            // The caller may have stopped waiting.
            let _ = ack.send(view.clone());
        }
        view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    tracing::debug!("widget for '{}' unmounted", widget.state().selection.field_name());
}

fn spawn_effect(
    effect: Effect,
    effects: &mut JoinSet<WidgetAction>,
    changes: &broadcast::Sender<Vec<HiddenField>>,
) {
    match effect {
        Effect::Fetch(pending) => {
            effects.spawn(async move { WidgetAction::FetchSettled(pending.settle().await) });
        }
        Effect::ScheduleClose { token, delay } => {
            effects.spawn(async move {
                tokio::time::sleep(delay).await;
                WidgetAction::CloseTimerElapsed(token)
            });
        }
        Effect::Changed(fields) => {
            if changes.send(fields).is_err() {
                tracing::debug!("selection changed with no listeners");
            }
        }
    }
}
