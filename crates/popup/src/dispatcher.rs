use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::time::{Duration, Instant};

use scheduler::{PopupEvent, PopupKind, PopupPayload, QueueReader};
use tracing::{debug, trace, warn};

use crate::PopupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PopupId(u64);

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "popup#{}", self.0)
    }
}

/// The capability to materialize a popup window. Only the dispatcher holds
/// one, and only for the duration of a tick on the UI thread.
pub trait PopupFactory {
    /// Dropping the window closes it.
    type Window;

    fn open(&mut self, id: PopupId, payload: &PopupPayload) -> Result<Self::Window, PopupError>;
}

/// Stand-in for durations too long to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn instant_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

struct LivePopup<W> {
    kind: PopupKind,
    deadline: Instant,
    window: W,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub opened: usize,
    pub failed: usize,
    pub closed: usize,
}

/// Drains the popup queues on the UI thread and owns every live popup.
///
/// Not `Send`: it is built on the UI thread and stays there.
pub struct Dispatcher<W> {
    images: QueueReader<PopupEvent>,
    texts: QueueReader<PopupEvent>,
    interval: Duration,
    next_tick: Instant,
    next_id: u64,
    live: BTreeMap<PopupId, LivePopup<W>>,
    _ui_thread: PhantomData<Rc<()>>,
}

impl<W> Dispatcher<W> {
    /// The first tick is due immediately.
    pub fn new(
        images: QueueReader<PopupEvent>,
        texts: QueueReader<PopupEvent>,
        interval: Duration,
        now: Instant,
    ) -> Self {
        Self {
            images,
            texts,
            interval,
            next_tick: now,
            next_id: 0,
            live: BTreeMap::new(),
            _ui_thread: PhantomData,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_tick
    }

    /// Pops at most one event per queue, opens a window for each, closes
    /// expired popups and re-arms the next tick.
    pub fn tick<F>(&mut self, factory: &mut F, now: Instant) -> TickReport
    where
        F: PopupFactory<Window = W>,
    {
        let mut report = TickReport::default();

        if let Some(event) = self.images.try_pop() {
            self.materialize(factory, event, now, &mut report);
        }
        if let Some(event) = self.texts.try_pop() {
            self.materialize(factory, event, now, &mut report);
        }

        report.closed = self.close_expired(now);
        self.next_tick = instant_after(now, self.interval);

        if report != TickReport::default() {
            trace!(
                opened = report.opened,
                failed = report.failed,
                closed = report.closed,
                live = self.live.len(),
                image_backlog = self.images.len(),
                text_backlog = self.texts.len(),
                "dispatcher tick"
            );
        }
        report
    }

    fn materialize<F>(
        &mut self,
        factory: &mut F,
        event: PopupEvent,
        now: Instant,
        report: &mut TickReport,
    ) where
        F: PopupFactory<Window = W>,
    {
        let id = PopupId(self.next_id);
        self.next_id += 1;
        let kind = event.kind();
        let (payload, shown_for) = event.into_parts();

        match factory.open(id, &payload) {
            Ok(window) => {
                debug!(
                    %id,
                    %kind,
                    display_ms = shown_for.as_millis() as u64,
                    "popup opened"
                );
                self.live.insert(
                    id,
                    LivePopup {
                        kind,
                        deadline: instant_after(now, shown_for),
                        window,
                    },
                );
                report.opened += 1;
            }
            Err(err) => {
                warn!(%id, %kind, error = %err, "failed to open popup; dropping it");
                report.failed += 1;
            }
        }
    }

    /// Closes every popup whose deadline is at or before `now`.
    pub fn close_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<PopupId> = self
            .live
            .iter()
            .filter(|(_, popup)| popup.deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            if let Some(popup) = self.live.remove(id) {
                debug!(%id, kind = %popup.kind, "popup expired");
            }
        }
        expired.len()
    }

    /// Closes a popup early. Its pending auto-close goes with it.
    pub fn dismiss(&mut self, id: PopupId) -> bool {
        match self.live.remove(&id) {
            Some(popup) => {
                debug!(%id, kind = %popup.kind, "popup dismissed");
                true
            }
            None => false,
        }
    }

    /// Earliest instant anything needs doing: the next tick or the nearest
    /// popup deadline.
    pub fn next_wake(&self) -> Instant {
        self.live
            .values()
            .map(|popup| popup.deadline)
            .fold(self.next_tick, Instant::min)
    }

    pub fn find_popup(&self, mut predicate: impl FnMut(&W) -> bool) -> Option<PopupId> {
        self.live
            .iter()
            .find(|(_, popup)| predicate(&popup.window))
            .map(|(id, _)| *id)
    }

    pub fn popup_mut(&mut self, id: PopupId) -> Option<&mut W> {
        self.live.get_mut(&id).map(|popup| &mut popup.window)
    }

    pub fn deadline(&self, id: PopupId) -> Option<Instant> {
        self.live.get(&id).map(|popup| popup.deadline)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of_kind(&self, kind: PopupKind) -> usize {
        self.live.values().filter(|popup| popup.kind == kind).count()
    }
}
