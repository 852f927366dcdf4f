use crate::domain::chart::{CrosshairState, Timeframe, Viewport};
use crate::domain::errors::ChartError;
use crate::domain::market_data::BarSeries;
use serde::Serialize;

/// Inclusive bar range with the timestamps at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start_index: usize,
    pub end_index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TimeRange {
    pub fn from_indices(series: &BarSeries, start_index: usize, end_index: usize) -> Option<Self> {
        let (start_index, end_index) = if start_index <= end_index {
            (start_index, end_index)
        } else {
            (end_index, start_index)
        };
        Some(Self {
            start_ms: series.get(start_index)?.timestamp.value(),
            end_ms: series.get(end_index)?.timestamp.value(),
            start_index,
            end_index,
        })
    }
}

/// Visible domain reported after every viewport change
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportDomain {
    pub range: TimeRange,
    pub start: f64,
    pub span: f64,
    pub zoom: f64,
}

impl ViewportDomain {
    pub fn of(viewport: &Viewport, series: &BarSeries) -> Option<Self> {
        let (lo, hi) = viewport.range()?;
        Some(Self {
            range: TimeRange::from_indices(series, lo, hi)?,
            start: viewport.start(),
            span: viewport.span(),
            zoom: viewport.zoom(),
        })
    }
}

/// Why the visible timeframe changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeframeSource {
    Brush,
    Preset(Timeframe),
}

/// Events delivered to the consumer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChartEvent {
    TimeframeChange { range: TimeRange, source: TimeframeSource },
    CrosshairMove { crosshair: Option<CrosshairState> },
    ViewportChange { domain: ViewportDomain },
    Warning {
        #[serde(serialize_with = "serialize_error")]
        error: ChartError,
    },
}

fn serialize_error<S: serde::Serializer>(error: &ChartError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

pub type SubscriptionId = u64;

/// Event dispatcher for publishing chart events
pub trait EventDispatcher {
    fn publish(&mut self, event: &ChartEvent);
}

/// Simple in-memory dispatcher; handlers run synchronously in subscription order
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    handlers: Vec<(SubscriptionId, Box<dyn FnMut(&ChartEvent)>)>,
    next_id: SubscriptionId,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ChartEvent) + 'static,
    {
        self.next_id += 1;
        self.handlers.push((self.next_id, Box::new(handler)));
        self.next_id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish(&mut self, event: &ChartEvent) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn unsubscribed_handlers_stop_receiving() {
        let seen = Rc::new(RefCell::new(0));
        let mut dispatcher = InMemoryEventDispatcher::new();
        let counter = seen.clone();
        let id = dispatcher.subscribe(move |_| *counter.borrow_mut() += 1);

        let event = ChartEvent::CrosshairMove { crosshair: None };
        dispatcher.publish(&event);
        assert!(dispatcher.unsubscribe(id));
        dispatcher.publish(&event);
        assert_eq!(*seen.borrow(), 1);
        assert!(dispatcher.is_empty());
    }
}
