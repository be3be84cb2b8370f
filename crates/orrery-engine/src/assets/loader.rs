//! Asynchronous asset loading.
//!
//! A loader is handed a [`LoadSink`] per request and completes it whenever
//! the asset arrives, in any order. Completions land in the scene's
//! [`LoadChannel`] and are applied at the start of the next tick. The sink
//! only holds a weak reference, so a completion that arrives after the
//! scene unmounted (or was dropped) goes nowhere.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use crate::api::error::LoadError;
use super::content::SceneContent;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Body the content is for.
    pub body: String,
    /// Resolved resource path.
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Loaded {
        body: String,
        content: SceneContent,
    },
    Failed {
        body: String,
        resource: String,
        error: LoadError,
    },
}

pub struct LoadQueue {
    events: Vec<LoadEvent>,
}

impl LoadQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: LoadEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<LoadEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for LoadQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion queue owned by a mounted scene.
pub struct LoadChannel {
    queue: RefCell<LoadQueue>,
    mounted: Cell<bool>,
}

impl LoadChannel {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            queue: RefCell::new(LoadQueue::new()),
            mounted: Cell::new(true),
        })
    }

    pub fn sink(self: &Rc<Self>, request: LoadRequest) -> LoadSink {
        LoadSink {
            channel: Rc::downgrade(self),
            request,
        }
    }

    pub fn is_open(&self) -> bool {
        self.mounted.get()
    }

    /// Stop accepting completions and drop anything queued.
    pub fn close(&self) {
        self.mounted.set(false);
        self.queue.borrow_mut().drain();
    }

    pub fn drain(&self) -> Vec<LoadEvent> {
        self.queue.borrow_mut().drain()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn deliver(&self, event: LoadEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        self.queue.borrow_mut().push(event);
        true
    }
}

/// One-shot completion handle for a single request.
pub struct LoadSink {
    channel: Weak<LoadChannel>,
    request: LoadRequest,
}

impl LoadSink {
    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    /// Report the outcome. Returns false when the scene is gone and the
    /// result was discarded.
    pub fn complete(self, result: Result<SceneContent, LoadError>) -> bool {
        let Some(channel) = self.channel.upgrade() else {
            log::debug!("late load for {} dropped", self.request.body);
            return false;
        };
        let LoadRequest { body, resource } = self.request;
        let event = match result {
            Ok(content) => LoadEvent::Loaded { body, content },
            Err(error) => LoadEvent::Failed {
                body,
                resource,
                error,
            },
        };
        channel.deliver(event)
    }
}

pub trait AssetLoader {
    /// Start loading `sink.request()`. Must not complete synchronously
    /// into a scene that is mid-tick; queueing makes either timing safe.
    fn begin(&mut self, sink: LoadSink);
}

/// Loader backed by a table of prepared results. Requests stay in flight
/// until flushed, so tests control arrival order.
#[derive(Default)]
pub struct MemoryLoader {
    table: HashMap<String, Result<SceneContent, LoadError>>,
    in_flight: VecDeque<LoadSink>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, resource: impl Into<String>, content: SceneContent) -> Self {
        self.table.insert(resource.into(), Ok(content));
        self
    }

    pub fn with_failure(mut self, resource: impl Into<String>, error: LoadError) -> Self {
        self.table.insert(resource.into(), Err(error));
        self
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn outcome(&self, resource: &str) -> Result<SceneContent, LoadError> {
        self.table
            .get(resource)
            .cloned()
            .unwrap_or_else(|| Err(LoadError::NotFound(resource.to_string())))
    }

    /// Complete every in-flight request in request order. Returns how many
    /// completions were accepted.
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(sink) = self.in_flight.pop_front() {
            let outcome = self.outcome(&sink.request().resource);
            if sink.complete(outcome) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Complete the in-flight request for `body`, if any.
    pub fn flush_one(&mut self, body: &str) -> Option<bool> {
        let idx = self.in_flight.iter().position(|s| s.request().body == body)?;
        let sink = self.in_flight.remove(idx)?;
        let outcome = self.outcome(&sink.request().resource);
        Some(sink.complete(outcome))
    }
}

impl AssetLoader for MemoryLoader {
    fn begin(&mut self, sink: LoadSink) {
        self.in_flight.push_back(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: &str) -> LoadRequest {
        LoadRequest {
            body: body.into(),
            resource: format!("{}.gltf", body),
        }
    }

    #[test]
    fn completions_queue_until_drained() {
        let channel = LoadChannel::new();
        let mut loader = MemoryLoader::new().with_content("Earth.gltf", SceneContent::unit_sphere());
        loader.begin(channel.sink(request("Earth")));
        loader.begin(channel.sink(request("Mars")));
        assert_eq!(channel.pending(), 0);
        assert_eq!(loader.flush(), 2);

        let events = channel.drain();
        assert!(matches!(&events[0], LoadEvent::Loaded { body, .. } if body == "Earth"));
        assert!(matches!(
            &events[1],
            LoadEvent::Failed { error: LoadError::NotFound(_), .. }
        ));
    }

    #[test]
    fn out_of_order_arrival() {
        let channel = LoadChannel::new();
        let mut loader = MemoryLoader::new();
        loader.begin(channel.sink(request("a")));
        loader.begin(channel.sink(request("b")));
        assert_eq!(loader.flush_one("b"), Some(true));
        assert_eq!(loader.in_flight_count(), 1);
        assert_eq!(loader.flush_one("zzz"), None);
    }

    #[test]
    fn closed_channel_discards() {
        let channel = LoadChannel::new();
        let sink = channel.sink(request("Earth"));
        channel.close();
        assert!(!sink.complete(Ok(SceneContent::unit_sphere())));
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn dropped_channel_discards() {
        let channel = LoadChannel::new();
        let sink = channel.sink(request("Earth"));
        drop(channel);
        assert!(!sink.complete(Ok(SceneContent::unit_sphere())));
    }
}
