use crate::shared::face::Face;

/// Event names subscribers can filter on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LandmarkEventKind {
    FaceDetected,
    Error,
}

/// A notification produced by one loop tick. Borrowed: subscribers that
/// need to keep the payload clone it.
#[derive(Debug)]
pub enum LandmarkEvent<'a> {
    /// Full face list from a successful detection pass.
    FaceDetected(&'a [Face]),
    /// The failure of a detection pass. Latest result is left as it was.
    Error(&'a (dyn std::error::Error + 'static)),
}

impl LandmarkEvent<'_> {
    pub fn kind(&self) -> LandmarkEventKind {
        match self {
            LandmarkEvent::FaceDetected(_) => LandmarkEventKind::FaceDetected,
            LandmarkEvent::Error(_) => LandmarkEventKind::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventCallback = Box<dyn FnMut(&LandmarkEvent<'_>) + Send>;

struct Subscriber {
    id: SubscriptionId,
    filter: Option<LandmarkEventKind>,
    callback: EventCallback,
}

/// Synchronous observer list. Events go to the subscribers registered at
/// the moment of dispatch, in registration order; nothing is buffered.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for one event kind, or all kinds when `filter`
    /// is `None`.
    pub fn subscribe(
        &mut self,
        filter: Option<LandmarkEventKind>,
        callback: EventCallback,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            callback,
        });
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Delivers `event` and returns how many subscribers received it.
    pub fn emit(&mut self, event: &LandmarkEvent<'_>) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for subscriber in &mut self.subscribers {
            if subscriber.filter.map_or(true, |f| f == kind) {
                (subscriber.callback)(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::Keypoint;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<LandmarkEventKind>>>, EventCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: EventCallback = Box::new(move |event: &LandmarkEvent<'_>| {
            sink.lock().unwrap().push(event.kind());
        });
        (seen, callback)
    }

    fn faces() -> Vec<Face> {
        vec![Face::new(vec![Keypoint::new(1.0, 2.0, None)])]
    }

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let mut bus = EventBus::new();
        let (a, cb_a) = recorder();
        let (b, cb_b) = recorder();
        bus.subscribe(None, cb_a);
        bus.subscribe(None, cb_b);

        let faces = faces();
        let delivered = bus.emit(&LandmarkEvent::FaceDetected(&faces));

        assert_eq!(delivered, 2);
        assert_eq!(*a.lock().unwrap(), vec![LandmarkEventKind::FaceDetected]);
        assert_eq!(*b.lock().unwrap(), vec![LandmarkEventKind::FaceDetected]);
    }

    #[test]
    fn test_filter_by_kind() {
        let mut bus = EventBus::new();
        let (errors, cb) = recorder();
        bus.subscribe(Some(LandmarkEventKind::Error), cb);

        let faces = faces();
        bus.emit(&LandmarkEvent::FaceDetected(&faces));
        let failure: Box<dyn std::error::Error> = "bad frame".into();
        bus.emit(&LandmarkEvent::Error(failure.as_ref()));

        assert_eq!(*errors.lock().unwrap(), vec![LandmarkEventKind::Error]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let (seen, cb) = recorder();
        let id = bus.subscribe(None, cb);

        assert!(bus.unsubscribe(id));
        assert!(bus.is_empty());
        let faces = faces();
        assert_eq!(bus.emit(&LandmarkEvent::FaceDetected(&faces)), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_unknown_id_returns_false() {
        let mut bus = EventBus::new();
        let (_, cb) = recorder();
        let id = bus.subscribe(None, cb);
        bus.unsubscribe(id);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let mut bus = EventBus::new();
        let faces = faces();
        bus.emit(&LandmarkEvent::FaceDetected(&faces));

        let (seen, cb) = recorder();
        bus.subscribe(None, cb);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_error_payload_is_the_failure() {
        let mut bus = EventBus::new();
        let message = Arc::new(Mutex::new(String::new()));
        let sink = message.clone();
        bus.subscribe(
            Some(LandmarkEventKind::Error),
            Box::new(move |event: &LandmarkEvent<'_>| {
                if let LandmarkEvent::Error(e) = event {
                    *sink.lock().unwrap() = e.to_string();
                }
            }),
        );

        let failure: Box<dyn std::error::Error> = "malformed frame".into();
        bus.emit(&LandmarkEvent::Error(failure.as_ref()));
        assert_eq!(*message.lock().unwrap(), "malformed frame");
    }
}
