use std::collections::HashMap;

use teratap_decode::DecodedMessage;

/// Callback invoked for each decoded message.
pub type Handler = Box<dyn Fn(&DecodedMessage) + Send>;

/// Routes decoded messages to subscribers by message name.
///
/// Catch-all handlers run before per-name handlers, and handlers registered
/// first run first. Publishing a message nobody subscribed to is a no-op.
#[derive(Default)]
pub struct Dispatcher {
    by_name: HashMap<String, Vec<Handler>>,
    catch_all: Vec<Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one message name.
    pub fn subscribe<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&DecodedMessage) + Send + 'static,
    {
        self.by_name
            .entry(name.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Register a handler for every decoded message.
    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: Fn(&DecodedMessage) + Send + 'static,
    {
        self.catch_all.push(Box::new(handler));
    }

    /// Names with at least one dedicated subscriber.
    pub fn subscribed_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Whether no handler is registered at all.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.catch_all.is_empty()
    }

    /// Hand a message to the catch-all handlers, then its per-name handlers.
    pub fn publish(&self, message: &DecodedMessage) {
        for handler in &self.catch_all {
            handler(message);
        }
        if let Some(handlers) = self.by_name.get(&message.name) {
            for handler in handlers {
                handler(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use bytes::Bytes;
    use teratap_decode::Record;
    use teratap_frame::Direction;

    use super::*;

    fn message(name: &str) -> DecodedMessage {
        DecodedMessage {
            direction: Direction::ServerClient,
            name: name.to_string(),
            opcode: 0x1234,
            fields: Record::new(),
            raw: Bytes::new(),
        }
    }

    #[test]
    fn per_name_handler_sees_only_its_name() {
        let mut dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        dispatcher.subscribe("S_CHAT", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.publish(&message("S_CHAT"));
        dispatcher.publish(&message("S_SPAWN_NPC"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn catch_all_sees_everything() {
        let mut dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        dispatcher.subscribe_all(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.publish(&message("S_CHAT"));
        dispatcher.publish(&message("S_SPAWN_NPC"));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn handlers_stack_per_name() {
        let mut dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = hits.clone();
            dispatcher.subscribe("S_CHAT", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        dispatcher.publish(&message("S_CHAT"));

        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.is_empty());
        dispatcher.publish(&message("S_CHAT"));
    }

    #[test]
    fn subscribed_names_lists_dedicated_subscriptions() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.subscribe("S_CHAT", |_| {});
        dispatcher.subscribe("C_START_SKILL", |_| {});
        dispatcher.subscribe_all(|_| {});

        let mut names: Vec<&str> = dispatcher.subscribed_names().collect();
        names.sort_unstable();

        assert_eq!(names, ["C_START_SKILL", "S_CHAT"]);
    }
}
