use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

/// A registered callback. Identity is the `Rc` allocation: cloning the handle
/// refers to the same subscriber, a fresh `Rc::new` is a different one.
pub type Subscriber<M> = Rc<dyn Fn(&M)>;

/// Topic-keyed synchronous fan-out for a single-threaded embedder.
///
/// `publish` invokes subscribers in subscription order and returns only after
/// every one of them has returned. The dispatch list is snapshotted when a
/// publish begins, so subscriptions added or removed by a callback take
/// effect on the next publish. Callbacks that publish to the same topic from
/// inside their own invocation risk unbounded recursion; avoiding that is the
/// caller's responsibility.
pub struct PubSub<M> {
    topics: RefCell<HashMap<String, Vec<Subscriber<M>>>>,
}

impl<M> Default for PubSub<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> PubSub<M> {
    pub fn new() -> Self {
        Self {
            topics: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a subscriber on a topic, creating the topic lazily.
    /// Registering the same subscriber twice on one topic is idempotent.
    pub fn subscribe(&self, topic: impl Into<String>, subscriber: Subscriber<M>) {
        let mut topics = self.topics.borrow_mut();
        let subs = topics.entry(topic.into()).or_default();
        if !subs.iter().any(|s| Rc::ptr_eq(s, &subscriber)) {
            subs.push(subscriber);
        }
    }

    /// Wraps a closure, registers it, and returns the handle for a later
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe_fn(
        &self,
        topic: impl Into<String>,
        f: impl Fn(&M) + 'static,
    ) -> Subscriber<M> {
        let subscriber: Subscriber<M> = Rc::new(f);
        self.subscribe(topic, subscriber.clone());
        subscriber
    }

    /// Removes a subscriber from a topic. Unknown topics and subscribers that
    /// were never registered are silently ignored.
    pub fn unsubscribe(&self, topic: &str, subscriber: &Subscriber<M>) {
        if let Some(subs) = self.topics.borrow_mut().get_mut(topic) {
            subs.retain(|s| !Rc::ptr_eq(s, subscriber));
        }
    }

    /// Synchronously delivers `message` to every subscriber of `topic`, in
    /// subscription order. A topic with no subscribers is a no-op.
    pub fn publish(&self, topic: &str, message: &M) {
        let snapshot = self.topics.borrow().get(topic).cloned();
        if let Some(subs) = snapshot {
            for subscriber in subs {
                subscriber(message);
            }
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.borrow().get(topic).map_or(0, Vec::len)
    }

    /// All known topics, sorted. Topics persist once created, even with every
    /// subscriber removed.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drops every subscriber of one topic.
    pub fn clear_topic(&self, topic: &str) {
        if let Some(subs) = self.topics.borrow_mut().get_mut(topic) {
            subs.clear();
        }
    }

    /// Drops every subscriber of every topic.
    pub fn clear_all(&self) {
        self.topics.borrow_mut().clear();
    }
}

impl<M> fmt::Debug for PubSub<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.borrow();
        let mut counts: Vec<(&String, usize)> =
            topics.iter().map(|(k, v)| (k, v.len())).collect();
        counts.sort();
        f.debug_map().entries(counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn publish_delivers_to_subscriber() {
        let bus: PubSub<u32> = PubSub::new();
        let seen = Rc::new(Cell::new(0u32));
        let seen2 = seen.clone();
        bus.subscribe_fn("numbers", move |n| seen2.set(seen2.get() + n));

        bus.publish("numbers", &5);
        bus.publish("numbers", &7);
        assert_eq!(seen.get(), 12);
    }

    #[test]
    fn duplicate_subscribe_fires_once() {
        let bus: PubSub<()> = PubSub::new();
        let hits = Rc::new(Cell::new(0u32));
        let hits2 = hits.clone();
        let cb: Subscriber<()> = Rc::new(move |_| hits2.set(hits2.get() + 1));

        bus.subscribe("t", cb.clone());
        bus.subscribe("t", cb.clone());
        assert_eq!(bus.subscriber_count("t"), 1);

        bus.publish("t", &());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn distinct_closures_are_distinct_subscribers() {
        let bus: PubSub<()> = PubSub::new();
        let hits = Rc::new(Cell::new(0u32));
        for _ in 0..2 {
            let hits2 = hits.clone();
            bus.subscribe_fn("t", move |_| hits2.set(hits2.get() + 1));
        }
        assert_eq!(bus.subscriber_count("t"), 2);
        bus.publish("t", &());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus: PubSub<()> = PubSub::new();
        let hits = Rc::new(Cell::new(0u32));
        let hits2 = hits.clone();
        let cb = bus.subscribe_fn("t", move |_| hits2.set(hits2.get() + 1));

        bus.publish("t", &());
        bus.unsubscribe("t", &cb);
        bus.publish("t", &());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unsubscribe_absent_is_noop() {
        let bus: PubSub<()> = PubSub::new();
        let cb: Subscriber<()> = Rc::new(|_| {});
        bus.unsubscribe("never-seen", &cb);

        bus.subscribe_fn("t", |_| {});
        let other: Subscriber<()> = Rc::new(|_| {});
        bus.unsubscribe("t", &other);
        assert_eq!(bus.subscriber_count("t"), 1);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus: PubSub<String> = PubSub::new();
        bus.publish("empty", &"anything".to_string());

        bus.subscribe_fn("other", |_| {});
        bus.publish("empty", &"anything".to_string());
    }

    #[test]
    fn delivery_follows_subscription_order() {
        let bus: PubSub<()> = PubSub::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order2 = order.clone();
            bus.subscribe_fn("t", move |_| order2.borrow_mut().push(name));
        }
        bus.publish("t", &());
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn topics_are_independent() {
        let bus: PubSub<u32> = PubSub::new();
        let a = Rc::new(Cell::new(0u32));
        let b = Rc::new(Cell::new(0u32));
        let a2 = a.clone();
        let b2 = b.clone();
        bus.subscribe_fn("a", move |n| a2.set(a2.get() + n));
        bus.subscribe_fn("b", move |n| b2.set(b2.get() + n));

        bus.publish("a", &1);
        assert_eq!((a.get(), b.get()), (1, 0));
    }

    #[test]
    fn subscription_during_publish_lands_next_round() {
        let bus = Rc::new(PubSub::<()>::new());
        let late_hits = Rc::new(Cell::new(0u32));

        let bus2 = bus.clone();
        let late_hits2 = late_hits.clone();
        bus.subscribe_fn("t", move |_| {
            let late_hits3 = late_hits2.clone();
            bus2.subscribe_fn("t", move |_| late_hits3.set(late_hits3.get() + 1));
        });

        bus.publish("t", &());
        assert_eq!(late_hits.get(), 0);
        bus.publish("t", &());
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn introspection_helpers() {
        let bus: PubSub<()> = PubSub::new();
        bus.subscribe_fn("b", |_| {});
        bus.subscribe_fn("a", |_| {});
        bus.subscribe_fn("a", |_| {});
        assert_eq!(bus.topics(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(bus.subscriber_count("a"), 2);
        assert_eq!(bus.subscriber_count("missing"), 0);

        bus.clear_topic("a");
        assert_eq!(bus.subscriber_count("a"), 0);
        assert_eq!(bus.topics().len(), 2);

        bus.clear_all();
        assert!(bus.topics().is_empty());
    }
}
