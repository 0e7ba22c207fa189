//! Named reactive cells.
//!
//! A [`Channel<T>`] holds one value in shared, reference-counted storage
//! (`Rc<RefCell<..>>`) together with an ordered list of subscribers. Every
//! [`Channel::publish`] notifies all live subscribers in registration order,
//! whether or not the value changed.
//!
//! Callbacks are snapshotted before notification and run outside the borrow,
//! so a subscriber may publish to another channel, subscribe, or read this
//! channel without panicking. Publishing to the same channel from its own
//! subscriber recurses; an unbounded cycle is a caller bug.

use std::{
    any::Any,
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
    str::FromStr,
};

use log::trace;
use thiserror::Error;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

/// The fixed set of channels a [`StateHub`](super::StateHub) carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    SelectedDiagram,
    SelectedInstance,
    Callouts,
    HoveredCallout,
    SelectedCallout,
    OverlayData,
    Widget,
}

impl ChannelName {
    /// Every channel, in hub order.
    pub const ALL: [ChannelName; 7] = [
        Self::SelectedDiagram,
        Self::SelectedInstance,
        Self::Callouts,
        Self::HoveredCallout,
        Self::SelectedCallout,
        Self::OverlayData,
        Self::Widget,
    ];

    /// Returns the channel's name as used by the web front end.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelectedDiagram => "selectedDiagram",
            Self::SelectedInstance => "selectedInstance",
            Self::Callouts => "callouts",
            Self::HoveredCallout => "hoveredCallout",
            Self::SelectedCallout => "selectedCallout",
            Self::OverlayData => "overlayData",
            Self::Widget => "widget",
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when looking up a channel by an unknown name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown channel `{0}`")]
pub struct UnknownChannel(String);

impl FromStr for ChannelName {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

struct ChannelInner<T> {
    value: T,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A named value with synchronous change notification.
///
/// Cloning a `Channel` creates a new handle to the same value and the same
/// subscribers.
pub struct Channel<T> {
    name: ChannelName,
    inner: Rc<RefCell<ChannelInner<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("value", &inner.value)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + 'static> Channel<T> {
    /// Creates a channel holding `value` with no subscribers.
    pub fn new(name: ChannelName, value: T) -> Self {
        Self {
            name,
            inner: Rc::new(RefCell::new(ChannelInner {
                value,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Returns the channel's name.
    pub fn name(&self) -> ChannelName {
        self.name
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Reads the current value without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` publishes to this same channel.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replaces the value and notifies every live subscriber, in subscription
    /// order.
    pub fn publish(&self, value: T) {
        self.inner.borrow_mut().value = value;
        self.notify();
    }

    /// Registers `callback`, calling it right away with the current value and
    /// again after every [`Channel::publish`].
    ///
    /// The callback stays registered for as long as the returned
    /// [`Subscription`] lives.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));

        let current = self.get();
        strong(&current);

        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.strong_count() > 0)
            .count()
    }

    fn notify(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner
                .subscribers
                .retain(|subscriber| subscriber.strong_count() > 0);
            let callbacks: Vec<CallbackRc<T>> = inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect();
            (inner.value.clone(), callbacks)
        };

        trace!(channel:% = self.name, subscribers = callbacks.len(); "Notifying subscribers");
        for callback in &callbacks {
            callback(&value);
        }
    }
}

/// Guard keeping a channel subscriber registered.
///
/// Dropping the guard, or calling [`Subscription::unsubscribe`], removes the
/// callback; it is never called again.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    /// Removes the callback from its channel.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_subscribe_sees_current_value_immediately() {
        let channel = Channel::new(ChannelName::Callouts, vec![1, 2]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);

        let _sub = channel.subscribe(move |value: &Vec<i32>| seen_clone.borrow_mut().push(value.clone()));

        assert_eq!(*seen.borrow(), vec![vec![1, 2]]);
    }

    #[test]
    fn test_publish_always_notifies() {
        let channel = Channel::new(ChannelName::Widget, 5);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = channel.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        channel.publish(5);
        channel.publish(5);

        assert_eq!(count.get(), 3);
        assert_eq!(channel.get(), 5);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let channel = Channel::new(ChannelName::Widget, 0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let sub = channel.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        assert_eq!(channel.subscriber_count(), 1);

        sub.unsubscribe();
        channel.publish(1);

        assert_eq!(count.get(), 1);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_may_publish_elsewhere() {
        let source = Channel::new(ChannelName::HoveredCallout, 0);
        let mirror = Channel::new(ChannelName::SelectedCallout, 0);
        let mirror_clone = mirror.clone();
        let _sub = source.subscribe(move |value| mirror_clone.publish(*value * 10));

        source.publish(4);

        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn test_subscriber_may_read_own_channel() {
        let channel = Channel::new(ChannelName::Callouts, 1);
        let reader = channel.clone();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let _sub = channel.subscribe(move |_| seen_clone.set(reader.get()));

        channel.publish(9);
        assert_eq!(seen.get(), 9);
    }

    #[test]
    fn test_channel_names_round_trip_through_strings() {
        for name in ChannelName::ALL {
            assert_eq!(name.to_string().parse::<ChannelName>(), Ok(name));
        }
        assert_eq!(
            "hovered".parse::<ChannelName>(),
            Err(UnknownChannel("hovered".to_string()))
        );
    }
}
