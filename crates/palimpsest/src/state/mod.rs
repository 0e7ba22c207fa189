//! Shared reactive state for a diagram view.
//!
//! A [`StateHub`] is a fixed set of named [`Channel`]s through which the
//! fragments of one diagram view (legend, callouts, hover highlight, instance
//! selector, overlay widget) coordinate. There is no global state: each view
//! owns its own hub.
//!
//! All of this is single-threaded; channels are `Rc`-based and not `Send`.

mod channel;
mod hub;
mod model;

pub use channel::{Channel, ChannelName, Subscription, UnknownChannel};
pub use hub::StateHub;
pub use model::{Callout, DiagramRef, InstanceRef, WidgetRef};
