use palimpsest_core::identifier::CellId;

use super::{
    channel::{Channel, ChannelName, Subscription},
    model::{Callout, DiagramRef, InstanceRef, WidgetRef},
};
use crate::overlay::OverlayEntry;

/// The shared state of one diagram view.
///
/// Independent view fragments coordinate through these channels rather than
/// through references to each other. Cloning the hub yields handles to the
/// same channels.
#[derive(Debug, Clone)]
pub struct StateHub {
    selected_diagram: Channel<Option<DiagramRef>>,
    selected_instance: Channel<Option<InstanceRef>>,
    callouts: Channel<Vec<Callout>>,
    hovered_callout: Channel<Option<Callout>>,
    selected_callout: Channel<Option<Callout>>,
    overlay_data: Channel<Vec<OverlayEntry>>,
    widget: Channel<Option<WidgetRef>>,
}

impl Default for StateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHub {
    /// Creates a hub with every channel at its initial value.
    pub fn new() -> Self {
        Self {
            selected_diagram: Channel::new(ChannelName::SelectedDiagram, None),
            selected_instance: Channel::new(ChannelName::SelectedInstance, None),
            callouts: Channel::new(ChannelName::Callouts, Vec::new()),
            hovered_callout: Channel::new(ChannelName::HoveredCallout, None),
            selected_callout: Channel::new(ChannelName::SelectedCallout, None),
            overlay_data: Channel::new(ChannelName::OverlayData, Vec::new()),
            widget: Channel::new(ChannelName::Widget, None),
        }
    }

    pub fn selected_diagram(&self) -> &Channel<Option<DiagramRef>> {
        &self.selected_diagram
    }

    pub fn selected_instance(&self) -> &Channel<Option<InstanceRef>> {
        &self.selected_instance
    }

    pub fn callouts(&self) -> &Channel<Vec<Callout>> {
        &self.callouts
    }

    pub fn hovered_callout(&self) -> &Channel<Option<Callout>> {
        &self.hovered_callout
    }

    pub fn selected_callout(&self) -> &Channel<Option<Callout>> {
        &self.selected_callout
    }

    pub fn overlay_data(&self) -> &Channel<Vec<OverlayEntry>> {
        &self.overlay_data
    }

    pub fn widget(&self) -> &Channel<Option<WidgetRef>> {
        &self.widget
    }

    /// Calls `callback` with `name` every time that channel is published,
    /// without its value.
    ///
    /// Like [`Channel::subscribe`], the callback also runs once immediately.
    /// Callers that only know a channel by its front-end name can parse it
    /// into a [`ChannelName`] first.
    pub fn watch(&self, name: ChannelName, callback: impl Fn(ChannelName) + 'static) -> Subscription {
        match name {
            ChannelName::SelectedDiagram => self.selected_diagram.subscribe(move |_| callback(name)),
            ChannelName::SelectedInstance => self.selected_instance.subscribe(move |_| callback(name)),
            ChannelName::Callouts => self.callouts.subscribe(move |_| callback(name)),
            ChannelName::HoveredCallout => self.hovered_callout.subscribe(move |_| callback(name)),
            ChannelName::SelectedCallout => self.selected_callout.subscribe(move |_| callback(name)),
            ChannelName::OverlayData => self.overlay_data.subscribe(move |_| callback(name)),
            ChannelName::Widget => self.widget.subscribe(move |_| callback(name)),
        }
    }

    /// Returns the number of live subscribers of the named channel.
    pub fn subscriber_count(&self, name: ChannelName) -> usize {
        match name {
            ChannelName::SelectedDiagram => self.selected_diagram.subscriber_count(),
            ChannelName::SelectedInstance => self.selected_instance.subscriber_count(),
            ChannelName::Callouts => self.callouts.subscriber_count(),
            ChannelName::HoveredCallout => self.hovered_callout.subscriber_count(),
            ChannelName::SelectedCallout => self.selected_callout.subscriber_count(),
            ChannelName::OverlayData => self.overlay_data.subscriber_count(),
            ChannelName::Widget => self.widget.subscriber_count(),
        }
    }

    /// Returns `true` while an instance is selected.
    pub fn is_instance(&self) -> bool {
        self.selected_instance.with(Option::is_some)
    }

    /// Returns the callout attached to `cell_id`, if any.
    pub fn callout_for(&self, cell_id: CellId) -> Option<Callout> {
        self.callouts
            .with(|callouts| callouts.iter().find(|c| c.cell_id() == cell_id).cloned())
    }
}
