//! Tooltip popover controller.
//!
//! The popover is driven entirely by the host: it feeds pointer, click,
//! key and viewport events through [`Popover::handle`], calls
//! [`Popover::tick`] when [`Popover::next_deadline`] passes, and supplies
//! geometry through the [`Layout`] trait. The controller owns the single
//! popover node of a content root and is the only thing that mutates it.
//!
//! Timers follow the debouncer pattern: each pending action is an
//! `Instant` deadline that is replaced or cleared by the opposing event,
//! never a callback.

use std::time::Instant;

use kuchiki::NodeRef;

use crate::builders::TooltipDefinitions;
use crate::config::PopoverSettings;
use crate::dom;

/// Axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Visible area and its scroll offset within the page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// Geometry supplied by the host.
pub trait Layout {
    /// Bounding box of a trigger, relative to the viewport.
    fn trigger_rect(&self, trigger: &NodeRef) -> Rect;

    /// Rendered height of the popover with its current content, if the host
    /// can measure it.
    fn popover_height(&self, popover: &NodeRef) -> Option<f64>;

    fn viewport(&self) -> Viewport;
}

/// Index of a `.tooltip-ref` trigger within the content root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(usize);

impl TriggerId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverEvent {
    PointerEnter(TriggerId),
    PointerLeave(TriggerId),
    /// Pointer entered the popover itself.
    PopoverEnter,
    PopoverLeave,
    Click(TriggerId),
    /// Key pressed while a trigger has focus.
    TriggerKey(TriggerId, Key),
    /// Key pressed anywhere else in the document.
    DocumentKey(Key),
    /// Click outside both the popover and every trigger.
    OutsideClick,
    /// Scroll or resize.
    ViewportChanged,
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverState {
    Hidden,
    /// Hover intent registered; the popover opens at `at`.
    PendingShow { trigger: TriggerId, at: Instant },
    Visible { trigger: TriggerId },
    /// Still visible, closing at `at` unless the pointer comes back.
    PendingHide { trigger: TriggerId, at: Instant },
}

/// Where the popover goes, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    /// Shown above the trigger because there was no room below.
    pub above: bool,
}

/// Place a popover for a trigger.
///
/// Below the trigger by `offset`, horizontally clamped to the viewport with
/// `margin` on both sides, and flipped above when its bottom edge would
/// leave the viewport.
pub fn place(
    trigger: Rect,
    popover_height: Option<f64>,
    viewport: Viewport,
    settings: &PopoverSettings,
) -> Placement {
    let height = popover_height
        .filter(|height| *height > 0.0)
        .unwrap_or(settings.fallback_height);

    let mut left = trigger.left;
    if left + settings.width > viewport.width {
        left = viewport.width - settings.width - settings.margin;
    }
    if left < settings.margin {
        left = settings.margin;
    }

    let above = trigger.bottom() + settings.offset + height > viewport.height;
    let top = if above {
        trigger.top - height - settings.offset
    } else {
        trigger.bottom() + settings.offset
    };
    Placement {
        top: top + viewport.scroll_y,
        left: left + viewport.scroll_x,
        above,
    }
}

/// The popover of one content root.
#[derive(Debug)]
pub struct Popover {
    node: NodeRef,
    /// Keeps the page alive: click classification walks ancestors.
    _page: NodeRef,
    triggers: Vec<NodeRef>,
    definitions: TooltipDefinitions,
    settings: PopoverSettings,
    active: Option<TriggerId>,
    pending_show: Option<(TriggerId, Instant)>,
    pending_hide: Option<Instant>,
    reposition_at: Option<Instant>,
    focus_request: Option<TriggerId>,
}

impl Popover {
    pub fn new(
        node: NodeRef,
        triggers: Vec<NodeRef>,
        definitions: TooltipDefinitions,
        settings: PopoverSettings,
    ) -> Self {
        Self {
            _page: dom::top(&node),
            node,
            triggers,
            definitions,
            settings,
            active: None,
            pending_show: None,
            pending_hide: None,
            reposition_at: None,
            focus_request: None,
        }
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn trigger(&self, id: TriggerId) -> Option<&NodeRef> {
        self.triggers.get(id.0)
    }

    /// Trigger containing `node` (the trigger itself or one of its children).
    pub fn trigger_id(&self, node: &NodeRef) -> Option<TriggerId> {
        node.inclusive_ancestors()
            .find_map(|ancestor| self.triggers.iter().position(|t| *t == ancestor))
            .map(TriggerId)
    }

    /// Translate a click on `target` into an event. Clicks inside the
    /// popover produce nothing.
    pub fn click_event(&self, target: &NodeRef) -> Option<PopoverEvent> {
        if dom::is_inclusive_descendant(target, &self.node) {
            return None;
        }
        Some(
            self.trigger_id(target)
                .map_or(PopoverEvent::OutsideClick, PopoverEvent::Click),
        )
    }

    pub fn state(&self) -> PopoverState {
        match (self.active, self.pending_hide, self.pending_show) {
            (Some(trigger), Some(at), _) => PopoverState::PendingHide { trigger, at },
            (Some(trigger), None, _) => PopoverState::Visible { trigger },
            (None, _, Some((trigger, at))) => PopoverState::PendingShow { trigger, at },
            (None, _, None) => PopoverState::Hidden,
        }
    }

    /// Trigger the host should move focus back to, taken once.
    pub fn take_focus_request(&mut self) -> Option<TriggerId> {
        self.focus_request.take()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.pending_show.map(|(_, at)| at),
            self.pending_hide,
            self.reposition_at,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn handle(&mut self, event: PopoverEvent, now: Instant, layout: &dyn Layout) {
        match event {
            PopoverEvent::PointerEnter(trigger) if self.settings.hover => {
                if self.active == Some(trigger) {
                    self.pending_hide = None;
                    self.pending_show = None;
                } else {
                    self.pending_show = Some((trigger, now + self.settings.show_delay));
                }
            }
            PopoverEvent::PointerLeave(_) | PopoverEvent::PopoverLeave if self.settings.hover => {
                self.pending_show = None;
                self.arm_hide(now);
            }
            PopoverEvent::PopoverEnter if self.settings.hover => {
                self.pending_hide = None;
            }
            PopoverEvent::Click(trigger)
            | PopoverEvent::TriggerKey(trigger, Key::Enter | Key::Space) => {
                self.pending_show = None;
                if self.active == Some(trigger) {
                    self.hide();
                } else {
                    self.show(trigger, layout);
                }
            }
            PopoverEvent::TriggerKey(_, Key::Escape) | PopoverEvent::DocumentKey(Key::Escape) => {
                if let Some(trigger) = self.active {
                    self.hide();
                    self.focus_request = Some(trigger);
                }
            }
            PopoverEvent::OutsideClick => {
                if self.active.is_some() {
                    self.hide();
                }
            }
            PopoverEvent::ViewportChanged => {
                if self.active.is_some() {
                    self.reposition_at = Some(now + self.settings.reposition_debounce);
                }
            }
            _ => {}
        }
    }

    /// Fire every deadline that has passed.
    pub fn tick(&mut self, now: Instant, layout: &dyn Layout) {
        if let Some((trigger, at)) = self.pending_show
            && at <= now
        {
            self.pending_show = None;
            self.show(trigger, layout);
        }
        if self.pending_hide.is_some_and(|at| at <= now) {
            self.hide();
        }
        if self.reposition_at.is_some_and(|at| at <= now) {
            self.reposition_at = None;
            if let Some(trigger) = self.active {
                self.position(trigger, layout);
            }
        }
    }

    /// Start the hide delay unless one is already running.
    fn arm_hide(&mut self, now: Instant) {
        if self.active.is_some() && self.pending_hide.is_none() {
            self.pending_hide = Some(now + self.settings.hide_delay);
        }
    }

    fn show(&mut self, trigger: TriggerId, layout: &dyn Layout) {
        self.pending_hide = None;
        if self.active.is_some_and(|active| active != trigger) {
            self.hide();
        }
        let Some(node) = self.triggers.get(trigger.0) else {
            return;
        };
        let Some(html) = dom::attr(node, "data-tooltip-key")
            .and_then(|key| self.definitions.get(&key).map(str::to_owned))
            .filter(|html| !html.is_empty())
        else {
            tracing::debug!(trigger = trigger.0, "No tooltip content for trigger");
            return;
        };
        dom::add_class(node, "is-active");

        dom::replace_children(&self.node, dom::parse_fragment(&html));
        self.active = Some(trigger);
        self.position(trigger, layout);
        dom::add_class(&self.node, "is-active");
        tracing::trace!(trigger = trigger.0, "Popover shown");
    }

    fn hide(&mut self) {
        dom::remove_class(&self.node, "is-active");
        if let Some(node) = self.active.and_then(|active| self.triggers.get(active.0)) {
            dom::remove_class(node, "is-active");
        }
        self.active = None;
        self.pending_hide = None;
        self.reposition_at = None;
        tracing::trace!("Popover hidden");
    }

    fn position(&self, trigger: TriggerId, layout: &dyn Layout) {
        let Some(node) = self.triggers.get(trigger.0) else {
            return;
        };
        let placement = place(
            layout.trigger_rect(node),
            layout.popover_height(&self.node),
            layout.viewport(),
            &self.settings,
        );
        dom::set_style(
            &self.node,
            &[
                ("top", &format!("{}px", placement.top)),
                ("left", &format!("{}px", placement.left)),
            ],
        );
        if placement.above {
            dom::add_class(&self.node, "is-above");
        } else {
            dom::remove_class(&self.node, "is-above");
        }
    }
}
