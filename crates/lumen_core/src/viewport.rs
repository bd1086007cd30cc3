//! Viewport and intersection observation
//!
//! [`Viewport`] models a vertically scrolling page: regions are laid out at a
//! fixed `top` with a `height`, and the viewport shows `height` pixels starting
//! at the current scroll offset. A region's visibility ratio is the fraction of
//! its height inside the viewport.
//!
//! Two kinds of listener are supported:
//! - intersection observers, notified with the new ratio whenever a region's
//!   ratio changes
//! - scroll listeners, notified with a [`ScrollEvent`] on every scroll
//!
//! Listeners are called with no internal borrow held, so they may scroll the
//! viewport, add regions, or register more listeners.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

new_key_type! {
    /// Unique identifier for a region
    pub struct RegionId;
    /// Unique identifier for an intersection observer
    pub struct ObserverId;
    /// Unique identifier for a scroll listener
    pub struct ScrollListenerId;
}

/// Returned by an intersection listener to keep or drop its observation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    Continue,
    Detach,
}

/// Called with a region's new visibility ratio
pub type IntersectionListener = Box<dyn FnMut(f32) -> Observation>;

/// Called on every scroll
pub type ScrollListener = Box<dyn FnMut(ScrollEvent)>;

/// Viewport observer capability
///
/// Reports a region's visibility ratio on demand and via notification.
pub trait IntersectionSource {
    /// Current ratio in `[0, 1]`, or `None` if the region is unknown
    fn ratio(&self, region: RegionId) -> Option<f32>;

    /// Register a listener for ratio changes on `region`
    ///
    /// Returns `None` if the region is unknown.
    fn observe(&self, region: RegionId, listener: IntersectionListener) -> Option<ObserverId>;

    /// Drop an observation. Returns `false` if it was already gone.
    fn unobserve(&self, id: ObserverId) -> bool;
}

/// State of the viewport after a scroll
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollEvent {
    pub scroll_y: f32,
    pub viewport_height: f32,
}

/// Vertical placement of a region on the page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub top: f32,
    pub height: f32,
}

impl Region {
    pub fn new(top: f32, height: f32) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    /// Distance from the viewport's top edge to the region's top edge
    pub fn client_top(&self, scroll_y: f32) -> f32 {
        self.top - scroll_y
    }

    /// Fraction of the region's height inside the viewport
    pub fn visible_ratio(&self, scroll_y: f32, viewport_height: f32) -> f32 {
        let view_bottom = scroll_y + viewport_height;
        if self.height <= 0.0 {
            // A zero-height region is either fully in view or not at all
            return if self.top >= scroll_y && self.top <= view_bottom {
                1.0
            } else {
                0.0
            };
        }
        let visible = (self.top + self.height).min(view_bottom) - self.top.max(scroll_y);
        (visible / self.height).clamp(0.0, 1.0)
    }
}

struct RegionNode {
    region: Region,
    ratio: f32,
    observers: SmallVec<[ObserverId; 4]>,
}

struct ObserverNode {
    region: RegionId,
    /// Taken out while the listener runs
    listener: Option<IntersectionListener>,
}

struct ViewportInner {
    height: f32,
    scroll_y: f32,
    regions: SlotMap<RegionId, RegionNode>,
    observers: SlotMap<ObserverId, ObserverNode>,
    scroll_listeners: SlotMap<ScrollListenerId, Option<ScrollListener>>,
}

impl ViewportInner {
    fn event(&self) -> ScrollEvent {
        ScrollEvent {
            scroll_y: self.scroll_y,
            viewport_height: self.height,
        }
    }

    /// Recompute ratios, returning the observers to notify
    fn refresh(&mut self) -> SmallVec<[(ObserverId, f32); 8]> {
        let (scroll_y, height) = (self.scroll_y, self.height);
        let mut changed = SmallVec::new();
        for (_, node) in self.regions.iter_mut() {
            let ratio = node.region.visible_ratio(scroll_y, height);
            if ratio != node.ratio {
                node.ratio = ratio;
                changed.extend(node.observers.iter().map(|&id| (id, ratio)));
            }
        }
        changed
    }

    fn remove_observer(&mut self, id: ObserverId) -> bool {
        match self.observers.remove(id) {
            Some(node) => {
                if let Some(region) = self.regions.get_mut(node.region) {
                    region.observers.retain(|observer| *observer != id);
                }
                true
            }
            None => false,
        }
    }
}

/// Geometric scroll model implementing [`IntersectionSource`]
///
/// Cheap to clone; clones share the same page.
///
/// ```ignore
/// let viewport = Viewport::new(800.0);
/// let skills = viewport.add_region(1200.0, 400.0);
/// viewport.scroll_to(600.0);
/// assert_eq!(viewport.ratio(skills), Some(0.5));
/// ```
#[derive(Clone)]
pub struct Viewport {
    inner: Rc<RefCell<ViewportInner>>,
}

impl Viewport {
    pub fn new(height: f32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ViewportInner {
                height: height.max(0.0),
                scroll_y: 0.0,
                regions: SlotMap::with_key(),
                observers: SlotMap::with_key(),
                scroll_listeners: SlotMap::with_key(),
            })),
        }
    }

    pub fn height(&self) -> f32 {
        self.inner.borrow().height
    }

    pub fn scroll_y(&self) -> f32 {
        self.inner.borrow().scroll_y
    }

    pub fn region_count(&self) -> usize {
        self.inner.borrow().regions.len()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Lay out a region on the page
    pub fn add_region(&self, top: f32, height: f32) -> RegionId {
        let mut inner = self.inner.borrow_mut();
        let region = Region::new(top, height);
        let ratio = region.visible_ratio(inner.scroll_y, inner.height);
        inner.regions.insert(RegionNode {
            region,
            ratio,
            observers: SmallVec::new(),
        })
    }

    /// Remove a region and every observation on it
    pub fn remove_region(&self, id: RegionId) -> Option<Region> {
        let mut inner = self.inner.borrow_mut();
        let node = inner.regions.remove(id)?;
        for observer in node.observers {
            inner.observers.remove(observer);
        }
        Some(node.region)
    }

    pub fn region(&self, id: RegionId) -> Option<Region> {
        self.inner.borrow().regions.get(id).map(|node| node.region)
    }

    /// Scroll to an absolute offset (clamped at zero)
    ///
    /// Notifies intersection observers whose region ratio changed, then every
    /// scroll listener.
    pub fn scroll_to(&self, scroll_y: f32) {
        let (event, changed) = {
            let mut inner = self.inner.borrow_mut();
            inner.scroll_y = scroll_y.max(0.0);
            (inner.event(), inner.refresh())
        };
        tracing::trace!(scroll_y = event.scroll_y, "viewport scrolled");

        for (id, ratio) in changed {
            self.notify(id, ratio);
        }
        self.emit_scroll(event);
    }

    pub fn scroll_by(&self, delta: f32) {
        let current = self.scroll_y();
        self.scroll_to(current + delta);
    }

    /// Resize the viewport, notifying observers whose ratio changed
    pub fn set_height(&self, height: f32) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            inner.height = height.max(0.0);
            inner.refresh()
        };
        for (id, ratio) in changed {
            self.notify(id, ratio);
        }
    }

    /// Register a listener called on every scroll
    pub fn on_scroll(&self, listener: ScrollListener) -> ScrollListenerId {
        self.inner
            .borrow_mut()
            .scroll_listeners
            .insert(Some(listener))
    }

    pub fn remove_scroll_listener(&self, id: ScrollListenerId) -> bool {
        self.inner.borrow_mut().scroll_listeners.remove(id).is_some()
    }

    fn notify(&self, id: ObserverId, ratio: f32) {
        let listener = self
            .inner
            .borrow_mut()
            .observers
            .get_mut(id)
            .and_then(|node| node.listener.take());
        let Some(mut listener) = listener else {
            return;
        };

        let control = listener(ratio);

        let mut inner = self.inner.borrow_mut();
        match control {
            Observation::Detach => {
                inner.remove_observer(id);
            }
            Observation::Continue => {
                // Unobserved while running: let the listener drop
                if let Some(node) = inner.observers.get_mut(id) {
                    node.listener = Some(listener);
                }
            }
        }
    }

    fn emit_scroll(&self, event: ScrollEvent) {
        let ids: SmallVec<[ScrollListenerId; 8]> =
            self.inner.borrow().scroll_listeners.keys().collect();

        for id in ids {
            let listener = self
                .inner
                .borrow_mut()
                .scroll_listeners
                .get_mut(id)
                .and_then(Option::take);
            let Some(mut listener) = listener else {
                continue;
            };

            listener(event);

            if let Some(slot) = self.inner.borrow_mut().scroll_listeners.get_mut(id) {
                *slot = Some(listener);
            }
        }
    }
}

impl IntersectionSource for Viewport {
    fn ratio(&self, region: RegionId) -> Option<f32> {
        self.inner.borrow().regions.get(region).map(|node| node.ratio)
    }

    fn observe(&self, region: RegionId, listener: IntersectionListener) -> Option<ObserverId> {
        let mut inner = self.inner.borrow_mut();
        if !inner.regions.contains_key(region) {
            return None;
        }
        let id = inner.observers.insert(ObserverNode {
            region,
            listener: Some(listener),
        });
        if let Some(node) = inner.regions.get_mut(region) {
            node.observers.push(id);
        }
        Some(id)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.inner.borrow_mut().remove_observer(id)
    }
}
