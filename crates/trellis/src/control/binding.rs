//! Routing store events to control hooks.
//!
//! Every store event is queued, then delivered in emission order by
//! whichever caller holds the control's lock. An event that arrives while the
//! control is busy (a hook whose own writes fire the store again, or a
//! caller holding [`BoundControl::lock`]) waits in the queue until the lock
//! is released.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use trellis_core::logging::{span_names, targets};
use trellis_core::{ConnectionGuard, Result, StoreEvent};

use super::{OptionControl, RenderResult};
use crate::grid::GridLayout;

type PendingEvents = Arc<Mutex<VecDeque<StoreEvent>>>;

/// A live subscription from a control's store to its hooks.
///
/// The subscription holds the control weakly and ends when the binding is
/// dropped.
#[derive(Debug)]
pub struct ControlBinding {
    guard: ConnectionGuard<StoreEvent>,
    pending: PendingEvents,
}

impl ControlBinding {
    /// Subscribe `control` to its own store.
    pub fn attach<C>(control: &Arc<Mutex<C>>) -> Self
    where
        C: OptionControl + 'static,
    {
        let store = Arc::clone(control.lock().base().store());
        let pending = PendingEvents::default();
        let weak = Arc::downgrade(control);
        let queue = Arc::clone(&pending);
        let guard = store.changed().connect_scoped(move |event| {
            let Some(control) = weak.upgrade() else {
                return;
            };
            queue.lock().push_back(event.clone());
            flush_pending(&control, &queue);
        });
        Self { guard, pending }
    }

    /// Whether the subscription is still connected.
    pub fn is_attached(&self) -> bool {
        self.guard.is_connected()
    }

    /// Number of events waiting for the control's lock.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Deliver queued events, unless another caller holds the control.
    pub fn flush<C: OptionControl>(&self, control: &Mutex<C>) {
        flush_pending(control, &self.pending);
    }
}

fn flush_pending<C: OptionControl>(control: &Mutex<C>, pending: &Mutex<VecDeque<StoreEvent>>) {
    // Re-checked after each unlock: an event queued between the last drain
    // and the unlock would otherwise wait for the next one.
    while !pending.lock().is_empty() {
        let Some(mut control) = control.try_lock() else {
            tracing::trace!(target: targets::CONTROL, "control busy, deferring notification");
            return;
        };
        loop {
            let next = pending.lock().pop_front();
            let Some(event) = next else {
                break;
            };
            deliver(&mut *control, &event);
        }
    }
}

fn deliver<C: OptionControl>(control: &mut C, event: &StoreEvent) {
    let outcome = match event {
        StoreEvent::PropertyChanged { name } => control.on_property_changed(name),
        StoreEvent::OptionValueChanged { key, data } => {
            let _span = tracing::debug_span!(target: targets::CONTROL, span_names::SYNC).entered();
            control.on_option_value_changed(key, data)
        }
    };
    if let Err(err) = outcome {
        tracing::error!(target: targets::CONTROL, %err, ?event, "control hook failed");
    }
}

/// A control together with the binding that keeps it in sync.
///
/// Dropping it disconnects the store listener and the input listener.
pub struct BoundControl<C: OptionControl + 'static> {
    control: Arc<Mutex<C>>,
    binding: Option<ControlBinding>,
}

impl<C: OptionControl + 'static> BoundControl<C> {
    /// Take ownership of `control` and bind it to its store.
    pub fn new(control: C) -> Self {
        let control = Arc::new(Mutex::new(control));
        let binding = ControlBinding::attach(&control);
        Self {
            control,
            binding: Some(binding),
        }
    }

    /// The shared control.
    ///
    /// Events raised while the control is locked through this handle are
    /// delivered on the next [`flush`](Self::flush), render or store event.
    /// Prefer [`lock`](Self::lock), which flushes on release.
    pub fn control(&self) -> &Arc<Mutex<C>> {
        &self.control
    }

    /// Lock the control. Events queued meanwhile are delivered when the
    /// guard drops.
    pub fn lock(&self) -> ControlGuard<'_, C> {
        ControlGuard {
            guard: self.control.lock(),
            _flush: FlushOnRelease { bound: self },
        }
    }

    /// Deliver queued events now.
    pub fn flush(&self) {
        if let Some(binding) = &self.binding {
            binding.flush(&self.control);
        }
    }

    /// Number of events waiting for the control's lock.
    pub fn pending_count(&self) -> usize {
        self.binding.as_ref().map_or(0, ControlBinding::pending_count)
    }

    /// Render the control into `grid`.
    pub fn render(
        &self,
        grid: &mut dyn GridLayout,
        row: usize,
        column: usize,
    ) -> Result<RenderResult> {
        self.lock().on_render_to_grid(grid, row, column)
    }

    /// Whether the store subscription is live.
    pub fn is_attached(&self) -> bool {
        self.binding.as_ref().is_some_and(ControlBinding::is_attached)
    }

    /// Unsubscribe from the store and detach the rendered handles.
    ///
    /// Events still queued are dropped with the binding.
    pub fn teardown(&mut self) {
        if self.binding.take().is_some() {
            tracing::debug!(target: targets::CONTROL, "tearing down bound control");
        }
        self.control.lock().detach();
    }
}

impl<C: OptionControl + 'static> Drop for BoundControl<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<C: OptionControl + 'static> std::fmt::Debug for BoundControl<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundControl")
            .field("attached", &self.is_attached())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

/// Exclusive access to a bound control, returned by [`BoundControl::lock`].
pub struct ControlGuard<'a, C: OptionControl + 'static> {
    // Field order matters: the lock is released before the flush runs.
    guard: MutexGuard<'a, C>,
    _flush: FlushOnRelease<'a, C>,
}

struct FlushOnRelease<'a, C: OptionControl + 'static> {
    bound: &'a BoundControl<C>,
}

impl<C: OptionControl + 'static> Drop for FlushOnRelease<'_, C> {
    fn drop(&mut self) {
        self.bound.flush();
    }
}

impl<C: OptionControl + 'static> Deref for ControlGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.guard
    }
}

impl<C: OptionControl + 'static> DerefMut for ControlGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.guard
    }
}
