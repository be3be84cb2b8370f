//! Frame scheduling port.
//!
//! The scene asks a [`FrameScheduler`] for frames and the host calls back
//! with the handle when one fires. Every outstanding handle is tracked so
//! stopping cancels all of them, not just the most recent one.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    /// Called when the host has delivered `handle`.
    fn frame_fired(&mut self, _handle: FrameHandle) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

pub struct FrameTracker<S> {
    scheduler: S,
    pending: BTreeSet<FrameHandle>,
}

impl<S: FrameScheduler> FrameTracker<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            pending: BTreeSet::new(),
        }
    }

    pub fn request(&mut self) -> FrameHandle {
        let handle = self.scheduler.request_frame();
        self.pending.insert(handle);
        handle
    }

    /// Mark `handle` delivered. Returns false for handles that were never
    /// requested here or were already cancelled.
    pub fn fired(&mut self, handle: FrameHandle) -> bool {
        if !self.pending.remove(&handle) {
            return false;
        }
        self.scheduler.frame_fired(handle);
        true
    }

    /// Cancel every outstanding frame. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        for handle in &pending {
            self.scheduler.cancel_frame(*handle);
        }
        pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains(&handle)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

/// Start/stop state plus the tracked frames of one scene.
pub struct FrameLoop<S> {
    frames: FrameTracker<S>,
    state: RunState,
}

impl<S: FrameScheduler> FrameLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            frames: FrameTracker::new(scheduler),
            state: RunState::Stopped,
        }
    }

    /// Request the first frame. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.state == RunState::Running {
            return false;
        }
        self.state = RunState::Running;
        self.frames.request();
        true
    }

    /// Stop and cancel every outstanding frame. Returns how many were cancelled.
    pub fn stop(&mut self) -> usize {
        self.state = RunState::Stopped;
        self.frames.cancel_all()
    }

    /// Accept a fired handle. True when the caller should tick.
    pub fn begin_frame(&mut self, handle: FrameHandle) -> bool {
        self.frames.fired(handle) && self.state == RunState::Running
    }

    /// Ask for the next frame unless the tick stopped the loop.
    pub fn end_frame(&mut self) {
        if self.state == RunState::Running {
            self.frames.request();
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn pending_count(&self) -> usize {
        self.frames.pending_count()
    }

    pub fn scheduler(&self) -> &S {
        self.frames.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.frames.scheduler_mut()
    }
}

/// Scheduler driven by hand. Tests take the due handles and feed them back.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pending: Vec<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    /// Everything requested and not cancelled, oldest first.
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending)
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|h| *h != handle);
        self.cancelled.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_all_hits_every_handle() {
        let mut t = FrameTracker::new(ManualScheduler::new());
        t.request();
        t.request();
        t.request();
        assert_eq!(t.pending_count(), 3);
        assert_eq!(t.cancel_all(), 3);
        assert_eq!(t.pending_count(), 0);
        assert_eq!(t.scheduler().cancelled_count(), 3);
        assert!(t.scheduler().pending().is_empty());
    }

    #[test]
    fn fired_rejects_unknown_and_repeat() {
        let mut t = FrameTracker::new(ManualScheduler::new());
        let h = t.request();
        assert!(t.fired(h));
        assert!(!t.fired(h));
        assert!(!t.fired(FrameHandle(999)));
    }

    #[test]
    fn loop_rearms_only_while_running() {
        let mut l = FrameLoop::new(ManualScheduler::new());
        assert!(l.start());
        assert!(!l.start());
        let h = l.scheduler_mut().take_due()[0];
        assert!(l.begin_frame(h));
        l.end_frame();
        assert_eq!(l.pending_count(), 1);

        let h = l.scheduler_mut().take_due()[0];
        assert!(l.begin_frame(h));
        l.stop();
        l.end_frame();
        assert_eq!(l.pending_count(), 0);
        assert_eq!(l.state(), RunState::Stopped);
    }

    #[test]
    fn cancelled_handle_is_stale() {
        let mut t = FrameTracker::new(ManualScheduler::new());
        let h = t.request();
        t.cancel_all();
        assert!(!t.fired(h));
    }
}
