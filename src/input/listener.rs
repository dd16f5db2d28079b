//! Global keyboard/mouse listener
//!
//! `device_query` only exposes snapshots of the currently held keys and
//! buttons, so the listener thread polls at a short fixed interval and
//! turns snapshot differences into press/release [`InputEvent`]s that are
//! handed to an [`InputSink`].

use super::{keymap, InputAction, InputEvent, InputIdentifier, InputSink};
use crate::error::ListenerError;
use device_query::{DeviceQuery, DeviceState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between device snapshots
pub const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// How long `start` waits for the platform backend to come up
const STARTUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Tracks held inputs between snapshots and reports the changes
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    held: Vec<InputIdentifier>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare a new snapshot against the previous one
    ///
    /// Presses are reported before releases, each in snapshot order.
    pub fn update(&mut self, current: Vec<InputIdentifier>, now: Instant) -> Vec<InputEvent> {
        let mut current = current;
        current.dedup();
        let mut events = Vec::new();

        for input in &current {
            if !self.held.contains(input) {
                events.push(InputEvent::new(*input, InputAction::Press, now));
            }
        }

        for input in &self.held {
            if !current.contains(input) {
                events.push(InputEvent::new(*input, InputAction::Release, now));
            }
        }

        self.held = current;
        events
    }

    /// Inputs currently held down
    pub fn held(&self) -> &[InputIdentifier] {
        &self.held
    }
}

/// Read one snapshot of held keys and mouse buttons
fn snapshot(device: &DeviceState) -> Vec<InputIdentifier> {
    let mut held: Vec<InputIdentifier> = device
        .get_keys()
        .into_iter()
        .filter_map(keymap::from_keycode)
        .collect();

    let mouse = device.get_mouse();
    for (slot, pressed) in mouse.button_pressed.iter().enumerate() {
        if *pressed {
            if let Some(button) = keymap::mouse_button_at(slot) {
                held.push(InputIdentifier::Mouse(button));
            }
        }
    }

    // LShift + RShift both map to SHIFT
    let mut unique = Vec::with_capacity(held.len());
    for input in held {
        if !unique.contains(&input) {
            unique.push(input);
        }
    }
    unique
}

/// Running listener thread
struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Listener lifecycle: start, stop, idempotent restart
pub struct InputListener {
    sink: Arc<dyn InputSink>,
    worker: Option<Worker>,
}

impl InputListener {
    pub fn new(sink: Arc<dyn InputSink>) -> Self {
        Self { sink, worker: None }
    }

    /// Whether a listener thread is alive
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|w| !w.handle.is_finished())
            .unwrap_or(false)
    }

    /// Start listening if not already running
    pub fn start(&mut self) -> Result<(), ListenerError> {
        if self.is_running() {
            return Ok(());
        }
        self.stop();

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), ListenerError>>();
        let sink = Arc::clone(&self.sink);
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("input-listener".to_string())
            .spawn(move || {
                // Created on this thread: some backends are not Send
                let device = match DeviceState::checked_new() {
                    Some(device) => device,
                    None => {
                        let _ = ready_tx.send(Err(ListenerError::PermissionDenied));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                log::debug!("input listener polling every {:?}", POLL_INTERVAL);

                let mut tracker = SnapshotTracker::new();
                while !thread_stop.load(Ordering::Acquire) {
                    let now = Instant::now();
                    for event in tracker.update(snapshot(&device), now) {
                        sink.on_input(&event);
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                log::debug!("input listener stopped");
            })?;

        match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(())) => {
                self.worker = Some(Worker { stop, handle });
                log::info!("input listener started");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                stop.store(true, Ordering::Release);
                Err(ListenerError::StartupTimeout(STARTUP_TIMEOUT))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ListenerError::ThreadDied),
        }
    }

    /// Stop the current listener (no-op if none) and start a fresh one
    pub fn restart(&mut self) -> Result<(), ListenerError> {
        if self.is_running() {
            return Ok(());
        }
        self.stop();
        self.start()
    }

    /// Stop and join the listener thread
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            if worker.handle.join().is_err() {
                log::warn!("input listener thread panicked");
            }
        }
    }
}

impl Drop for InputListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseButton, SpecialKey};

    const A: InputIdentifier = InputIdentifier::Char('a');
    const F1: InputIdentifier = InputIdentifier::Special(SpecialKey::F1);
    const LMB: InputIdentifier = InputIdentifier::Mouse(MouseButton::Left);

    #[test]
    fn new_inputs_are_presses() {
        let mut tracker = SnapshotTracker::new();
        let events = tracker.update(vec![A, LMB], Instant::now());
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_press()));
        assert_eq!(tracker.held(), &[A, LMB]);
    }

    #[test]
    fn held_inputs_produce_no_repeats() {
        let mut tracker = SnapshotTracker::new();
        tracker.update(vec![F1], Instant::now());
        assert!(tracker.update(vec![F1], Instant::now()).is_empty());
        assert!(tracker.update(vec![F1], Instant::now()).is_empty());
    }

    #[test]
    fn missing_inputs_are_releases() {
        let mut tracker = SnapshotTracker::new();
        tracker.update(vec![A, F1], Instant::now());
        let events = tracker.update(vec![F1], Instant::now());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].input, A);
        assert!(events[0].is_release());
    }

    #[test]
    fn presses_come_before_releases() {
        let mut tracker = SnapshotTracker::new();
        tracker.update(vec![A], Instant::now());
        let events = tracker.update(vec![LMB], Instant::now());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].input, LMB);
        assert!(events[0].is_press());
        assert_eq!(events[1].input, A);
        assert!(events[1].is_release());
    }
}
