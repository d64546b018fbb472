//! Tick source for workout sessions.
//!
//! The session lives on one dedicated thread. Ticks and user controls are
//! both applied there, so they never interleave. While the session is paused
//! the thread blocks on the control channel and no ticks are produced.

use crate::session::{Session, SessionEvent, SessionOutcome};
use crate::{Error, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// User controls accepted by a running session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    TogglePause,
    Skip,
    Previous,
    Repeat,
    Exit,
}

/// Handle to a session running on its timer thread
pub struct SessionHandle {
    controls: Sender<Control>,
    worker: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Queue a control for the session thread
    pub fn send(&self, control: Control) -> Result<()> {
        self.controls
            .send(control)
            .map_err(|_| Error::State("session has already ended".into()))
    }

    /// Another sender, e.g. for an input thread
    pub fn sender(&self) -> Sender<Control> {
        self.controls.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the session to complete or be exited
    ///
    /// The handle's own sender is released first, so a session with no
    /// outstanding `sender()` clones ends as an exit.
    pub fn join(self) -> Result<SessionOutcome> {
        let SessionHandle { controls, worker } = self;
        // Once every other sender is gone the session sees a disconnect and exits
        drop(controls);
        worker
            .join()
            .map_err(|_| Error::State("session thread panicked".into()))
    }
}

/// Runs sessions against a fixed tick interval
pub struct SessionRunner {
    tick_interval: Duration,
}

impl SessionRunner {
    pub fn new(tick_interval: Duration) -> Self {
        Self { tick_interval }
    }

    /// Start `session` on its own thread
    ///
    /// `observer` sees every event together with the session it was applied to.
    /// Dropping every sender ends the session as an exit.
    pub fn spawn<F>(&self, session: Session, observer: F) -> Result<SessionHandle>
    where
        F: FnMut(&SessionEvent, &Session) + Send + 'static,
    {
        let (controls, inbox) = mpsc::channel();
        let interval = self.tick_interval;

        let worker = thread::Builder::new()
            .name("session-timer".into())
            .spawn(move || run(session, inbox, interval, observer))?;

        Ok(SessionHandle { controls, worker })
    }
}

fn run<F>(
    mut session: Session,
    inbox: Receiver<Control>,
    interval: Duration,
    mut observer: F,
) -> SessionOutcome
where
    F: FnMut(&SessionEvent, &Session),
{
    let mut deadline: Option<Instant> = None;

    loop {
        if let Some(outcome) = session.outcome() {
            tracing::debug!("Session thread finished: {:?}", outcome);
            return outcome;
        }

        let received = if session.is_running() {
            let due = *deadline.get_or_insert_with(|| Instant::now() + interval);
            match inbox.recv_timeout(due.saturating_duration_since(Instant::now())) {
                Ok(control) => Some(control),
                Err(RecvTimeoutError::Timeout) => {
                    let event = session.tick();
                    deadline = Some(due + interval);
                    observer(&event, &session);
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => None,
            }
        } else {
            // Suspended: wait for the next control without ticking
            inbox.recv().ok()
        };

        let event = match received {
            Some(control) => apply(&mut session, control),
            None => {
                tracing::debug!("All session controls dropped, exiting");
                session.exit()
            }
        };

        if !session.is_running() {
            deadline = None;
        }
        observer(&event, &session);
    }
}

fn apply(session: &mut Session, control: Control) -> SessionEvent {
    tracing::debug!("Applying {:?}", control);
    match control {
        Control::TogglePause => session.toggle_pause(),
        Control::Skip => session.skip(),
        Control::Previous => session.previous(),
        Control::Repeat => session.repeat(),
        Control::Exit => session.exit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyFocus, EnergyLevel, Equipment, Exercise, SpaceRequirement};
    use std::sync::{Arc, Mutex};

    fn exercise(id: &str, duration: u32) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.into(),
            duration_seconds: duration,
            reps: None,
            difficulty: 1,
            space_requirement: SpaceRequirement::Minimal,
            energy_level: EnergyLevel::Low,
            body_focus: BodyFocus::Cardio,
            equipment: Equipment::None,
            instructions: String::new(),
            rest_after_seconds: Some(1),
            form_tips: vec![],
            category: None,
        }
    }

    fn recording_runner() -> (SessionRunner, Arc<Mutex<Vec<SessionEvent>>>) {
        crate::logging::init_test();
        (
            SessionRunner::new(Duration::from_millis(1)),
            Arc::new(Mutex::new(Vec::new())),
        )
    }

    #[test]
    fn test_runs_to_completion_once_started() {
        let (runner, events) = recording_runner();
        let session = Session::new(vec![exercise("a", 3), exercise("b", 2)]).unwrap();

        let log = Arc::clone(&events);
        let handle = runner
            .spawn(session, move |event, _| log.lock().unwrap().push(event.clone()))
            .unwrap();
        let controls = handle.sender();
        handle.send(Control::TogglePause).unwrap();

        assert_eq!(handle.join().unwrap(), SessionOutcome::Completed);
        drop(controls);

        let events = events.lock().unwrap();
        assert_eq!(events.first(), Some(&SessionEvent::Resumed));
        assert_eq!(
            events.iter().filter(|e| **e == SessionEvent::Completed).count(),
            1
        );
        assert!(events.contains(&SessionEvent::RestStarted { index: 0, seconds: 1 }));
        assert!(events.contains(&SessionEvent::ExerciseStarted { index: 1, running: true }));
    }

    #[test]
    fn test_paused_session_does_not_tick() {
        let (runner, events) = recording_runner();
        let session = Session::new(vec![exercise("a", 2)]).unwrap();

        let log = Arc::clone(&events);
        let handle = runner
            .spawn(session, move |event, _| log.lock().unwrap().push(event.clone()))
            .unwrap();

        thread::sleep(Duration::from_millis(20));
        assert!(events.lock().unwrap().is_empty());
        assert!(!handle.is_finished());

        handle.send(Control::Exit).unwrap();
        assert_eq!(handle.join().unwrap(), SessionOutcome::Exited);
        assert_eq!(*events.lock().unwrap(), vec![SessionEvent::Exited]);
    }

    #[test]
    fn test_exit_mid_session_skips_completion() {
        let runner = SessionRunner::new(Duration::from_secs(60));
        let session = Session::new(vec![exercise("a", 30), exercise("b", 30)]).unwrap();

        let handle = runner
            .spawn(session, |event, _| assert_ne!(*event, SessionEvent::Completed))
            .unwrap();
        handle.send(Control::TogglePause).unwrap();
        handle.send(Control::Skip).unwrap();
        handle.send(Control::Exit).unwrap();

        assert_eq!(handle.join().unwrap(), SessionOutcome::Exited);
    }

    #[test]
    fn test_dropping_all_senders_exits_paused_session() {
        let (runner, events) = recording_runner();
        let session = Session::new(vec![exercise("a", 30)]).unwrap();

        let log = Arc::clone(&events);
        let handle = runner
            .spawn(session, move |event, _| log.lock().unwrap().push(event.clone()))
            .unwrap();
        drop(handle.sender());

        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = done_tx.send(handle.join());
        });

        let outcome = done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("join did not return while paused");
        assert_eq!(outcome.unwrap(), SessionOutcome::Exited);
        assert_eq!(*events.lock().unwrap(), vec![SessionEvent::Exited]);
    }

    #[test]
    fn test_dropping_all_senders_exits_running_session() {
        let runner = SessionRunner::new(Duration::from_secs(60));
        let session = Session::new(vec![exercise("a", 30)]).unwrap();

        let handle = runner.spawn(session, |_, _| {}).unwrap();
        let input = handle.sender();
        input.send(Control::TogglePause).unwrap();
        drop(input);

        assert_eq!(handle.join().unwrap(), SessionOutcome::Exited);
    }

    #[test]
    fn test_send_after_end_is_an_error() {
        let runner = SessionRunner::new(Duration::from_millis(1));
        let session = Session::new(vec![exercise("a", 1)]).unwrap();

        let handle = runner.spawn(session, |_, _| {}).unwrap();
        handle.send(Control::Exit).unwrap();
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }

        assert!(matches!(handle.send(Control::TogglePause), Err(Error::State(_))));
    }
}
