//! Test doubles shared by the unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chatspeak_core::{SpeechEngine, SpeechEngineError, Utterance};

/// Engine double that records submissions and counts cancels/pauses.
///
/// An utterance keeps "speaking" until cancelled.
#[derive(Default)]
pub struct FakeEngine {
    pub spoken: Mutex<Vec<String>>,
    pub speaking: AtomicBool,
    pub cancels: AtomicUsize,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
}

impl FakeEngine {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl SpeechEngine for FakeEngine {
    fn submit(&self, utterance: &Utterance) -> Result<(), SpeechEngineError> {
        self.spoken.lock().unwrap().push(utterance.text.clone());
        self.speaking.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
    }
}
