//! Integration tests for `LivenessMonitor` feeding a spawned narrator.
//!
//! The ambient source is a shared flag flipped by the test; tokio time is
//! paused so the 500ms silence window and 16ms sampling are exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chatspeak_core::{SoundPresence, Voice, VoiceConfig};
use chatspeak_narrator::{LivenessConfig, LivenessMonitor, Narrator, NarratorHandle, SilentEngine};
use tokio::sync::watch;
use tokio_test::assert_ok;

#[derive(Default)]
struct FlagSource {
    present: AtomicBool,
}

impl FlagSource {
    fn set(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }
}

impl SoundPresence for FlagSource {
    fn sound_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }
}

fn narrator() -> NarratorHandle {
    let (_config_tx, config_rx) = watch::channel(VoiceConfig::default());
    let (narrator, _events) = Narrator::new(Arc::new(SilentEngine), config_rx);
    let handle = narrator.spawn();
    assert_ok!(handle.set_voices(vec![Voice::new("urn:voice:test", "Test", "en-US")]));
    handle
}

async fn ambient_silence(narrator: &NarratorHandle) -> bool {
    narrator.snapshot().await.unwrap().ambient_silence
}

#[tokio::test(start_paused = true)]
async fn silence_is_debounced_and_sound_clears_it() {
    let source = Arc::new(FlagSource::default());
    source.set(true);
    let narrator = narrator();
    let monitor = LivenessMonitor::spawn(
        Ok(source.clone() as Arc<dyn SoundPresence>),
        narrator.clone(),
        LivenessConfig::default(),
    );
    assert!(monitor.is_active());

    tokio::time::sleep(Duration::from_millis(100)).await;
    source.set(false);

    // A short dip is not silence.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!ambient_silence(&narrator).await);
    source.set(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    source.set(false);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!ambient_silence(&narrator).await);

    // Past the window it is.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(ambient_silence(&narrator).await);

    // Sound resumes within a frame or two.
    source.set(true);
    tokio::time::sleep(Duration::from_millis(40)).await;
    let snapshot = narrator.snapshot().await.unwrap();
    assert!(!snapshot.ambient_silence);
    assert!(!snapshot.paused);

    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn monitor_exits_when_narrator_stops() {
    let source = Arc::new(FlagSource::default());
    source.set(true);
    let narrator = narrator();
    let monitor = LivenessMonitor::spawn(
        Ok(source.clone() as Arc<dyn SoundPresence>),
        narrator.clone(),
        LivenessConfig::default(),
    );

    assert_ok!(narrator.shutdown());
    source.set(false);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(!monitor.is_active());
}
