//! End-to-end configuration flow: JSON file store → `ConfigService` → subscribers.

use std::sync::Arc;

use chatspeak_core::{
    ConfigService, ConfigStore, CoreError, JsonFileConfigStore, VoiceConfig, VoiceConfigUpdate,
};
use tempfile::tempdir;
use tokio_test::assert_ok;

#[tokio::test]
async fn missing_file_starts_from_defaults() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonFileConfigStore::new(dir.path().join("voice.json")));

    let service = ConfigService::load(store).await.unwrap();

    assert_eq!(service.current(), VoiceConfig::default());
}

#[tokio::test]
async fn update_persists_and_notifies_subscribers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs").join("voice.json");
    let store = Arc::new(JsonFileConfigStore::new(&path));
    let service = ConfigService::load(store.clone()).await.unwrap();
    let mut rx = service.subscribe();

    let updated = service
        .update(VoiceConfigUpdate {
            voice_type: Some("urn:voice:anna".to_string()),
            delay: Some(1.5),
            ..VoiceConfigUpdate::default()
        })
        .await
        .unwrap();

    assert_ok!(rx.changed().await);
    assert_eq!(*rx.borrow_and_update(), updated);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"voiceType\": \"urn:voice:anna\""), "{raw}");
    assert!(raw.contains("\"delay\": 1.5"), "{raw}");

    let reloaded = store.load().await.unwrap();
    assert_eq!(reloaded, updated);
}

#[tokio::test]
async fn invalid_update_is_neither_saved_nor_published() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("voice.json");
    let store = Arc::new(JsonFileConfigStore::new(&path));
    let service = ConfigService::load(store).await.unwrap();
    let rx = service.subscribe();

    let result = service
        .update(VoiceConfigUpdate {
            rate: Some(0.0),
            ..VoiceConfigUpdate::default()
        })
        .await;

    assert!(matches!(result, Err(CoreError::Config(_))));
    assert!(!path.exists());
    assert!(!rx.has_changed().unwrap());
    assert_eq!(service.current(), VoiceConfig::default());
}

#[tokio::test]
async fn partial_file_fills_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("voice.json");
    std::fs::write(&path, r#"{"voiceType":"en-GB","emojisEnabled":false}"#).unwrap();

    let service = ConfigService::load(Arc::new(JsonFileConfigStore::new(&path)))
        .await
        .unwrap();
    let config = service.current();

    assert_eq!(config.voice_type, "en-GB");
    assert!(!config.emojis_enabled);
    assert!((config.rate - 1.0).abs() < f32::EPSILON);
    assert!(config.delay.abs() < f32::EPSILON);
}

#[tokio::test]
async fn corrupt_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("voice.json");
    std::fs::write(&path, "not json").unwrap();
    let store = Arc::new(JsonFileConfigStore::new(&path));

    assert!(ConfigService::load(store.clone()).await.is_err());

    let service = ConfigService::load_or_default(store).await;
    assert_eq!(service.current(), VoiceConfig::default());
}
