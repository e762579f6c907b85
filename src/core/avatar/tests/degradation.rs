use std::sync::atomic::Ordering;
use std::time::Duration;

use super::helpers::{HarnessBuilder, active_harness};
use super::stubs::AttemptScript;
use crate::core::avatar::config::{AvatarSessionConfig, DegradationPolicy};
use crate::core::avatar::errors::AvatarError;
use crate::core::avatar::state::SessionPhase;

#[tokio::test]
async fn test_text_only_session_reports_ready() {
    let h = HarnessBuilder::new().build();

    h.session.enable_text_only_mode().unwrap();
    h.session.enable_text_only_mode().unwrap();

    let status = h.session.status();
    assert_eq!(status.phase, SessionPhase::TextOnly);
    assert!(status.is_ready);
    assert!(status.text_only);
    assert!(!status.is_active);
}

#[tokio::test]
async fn test_text_only_can_be_forbidden_by_policy() {
    let config = AvatarSessionConfig {
        degradation: DegradationPolicy {
            allow_text_only: false,
            auto_retry: true,
        },
        ..AvatarSessionConfig::default()
    };
    let h = HarnessBuilder::new().config(config).build();

    let err = h.session.enable_text_only_mode().unwrap_err();

    assert!(matches!(err, AvatarError::InvalidInput(_)));
    assert!(!h.session.is_text_only());
}

#[tokio::test(start_paused = true)]
async fn test_error_persists_without_auto_retry() {
    let config = AvatarSessionConfig {
        degradation: DegradationPolicy {
            allow_text_only: true,
            auto_retry: false,
        },
        ..AvatarSessionConfig::default()
    };
    let h = HarnessBuilder::new().config(config).build();
    h.credentials.fail_auth.store(true, Ordering::SeqCst);
    h.session.initialize().await.unwrap_err();

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(h.session.last_error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_successful_start_cancels_pending_reset() {
    let h = HarnessBuilder::new()
        .scripts(vec![AttemptScript::ConfirmByIce])
        .build();
    h.credentials.fail_auth.store(true, Ordering::SeqCst);
    h.session.initialize().await.unwrap_err();

    h.credentials.fail_auth.store(false, Ordering::SeqCst);
    h.session.initialize().await.unwrap();
    h.session.start_session(h.container.clone()).await.unwrap();
    assert!(h.session.last_error().is_none());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(h.session.is_active());
}

#[tokio::test]
async fn test_fallback_narrates_locally_without_session() {
    let h = HarnessBuilder::new().build();

    h.session.speak_with_fallback("We can begin now.").await.unwrap();

    assert_eq!(*h.narrator.spoken.lock(), vec!["We can begin now.".to_string()]);
    assert!(h.engine.spoken.lock().is_empty());
}

#[tokio::test]
async fn test_fallback_prefers_avatar_when_active() {
    let h = active_harness(HarnessBuilder::new()).await;

    h.session.speak_with_fallback("We can begin now.").await.unwrap();

    assert_eq!(h.engine.spoken_texts(), vec!["We can begin now."]);
    assert!(h.narrator.spoken.lock().is_empty());
    // Local narration is silenced before the avatar speaks.
    assert!(h.narrator.cancels.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_fallback_narrates_locally_in_text_only_mode() {
    let h = active_harness(HarnessBuilder::new()).await;
    h.session.enable_text_only_mode().unwrap();

    h.session.speak_with_fallback("Next question.").await.unwrap();

    assert_eq!(*h.narrator.spoken.lock(), vec!["Next question.".to_string()]);
    assert!(h.engine.spoken.lock().is_empty());
}

#[tokio::test]
async fn test_fallback_rejects_blank_text() {
    let h = HarnessBuilder::new().build();

    let err = h.session.speak_with_fallback(" ").await.unwrap_err();

    assert!(matches!(err, AvatarError::InvalidInput(_)));
    assert!(h.narrator.spoken.lock().is_empty());
}
