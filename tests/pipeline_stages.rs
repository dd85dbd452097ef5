//! Orchestrator tests over mock collaborators.
//!
//! Each mock records its calls so the tests can assert which stages ran,
//! not just what the final envelope says.
//!
//! The compositor is the one concrete stage here: it has no external
//! collaborator to inject a failure through, so its fatal path is covered by
//! the `PipelineError::Compose` mapping tests in `api::error` instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use debrief::document::DocumentCompositor;
use debrief::language::Language;
use debrief::notify::Notifier;
use debrief::pipeline::{
    PipelineError, PipelineOrchestrator, PipelineRequest, PipelineSettings,
};
use debrief::speech::SpeechToText;
use debrief::storage::ObjectStore;
use debrief::summarizer::SummarizationEngine;

#[derive(Default)]
struct MockSpeech {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl SpeechToText for MockSpeech {
    async fn transcribe(&self, _audio: &[u8], _language: Language) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("speech engine unreachable"));
        }
        Ok("We will finish the report by Friday. John will send the slides.".to_string())
    }
}

#[derive(Default)]
struct MockStore {
    puts: Mutex<Vec<(String, String)>>,
    presigns: AtomicUsize,
    fail_put: bool,
    fail_presign: bool,
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        _bytes: &[u8],
        _content_type: &str,
    ) -> Result<String> {
        if self.fail_put {
            return Err(anyhow!("connection refused"));
        }
        self.puts
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        Ok(key.to_string())
    }

    async fn presign(&self, bucket: &str, key: &str, _ttl_seconds: u64) -> Result<String> {
        self.presigns.fetch_add(1, Ordering::SeqCst);
        if self.fail_presign {
            return Err(anyhow!("presign unavailable"));
        }
        Ok(format!("http://store.local/{bucket}/{key}?sig=abc"))
    }
}

#[derive(Default)]
struct MockNotifier {
    sends: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(
        &self,
        to: &str,
        _subject: &str,
        _body: &str,
        _attachment: &[u8],
        _attachment_name: &str,
    ) -> Result<()> {
        self.sends.lock().unwrap().push(to.to_string());
        if self.fail {
            return Err(anyhow!("relay rejected delivery"));
        }
        Ok(())
    }
}

struct Harness {
    speech: Arc<MockSpeech>,
    store: Arc<MockStore>,
    notifier: Arc<MockNotifier>,
    orchestrator: PipelineOrchestrator,
}

fn harness(speech: MockSpeech, store: MockStore, notifier: MockNotifier) -> Harness {
    let speech = Arc::new(speech);
    let store = Arc::new(store);
    let notifier = Arc::new(notifier);
    let orchestrator = PipelineOrchestrator::new(
        speech.clone(),
        SummarizationEngine::new(None).unwrap(),
        DocumentCompositor::new(),
        store.clone(),
        notifier.clone(),
        PipelineSettings {
            audio_bucket: "meeting-audios".to_string(),
            pdf_bucket: "meeting-pdfs".to_string(),
            presign_ttl_seconds: 3600,
        },
    );
    Harness {
        speech,
        store,
        notifier,
        orchestrator,
    }
}

fn request(send_email: bool, email_to: Option<&str>) -> PipelineRequest {
    PipelineRequest {
        file_name: "standup.wav".to_string(),
        audio: vec![0u8; 16],
        language: "en".to_string(),
        send_email,
        email_to: email_to.map(str::to_string),
    }
}

#[tokio::test]
async fn full_pipeline_success() {
    let h = harness(MockSpeech::default(), MockStore::default(), MockNotifier::default());

    let result = h.orchestrator.run(request(false, None)).await.unwrap();

    assert_eq!(
        result.transcript,
        "We will finish the report by Friday. John will send the slides."
    );
    // Heuristic summarizer: both sentences in the summary, both matched as tasks.
    assert_eq!(result.summary, result.transcript);
    assert_eq!(
        result.tasks,
        "We will finish the report by Friday.\nJohn will send the slides."
    );
    assert_eq!(
        result.pdf_url.as_deref(),
        Some("http://store.local/meeting-pdfs/standup_summary.pdf?sig=abc")
    );
    assert!(!result.email_sent);
    assert!(result.email_error.is_none());

    let puts = h.store.puts.lock().unwrap();
    assert_eq!(
        *puts,
        vec![
            ("meeting-audios".to_string(), "standup.wav".to_string()),
            ("meeting-pdfs".to_string(), "standup_summary.pdf".to_string()),
        ]
    );
    assert!(h.notifier.sends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_language_rejected_before_transcribe() {
    let h = harness(MockSpeech::default(), MockStore::default(), MockNotifier::default());

    let mut req = request(false, None);
    req.language = "fr".to_string();
    let err = h.orchestrator.run(req).await.unwrap_err();

    assert!(matches!(err, PipelineError::UnsupportedLanguage(ref tag) if tag == "fr"));
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 0);
    assert!(h.store.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_recipient_fails_before_any_stage() {
    let h = harness(MockSpeech::default(), MockStore::default(), MockNotifier::default());

    let err = h.orchestrator.run(request(true, None)).await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingRecipient));

    // Nothing ran: no transcription, no storage, no delivery attempt.
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 0);
    assert!(h.store.puts.lock().unwrap().is_empty());
    assert!(h.notifier.sends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_recipient_counts_as_missing() {
    let h = harness(MockSpeech::default(), MockStore::default(), MockNotifier::default());

    let err = h.orchestrator.run(request(true, Some("   "))).await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingRecipient));
}

#[tokio::test]
async fn transcribe_failure_is_fatal_and_short_circuits() {
    let speech = MockSpeech {
        fail: true,
        ..Default::default()
    };
    let h = harness(speech, MockStore::default(), MockNotifier::default());

    let err = h.orchestrator.run(request(false, None)).await.unwrap_err();

    assert!(matches!(err, PipelineError::Transcription(_)));
    assert!(err.to_string().contains("speech engine unreachable"));
    assert!(h.store.puts.lock().unwrap().is_empty());
    assert_eq!(h.store.presigns.load(Ordering::SeqCst), 0);
    assert!(h.notifier.sends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_is_fatal() {
    let store = MockStore {
        fail_put: true,
        ..Default::default()
    };
    let h = harness(MockSpeech::default(), store, MockNotifier::default());

    let err = h.orchestrator.run(request(false, None)).await.unwrap_err();

    assert!(matches!(err, PipelineError::Store(_)));
    assert_eq!(h.store.presigns.load(Ordering::SeqCst), 0);
    assert!(h.notifier.sends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn presign_failure_degrades_to_null_url() {
    let store = MockStore {
        fail_presign: true,
        ..Default::default()
    };
    let h = harness(MockSpeech::default(), store, MockNotifier::default());

    let result = h
        .orchestrator
        .run(request(true, Some("ana@example.com")))
        .await
        .unwrap();

    // Overall success, no URL, and the notification still went out.
    assert!(result.pdf_url.is_none());
    assert!(result.email_sent);
    assert!(result.email_error.is_none());
    assert_eq!(*h.notifier.sends.lock().unwrap(), vec!["ana@example.com"]);
}

#[tokio::test]
async fn notify_failure_is_reported_inline() {
    let notifier = MockNotifier {
        fail: true,
        ..Default::default()
    };
    let h = harness(MockSpeech::default(), MockStore::default(), notifier);

    let result = h
        .orchestrator
        .run(request(true, Some("ana@example.com")))
        .await
        .unwrap();

    assert!(!result.email_sent);
    assert!(result
        .email_error
        .as_deref()
        .unwrap()
        .contains("relay rejected delivery"));
    // The rest of the envelope is intact.
    assert!(result.pdf_url.is_some());
    assert!(!result.transcript.is_empty());
}

#[tokio::test]
async fn notify_success_sets_email_sent() {
    let h = harness(MockSpeech::default(), MockStore::default(), MockNotifier::default());

    let result = h
        .orchestrator
        .run(request(true, Some("ana@example.com")))
        .await
        .unwrap();

    assert!(result.email_sent);
    assert!(result.email_error.is_none());
    assert_eq!(*h.notifier.sends.lock().unwrap(), vec!["ana@example.com"]);
}
