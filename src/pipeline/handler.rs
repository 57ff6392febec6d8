//! Email capture handler — extract an email address, then persist it.
//!
//! Flow per invocation:
//! 1. Ask the extraction capability for the email address in the message
//! 2. Log the outcome
//! 3. If the result is non-empty, update the activity record with it
//!
//! Failures from either capability propagate unchanged. There is no retry
//! and no fallback value.

use tracing::info;

use crate::capabilities::ActivityPatch;
use crate::context::InvocationContext;
use crate::error::HandlerError;
use crate::pipeline::types::{Event, MessageLocator};

/// Instruction sent to the extraction capability on every invocation.
pub const EXTRACT_EMAIL_INSTRUCTION: &str = "Extract the email address from the given message";

/// Event handler that copies an email address from a message into the
/// current activity record.
#[derive(Debug, Clone, Default)]
pub struct EmailCaptureHandler {
    locator: MessageLocator,
}

impl EmailCaptureHandler {
    pub fn new(locator: MessageLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &MessageLocator {
        &self.locator
    }

    /// Handle one event.
    ///
    /// Calls `update` at most once, and only after extraction returned a
    /// non-empty value.
    pub async fn handle(
        &self,
        event: &Event,
        ctx: &InvocationContext,
    ) -> Result<(), HandlerError> {
        let message = event.message(&self.locator);

        let email = ctx
            .extractor
            .ask(EXTRACT_EMAIL_INSTRUCTION, &message)
            .await?;

        info!(
            invocation_id = %ctx.invocation_id,
            email = email.as_deref().unwrap_or(""),
            found = email.as_ref().is_some_and(|e| !e.is_empty()),
            "Email extraction finished"
        );

        if let Some(email) = email.filter(|e| !e.is_empty()) {
            ctx.updater.update(&ActivityPatch::email(email)).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::capabilities::{ActivityUpdater, Extractor};
    use crate::error::{ExtractionError, UpdateError};

    type Journal = Arc<Mutex<Vec<String>>>;
    type AskFn = Box<dyn Fn() -> Result<Option<String>, ExtractionError> + Send + Sync>;
    type UpdateFn = Box<dyn Fn() -> Result<(), UpdateError> + Send + Sync>;

    /// Extractor that records what it was asked and replies from a script.
    struct ScriptedExtractor {
        journal: Journal,
        asked: Mutex<Vec<(String, String)>>,
        respond: AskFn,
    }

    #[async_trait]
    impl Extractor for ScriptedExtractor {
        async fn ask(
            &self,
            instruction: &str,
            message: &str,
        ) -> Result<Option<String>, ExtractionError> {
            self.journal.lock().unwrap().push("ask:start".into());
            self.asked
                .lock()
                .unwrap()
                .push((instruction.to_string(), message.to_string()));
            tokio::task::yield_now().await;
            let result = (self.respond)();
            self.journal.lock().unwrap().push("ask:end".into());
            result
        }
    }

    /// Updater that records every patch it receives.
    struct RecordingUpdater {
        journal: Journal,
        patches: Mutex<Vec<ActivityPatch>>,
        respond: UpdateFn,
    }

    #[async_trait]
    impl ActivityUpdater for RecordingUpdater {
        async fn update(&self, patch: &ActivityPatch) -> Result<(), UpdateError> {
            self.journal.lock().unwrap().push("update".into());
            self.patches.lock().unwrap().push(patch.clone());
            (self.respond)()
        }
    }

    struct Harness {
        journal: Journal,
        extractor: Arc<ScriptedExtractor>,
        updater: Arc<RecordingUpdater>,
        ctx: InvocationContext,
    }

    fn harness(
        ask: impl Fn() -> Result<Option<String>, ExtractionError> + Send + Sync + 'static,
        update: impl Fn() -> Result<(), UpdateError> + Send + Sync + 'static,
    ) -> Harness {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let extractor = Arc::new(ScriptedExtractor {
            journal: Arc::clone(&journal),
            asked: Mutex::new(Vec::new()),
            respond: Box::new(ask),
        });
        let updater = Arc::new(RecordingUpdater {
            journal: Arc::clone(&journal),
            patches: Mutex::new(Vec::new()),
            respond: Box::new(update),
        });
        let ctx = InvocationContext::new(extractor.clone(), updater.clone());
        Harness {
            journal,
            extractor,
            updater,
            ctx,
        }
    }

    fn found(
        email: &'static str,
    ) -> impl Fn() -> Result<Option<String>, ExtractionError> + Send + Sync + 'static {
        move || Ok(Some(email.to_string()))
    }

    fn ok_update() -> Result<(), UpdateError> {
        Ok(())
    }

    #[tokio::test]
    async fn non_empty_extraction_updates_once() {
        let h = harness(found("jane@example.com"), ok_update);
        let event = Event::with_message("Contact me at jane@example.com for details.");

        EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap();

        let patches = h.updater.patches.lock().unwrap();
        assert_eq!(patches.as_slice(), &[ActivityPatch::email("jane@example.com")]);
    }

    #[tokio::test]
    async fn sends_fixed_instruction_and_message() {
        let h = harness(found("jane@example.com"), ok_update);
        let event = Event::with_message("Contact me at jane@example.com for details.");

        EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap();

        let asked = h.extractor.asked.lock().unwrap();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].0, EXTRACT_EMAIL_INSTRUCTION);
        assert_eq!(asked[0].1, "Contact me at jane@example.com for details.");
    }

    #[tokio::test]
    async fn empty_extraction_skips_update() {
        let h = harness(|| Ok(Some(String::new())), ok_update);
        let event = Event::with_message("Please call me, no email here.");

        EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap();

        assert!(h.updater.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn absent_extraction_skips_update() {
        let h = harness(|| Ok(None), ok_update);
        let event = Event::with_message("Please call me, no email here.");

        EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap();

        assert!(h.updater.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_only_value_still_passes_guard() {
        // Only emptiness is checked; the value is not validated.
        let h = harness(|| Ok(Some(" ".to_string())), ok_update);
        let event = Event::with_message("...");

        EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap();

        assert_eq!(h.updater.patches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn extraction_failure_propagates_without_update() {
        let h = harness(
            || {
                Err(ExtractionError::Timeout {
                    after: Duration::from_secs(30),
                })
            },
            ok_update,
        );
        let event = Event::with_message("Contact me at jane@example.com for details.");

        let err = EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap_err();

        match err {
            HandlerError::Extraction(ExtractionError::Timeout { after }) => {
                assert_eq!(after, Duration::from_secs(30));
            }
            other => panic!("Expected extraction timeout, got {:?}", other),
        }
        assert!(h.updater.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_failure_propagates_after_one_attempt() {
        let h = harness(found("bob@example.org"), || {
            Err(UpdateError::Validation {
                reason: "email rejected".into(),
            })
        });
        let event = Event::with_message("I'm bob@example.org");

        let err = EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap_err();

        match err {
            HandlerError::Update(UpdateError::Validation { reason }) => {
                assert_eq!(reason, "email rejected");
            }
            other => panic!("Expected update validation error, got {:?}", other),
        }
        let patches = h.updater.patches.lock().unwrap();
        assert_eq!(patches.as_slice(), &[ActivityPatch::email("bob@example.org")]);
    }

    #[tokio::test]
    async fn update_waits_for_extraction() {
        let h = harness(found("jane@example.com"), ok_update);
        let event = Event::with_message("jane@example.com");

        EmailCaptureHandler::default()
            .handle(&event, &h.ctx)
            .await
            .unwrap();

        let journal = h.journal.lock().unwrap();
        assert_eq!(journal.as_slice(), &["ask:start", "ask:end", "update"]);
    }

    #[tokio::test]
    async fn repeated_invocations_are_not_deduplicated() {
        let h = harness(found("jane@example.com"), ok_update);
        let handler = EmailCaptureHandler::default();
        let event = Event::with_message("jane@example.com");

        handler.handle(&event, &h.ctx).await.unwrap();
        handler.handle(&event, &h.ctx).await.unwrap();

        assert_eq!(h.updater.patches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn custom_locator_feeds_extractor() {
        let h = harness(|| Ok(None), ok_update);
        let handler = EmailCaptureHandler::new(MessageLocator::pointer("/call/transcript"));
        let event =
            Event::from_json(r#"{"call": {"transcript": "write to me at x@y.io"}}"#).unwrap();

        handler.handle(&event, &h.ctx).await.unwrap();

        let asked = h.extractor.asked.lock().unwrap();
        assert_eq!(asked[0].1, "write to me at x@y.io");
    }
}
