use browzai_persist::ConversationStore;
use browzai_types::{Message, MessageId, Role, User};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::decoder::Utf8ChunkDecoder;
use crate::endpoint::{ChunkStream, StreamEndpoint, StreamPrompt};
use crate::error::ConsumerError;
use crate::transient::TransientState;
use crate::view::ChatView;

/// Notification shown for any failed submission
pub const ERROR_NOTICE: &str = "Error creating chat. Please try again";

/// Pause before transient state is cleared, leaving the view time to refresh
pub const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank prompt; nothing was sent
    Ignored,
    Completed {
        conversation_id: String,
        assistant_message: Message,
        created_conversation: bool,
    },
}

/// Returns the session to `Idle` when a submission finishes or is dropped
struct SubmissionGuard<'a> {
    state: &'a Mutex<SubmissionState>,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = SubmissionState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One chat surface: submits prompts and relays streamed replies
///
/// At most one submission runs at a time. Transient state belongs to the
/// session and is only touched from the submission that owns the guard.
pub struct ChatSession {
    user: User,
    conversation_id: Mutex<Option<String>>,
    endpoint: Arc<dyn StreamEndpoint>,
    store: Arc<dyn ConversationStore>,
    view: Arc<dyn ChatView>,
    transient: Mutex<TransientState>,
    state: Mutex<SubmissionState>,
    cleanup_delay: Duration,
}

impl ChatSession {
    pub fn new(
        user: User,
        endpoint: Arc<dyn StreamEndpoint>,
        store: Arc<dyn ConversationStore>,
        view: Arc<dyn ChatView>,
    ) -> Self {
        Self {
            user,
            conversation_id: Mutex::new(None),
            endpoint,
            store,
            view,
            transient: Mutex::new(TransientState::new()),
            state: Mutex::new(SubmissionState::Idle),
            cleanup_delay: DEFAULT_CLEANUP_DELAY,
        }
    }

    /// Continue an existing conversation instead of creating one
    pub fn with_conversation(self, conversation_id: impl Into<String>) -> Self {
        *lock(&self.conversation_id) = Some(conversation_id.into());
        self
    }

    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }

    pub fn state(&self) -> SubmissionState {
        *lock(&self.state)
    }

    pub fn conversation_id(&self) -> Option<String> {
        lock(&self.conversation_id).clone()
    }

    pub fn transient_messages(&self) -> Vec<Message> {
        lock(&self.transient).messages().to_vec()
    }

    /// Send a prompt and relay the streamed reply
    ///
    /// Blank prompts are ignored. On failure the user is notified, the echoed
    /// prompt is rolled back and the error is returned; nothing is retried.
    pub async fn submit(&self, prompt: &str) -> Result<SubmitOutcome, ConsumerError> {
        if prompt.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        let _guard = self.begin()?;

        let existing = self.conversation_id();
        let echo = Message::transient_user(existing.clone(), prompt);
        let echo_id = echo.id.clone();
        self.update_transient(|t| t.push(echo));

        let result = self.run(prompt, existing).await;

        if let Err(e) = &result {
            tracing::warn!(user_id = %self.user.id, "Submission failed: {}", e);
            self.view.notify_error(ERROR_NOTICE);
            self.rollback(&echo_id);
        }

        self.cleanup().await;
        result
    }

    fn begin(&self) -> Result<SubmissionGuard<'_>, ConsumerError> {
        let mut state = lock(&self.state);
        if *state == SubmissionState::Submitting {
            return Err(ConsumerError::SubmissionInFlight);
        }
        *state = SubmissionState::Submitting;
        Ok(SubmissionGuard { state: &self.state })
    }

    async fn run(
        &self,
        prompt: &str,
        existing: Option<String>,
    ) -> Result<SubmitOutcome, ConsumerError> {
        let (conversation_id, created_conversation) = match existing {
            Some(id) => {
                self.store
                    .add_message(&id, &self.user.id, Role::User, prompt)
                    .await?;
                (id, false)
            }
            None => {
                let created = self.store.create_conversation(&self.user.id, prompt).await?;
                let id = created.conversation.id;
                *lock(&self.conversation_id) = Some(id.clone());
                (id, true)
            }
        };

        let chunks = self
            .endpoint
            .open(&StreamPrompt {
                message: prompt.to_string(),
                instructions: self.user.instructions.clone(),
            })
            .await?;

        let final_text = self.read_reply(chunks, &conversation_id).await?;

        let assistant_message = self
            .store
            .save_assistant_message(&conversation_id, &self.user.id, &final_text)
            .await?;
        tracing::debug!(
            %conversation_id,
            chars = final_text.chars().count(),
            "Assistant reply saved"
        );

        if created_conversation {
            self.view.navigate(&conversation_id).await?;
        } else {
            self.view.refresh(&conversation_id).await?;
        }

        Ok(SubmitOutcome::Completed {
            conversation_id,
            assistant_message,
            created_conversation,
        })
    }

    /// Read the stream to its end, returning the full reply text
    ///
    /// The transient assistant entry appears with the first non-empty chunk.
    async fn read_reply(
        &self,
        mut chunks: ChunkStream,
        conversation_id: &str,
    ) -> Result<String, ConsumerError> {
        let conversation = Some(conversation_id.to_string());
        let mut decoder = Utf8ChunkDecoder::new();
        let mut accumulated = String::new();

        while let Some(chunk) = chunks.next().await {
            let text = decoder.decode(&chunk?);
            if text.is_empty() {
                continue;
            }
            accumulated.push_str(&text);
            self.update_transient(|t| t.set_assistant(conversation.clone(), &accumulated));
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            accumulated.push_str(&tail);
            self.update_transient(|t| t.set_assistant(conversation.clone(), &accumulated));
        }

        Ok(accumulated)
    }

    fn rollback(&self, echo_id: &MessageId) {
        let mut transient = lock(&self.transient);
        if transient.remove(echo_id) {
            self.view.render(transient.messages());
        }
    }

    async fn cleanup(&self) {
        tokio::time::sleep(self.cleanup_delay).await;

        let mut transient = lock(&self.transient);
        if transient.clear() {
            self.view.render(transient.messages());
        }
    }

    fn update_transient(&self, update: impl FnOnce(&mut TransientState)) {
        let mut transient = lock(&self.transient);
        update(&mut transient);
        self.view.render(transient.messages());
    }
}
