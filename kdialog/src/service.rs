//! Dialog orchestration: load, compress, classify, respond, persist.

use std::sync::Arc;

use kcommon::{GenerationOptions, SessionId};
use kprovider::{
    ImageProvider, ImageRequest, ImageResponse, Message, NoopOperationHooks, ProviderError,
    ProviderOperationHooks, RetryPolicy, TextProvider, TextRequest, execute_with_retry,
};

use crate::context::{CompressionOutcome, CompressionPolicy, ContextManager};
use crate::{
    ChatRequest, ChatResponse, DialogError, DialogHooks, DialogState, InMemorySessionStore,
    Intent, KeywordMatch, NoopDialogHooks, ResetRequest, ResetResponse, SessionLocks,
    SessionStore, Transcript, Turn, TurnRole, compose_prompt,
};

pub const KIDOPEDIA_PERSONA: &str = "You are Kidopedia AI, a friendly, factually correct educational assistant for kids aged 7–12.\nKeep answers fun, simple, and true. If you don’t know something, say “I’m not sure, but I can find out!”.\nWhen summarizing, use short, cheerful sentences like: “Earlier we talked about how the Wright brothers built airplanes!”";

pub const NOTHING_TO_EDIT_NOTE: &str = "The child may be asking to change a picture, but no picture has been drawn in this conversation yet. Say so kindly and offer to draw one.";

pub const TEXT_FAILURE_REPLY: &str =
    "Sorry, I couldn't generate an answer right now. Try again later.";
pub const IMAGE_FAILURE_REPLY: &str =
    "Sorry, I couldn't draw that picture right now. Please try again.";
pub const EDIT_FAILURE_REPLY: &str = "Sorry, I couldn't edit the image right now. Please try again.";
pub const IMAGE_REPLY: &str = "Here’s your image! 🎨";
pub const EDIT_REPLY: &str = "Here’s your updated image! 🎨";

#[derive(Debug, Clone, PartialEq)]
pub struct DialogPolicy {
    pub persona: String,
    /// Empty uses the text provider's default model.
    pub text_model: String,
    /// Empty uses the image provider's default model.
    pub image_model: String,
    pub image_size: String,
    pub text_options: GenerationOptions,
    pub summary_options: GenerationOptions,
    /// Most recent non-system turns sent with a text request.
    pub context_window: usize,
    pub compression: CompressionPolicy,
    pub nothing_to_edit_note: String,
    pub text_failure_reply: String,
    pub image_failure_reply: String,
    pub edit_failure_reply: String,
    pub image_reply: String,
    pub edit_reply: String,
    pub retry: RetryPolicy,
}

impl Default for DialogPolicy {
    fn default() -> Self {
        Self {
            persona: KIDOPEDIA_PERSONA.to_string(),
            text_model: String::new(),
            image_model: String::new(),
            image_size: ImageRequest::DEFAULT_SIZE.to_string(),
            text_options: GenerationOptions::default()
                .with_temperature(0.4)
                .with_top_p(0.9),
            summary_options: GenerationOptions::default().with_temperature(0.5),
            context_window: 10,
            compression: CompressionPolicy::default(),
            nothing_to_edit_note: NOTHING_TO_EDIT_NOTE.to_string(),
            text_failure_reply: TEXT_FAILURE_REPLY.to_string(),
            image_failure_reply: IMAGE_FAILURE_REPLY.to_string(),
            edit_failure_reply: EDIT_FAILURE_REPLY.to_string(),
            image_reply: IMAGE_REPLY.to_string(),
            edit_reply: EDIT_REPLY.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct DialogService {
    text: Arc<dyn TextProvider>,
    image: Arc<dyn ImageProvider>,
    store: Arc<dyn SessionStore>,
    policy: Arc<DialogPolicy>,
    context: ContextManager,
    hooks: Arc<dyn DialogHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    locks: Arc<SessionLocks>,
}

impl DialogService {
    pub fn builder(
        text: Arc<dyn TextProvider>,
        image: Arc<dyn ImageProvider>,
    ) -> DialogServiceBuilder {
        DialogServiceBuilder::new(text, image)
    }

    pub fn policy(&self) -> &DialogPolicy {
        &self.policy
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DialogError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(DialogError::invalid_request("message must not be empty"));
        }

        let session_id = resolve_session_id(request.session_id.as_deref());
        let _guard = self.locks.acquire(&session_id).await;
        self.hooks.on_state(&session_id, DialogState::Received);

        let (transcript, persist) = match self.store.load(&session_id, &self.policy.persona).await
        {
            Ok(transcript) => (transcript, true),
            Err(error) => {
                // Skip the save so the stored history is not overwritten.
                self.hooks
                    .on_persistence_failure(&session_id, "load", &error);
                (Transcript::seeded(self.policy.persona.clone()), false)
            }
        };

        let mut transcript = self.compress(&session_id, transcript).await;
        transcript.push(Turn::user(message));

        let keywords = KeywordMatch::scan(message);
        let has_image = transcript.has_image();
        let intent = keywords.intent(has_image);
        self.hooks.on_intent(&session_id, intent);
        self.hooks.on_state(&session_id, DialogState::Classified);

        let (reply, image_url) = match intent {
            Intent::PlainText => {
                let note = keywords.nothing_to_edit(has_image);
                let reply = self.answer(&session_id, &transcript, note).await;
                transcript.push(Turn::assistant(reply.clone()));
                (reply, None)
            }
            Intent::NewImage | Intent::EditImage => {
                let prompt = compose_prompt(intent, message, &transcript)
                    .unwrap_or_else(|| message.to_string());
                let (reply, turn) = self.illustrate(&session_id, intent, prompt).await;
                let image_url = turn.image_url().map(str::to_string);
                transcript.push(turn);
                (reply, image_url)
            }
        };
        self.hooks.on_state(&session_id, DialogState::Responded);

        if persist
            && let Err(error) = self.store.save_transcript(&session_id, &transcript).await
        {
            self.hooks
                .on_persistence_failure(&session_id, "save", &error);
        }
        self.hooks.on_state(&session_id, DialogState::Persisted);

        Ok(ChatResponse {
            reply,
            image_url,
            conversation: transcript,
            session_id: session_id.into_string(),
        })
    }

    pub async fn reset(&self, request: ResetRequest) -> Result<ResetResponse, DialogError> {
        let session_id = SessionId::new(request.session_id.trim());
        if session_id.is_blank() {
            return Err(DialogError::invalid_request("session_id must not be empty"));
        }

        let _guard = self.locks.acquire(&session_id).await;
        self.store.reset(&session_id).await?;
        self.hooks.on_reset(&session_id);

        Ok(ResetResponse {
            message: format!("Conversation history reset for {session_id}."),
        })
    }

    async fn compress(&self, session_id: &SessionId, transcript: Transcript) -> Transcript {
        let before = transcript.len();
        let (transcript, outcome) = self
            .context
            .compress(transcript, |rendered| self.summarize(rendered))
            .await;

        match outcome {
            CompressionOutcome::Unchanged => {}
            CompressionOutcome::Summarized { .. } => {
                self.hooks
                    .on_compression(session_id, before, transcript.len(), true);
            }
            CompressionOutcome::Fallback { error, .. } => {
                self.hooks.on_fallback(session_id, "summarize", &error);
                self.hooks
                    .on_compression(session_id, before, transcript.len(), false);
            }
        }

        transcript
    }

    async fn summarize(&self, rendered: String) -> Result<String, ProviderError> {
        let request = TextRequest::builder(self.policy.text_model.clone())
            .messages(ContextManager::summary_messages(
                &self.policy.persona,
                rendered,
            ))
            .options(self.policy.summary_options)
            .build()?;

        self.complete_text("summarize", request).await
    }

    async fn answer(
        &self,
        session_id: &SessionId,
        transcript: &Transcript,
        nothing_to_edit: bool,
    ) -> String {
        let outcome = match self.text_request(transcript, nothing_to_edit) {
            Ok(request) => self.complete_text("chat", request).await,
            Err(error) => Err(error),
        };

        outcome.unwrap_or_else(|error| {
            self.hooks.on_fallback(session_id, "chat", &error);
            self.policy.text_failure_reply.clone()
        })
    }

    /// Persona, then any leading summary, then the recent non-system turns.
    fn text_request(
        &self,
        transcript: &Transcript,
        nothing_to_edit: bool,
    ) -> Result<TextRequest, ProviderError> {
        let mut messages = vec![Message::system(self.policy.persona.clone())];

        if let Some(summary) = transcript.first().filter(|turn| turn.is_summary()) {
            messages.push(Message::system(summary.content.clone()));
        }

        if nothing_to_edit {
            messages.push(Message::system(self.policy.nothing_to_edit_note.clone()));
        }

        let recent: Vec<&Turn> = transcript
            .turns()
            .iter()
            .filter(|turn| turn.role != TurnRole::System)
            .collect();
        let skip = recent.len().saturating_sub(self.policy.context_window);
        messages.extend(recent.into_iter().skip(skip).map(turn_message));

        TextRequest::builder(self.policy.text_model.clone())
            .messages(messages)
            .options(self.policy.text_options)
            .build()
    }

    async fn complete_text(
        &self,
        operation: &str,
        request: TextRequest,
    ) -> Result<String, ProviderError> {
        let response = execute_with_retry(
            self.text.id(),
            operation,
            &self.policy.retry,
            self.provider_hooks.as_ref(),
            |_| self.text.complete(request.clone()),
            futures_timer::Delay::new,
        )
        .await?;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(ProviderError::empty_response("text reply was empty"));
        }

        Ok(content.to_string())
    }

    /// Draws or redraws a picture, returning the reply and the assistant turn to append.
    async fn illustrate(
        &self,
        session_id: &SessionId,
        intent: Intent,
        prompt: String,
    ) -> (String, Turn) {
        let (operation, success_reply, failure_reply) = match intent {
            Intent::EditImage => (
                "edit",
                &self.policy.edit_reply,
                &self.policy.edit_failure_reply,
            ),
            _ => (
                "image",
                &self.policy.image_reply,
                &self.policy.image_failure_reply,
            ),
        };

        match self.generate_image(operation, prompt.clone()).await {
            Ok(response) => (
                success_reply.clone(),
                Turn::assistant_image(success_reply.clone(), response.url, prompt),
            ),
            Err(error) => {
                self.hooks.on_fallback(session_id, operation, &error);
                (failure_reply.clone(), Turn::assistant(failure_reply.clone()))
            }
        }
    }

    async fn generate_image(
        &self,
        operation: &str,
        prompt: String,
    ) -> Result<ImageResponse, ProviderError> {
        let request = ImageRequest::new(prompt)
            .with_model(self.policy.image_model.clone())
            .with_size(self.policy.image_size.clone());

        let response = execute_with_retry(
            self.image.id(),
            operation,
            &self.policy.retry,
            self.provider_hooks.as_ref(),
            |_| self.image.generate(request.clone()),
            futures_timer::Delay::new,
        )
        .await?;

        if response.url.trim().is_empty() {
            return Err(ProviderError::empty_response("image url was empty"));
        }

        Ok(response)
    }
}

fn turn_message(turn: &Turn) -> Message {
    match turn.role {
        TurnRole::System => Message::system(turn.content.clone()),
        TurnRole::User => Message::user(turn.content.clone()),
        TurnRole::Assistant => Message::assistant(turn.content.clone()),
    }
}

fn resolve_session_id(requested: Option<&str>) -> SessionId {
    match requested.map(str::trim) {
        Some(value) if !value.is_empty() => SessionId::new(value),
        _ => SessionId::new(uuid::Uuid::new_v4().to_string()),
    }
}

pub struct DialogServiceBuilder {
    text: Arc<dyn TextProvider>,
    image: Arc<dyn ImageProvider>,
    store: Arc<dyn SessionStore>,
    policy: DialogPolicy,
    hooks: Arc<dyn DialogHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
}

impl DialogServiceBuilder {
    pub fn new(text: Arc<dyn TextProvider>, image: Arc<dyn ImageProvider>) -> Self {
        Self {
            text,
            image,
            store: Arc::new(InMemorySessionStore::new()),
            policy: DialogPolicy::default(),
            hooks: Arc::new(NoopDialogHooks),
            provider_hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn policy(mut self, policy: DialogPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn DialogHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = hooks;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.policy.retry = retry;
        self
    }

    pub fn build(self) -> DialogService {
        DialogService {
            text: self.text,
            image: self.image,
            store: self.store,
            context: ContextManager::new(self.policy.compression.clone()),
            policy: Arc::new(self.policy),
            hooks: self.hooks,
            provider_hooks: self.provider_hooks,
            locks: Arc::new(SessionLocks::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use kprovider::{
        ImageResponse, ProviderFuture, ProviderId, Role, StopReason, TextResponse, TokenUsage,
    };

    use super::*;
    use crate::DialogErrorKind;

    #[derive(Default)]
    struct ScriptedText {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        requests: Mutex<Vec<TextRequest>>,
    }

    impl ScriptedText {
        fn with(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextProvider for ScriptedText {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }

        fn complete<'a>(
            &'a self,
            request: TextRequest,
        ) -> ProviderFuture<'a, Result<TextResponse, ProviderError>> {
            Box::pin(async move {
                self.requests.lock().expect("requests lock").push(request);
                let next = self
                    .replies
                    .lock()
                    .expect("replies lock")
                    .pop_front()
                    .unwrap_or_else(|| Ok("default answer".to_string()));

                next.map(|content| TextResponse {
                    provider: ProviderId::OpenAi,
                    model: "gpt-4o-mini".to_string(),
                    content,
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                })
            })
        }
    }

    #[derive(Default)]
    struct RecordingImage {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    impl ImageProvider for RecordingImage {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }

        fn generate<'a>(
            &'a self,
            request: ImageRequest,
        ) -> ProviderFuture<'a, Result<ImageResponse, ProviderError>> {
            Box::pin(async move {
                let mut prompts = self.prompts.lock().expect("prompts lock");
                prompts.push(request.prompt);
                if self.fail {
                    return Err(ProviderError::unavailable("image backend down"));
                }

                Ok(ImageResponse {
                    provider: ProviderId::OpenAi,
                    model: "dall-e-3".to_string(),
                    url: format!("https://img.example/{}.png", prompts.len()),
                    revised_prompt: None,
                })
            })
        }
    }

    fn service(text: Arc<ScriptedText>, image: Arc<RecordingImage>) -> DialogService {
        DialogService::builder(text, image)
            .retry_policy(RetryPolicy {
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(1),
                ..RetryPolicy::default()
            })
            .build()
    }

    #[tokio::test]
    async fn plain_text_chat_sends_persona_and_history() {
        let text = Arc::new(ScriptedText::with(vec![Ok("The sky scatters blue light.".into())]));
        let service = service(text.clone(), Arc::new(RecordingImage::default()));

        let response = service
            .chat(ChatRequest::new("  Why is the sky blue?  ").with_session_id("kid-1"))
            .await
            .expect("chat should succeed");

        assert_eq!(response.reply, "The sky scatters blue light.");
        assert_eq!(response.image_url, None);
        assert_eq!(response.session_id, "kid-1");
        assert_eq!(response.conversation.len(), 3);
        assert_eq!(response.conversation.turns()[1].content, "Why is the sky blue?");

        let requests = text.requests.lock().expect("requests lock");
        let sent = &requests[0];
        assert_eq!(sent.messages[0].role, Role::System);
        assert_eq!(sent.messages[0].content, KIDOPEDIA_PERSONA);
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.options.temperature, Some(0.4));
        assert_eq!(sent.options.top_p, Some(0.9));
    }

    #[tokio::test]
    async fn blank_messages_are_rejected_without_side_effects() {
        let text = Arc::new(ScriptedText::default());
        let service = service(text.clone(), Arc::new(RecordingImage::default()));

        let error = service
            .chat(ChatRequest::new("   ").with_session_id("kid-1"))
            .await
            .expect_err("blank message must fail");

        assert_eq!(error.kind, DialogErrorKind::InvalidRequest);
        assert!(text.requests.lock().expect("requests lock").is_empty());
    }

    #[tokio::test]
    async fn missing_session_id_is_generated() {
        let service = service(
            Arc::new(ScriptedText::default()),
            Arc::new(RecordingImage::default()),
        );

        let response = service
            .chat(ChatRequest::new("hello"))
            .await
            .expect("chat should succeed");

        assert!(uuid::Uuid::parse_str(&response.session_id).is_ok());
    }

    #[tokio::test]
    async fn image_then_edit_chains_prompts() {
        let image = Arc::new(RecordingImage::default());
        let service = service(Arc::new(ScriptedText::default()), image.clone());

        let drawn = service
            .chat(ChatRequest::new("draw a cat").with_session_id("kid-2"))
            .await
            .expect("draw should succeed");
        assert_eq!(drawn.reply, IMAGE_REPLY);
        assert_eq!(drawn.image_url.as_deref(), Some("https://img.example/1.png"));

        let edited = service
            .chat(ChatRequest::new("Make It Purple").with_session_id("kid-2"))
            .await
            .expect("edit should succeed");
        assert_eq!(edited.reply, EDIT_REPLY);
        assert_eq!(edited.image_url.as_deref(), Some("https://img.example/2.png"));

        let prompts = image.prompts.lock().expect("prompts lock").clone();
        assert_eq!(prompts, vec!["draw a cat", "draw a cat, but now make it purple"]);

        let last = edited.conversation.last().expect("assistant turn");
        assert_eq!(last.image_prompt(), Some("draw a cat, but now make it purple"));
        assert_eq!(edited.conversation.len(), 5);
    }

    #[tokio::test]
    async fn image_failure_falls_back_to_apology() {
        let image = Arc::new(RecordingImage {
            fail: true,
            ..RecordingImage::default()
        });
        let service = service(Arc::new(ScriptedText::default()), image);

        let response = service
            .chat(ChatRequest::new("show me a dinosaur").with_session_id("kid-3"))
            .await
            .expect("chat still succeeds");

        assert_eq!(response.reply, IMAGE_FAILURE_REPLY);
        assert_eq!(response.image_url, None);
        let last = response.conversation.last().expect("assistant turn");
        assert_eq!(last.role, TurnRole::Assistant);
        assert!(last.image().is_none());
    }

    #[tokio::test]
    async fn edit_without_picture_answers_with_note() {
        let text = Arc::new(ScriptedText::with(vec![Ok(
            "I haven't drawn anything yet. Want me to draw something?".into(),
        )]));
        let image = Arc::new(RecordingImage::default());
        let service = service(text.clone(), image.clone());

        let response = service
            .chat(ChatRequest::new("make it blue").with_session_id("kid-4"))
            .await
            .expect("chat should succeed");

        assert_eq!(response.image_url, None);
        assert!(image.prompts.lock().expect("prompts lock").is_empty());

        let requests = text.requests.lock().expect("requests lock");
        assert!(
            requests[0]
                .messages
                .iter()
                .any(|message| message.content == NOTHING_TO_EDIT_NOTE)
        );
    }

    #[tokio::test]
    async fn rate_limited_text_is_retried_then_falls_back() {
        let text = Arc::new(ScriptedText::with(vec![
            Err(ProviderError::rate_limited("429")),
            Err(ProviderError::rate_limited("429")),
            Err(ProviderError::rate_limited("429")),
        ]));
        let service = service(text.clone(), Arc::new(RecordingImage::default()));

        let response = service
            .chat(ChatRequest::new("tell me about owls").with_session_id("kid-5"))
            .await
            .expect("chat still succeeds");

        assert_eq!(response.reply, TEXT_FAILURE_REPLY);
        assert_eq!(text.requests.lock().expect("requests lock").len(), 3);
    }

    #[tokio::test]
    async fn non_rate_limited_failures_are_not_retried() {
        let text = Arc::new(ScriptedText::with(vec![Err(ProviderError::authentication(
            "bad key",
        ))]));
        let service = service(text.clone(), Arc::new(RecordingImage::default()));

        let response = service
            .chat(ChatRequest::new("tell me about owls").with_session_id("kid-6"))
            .await
            .expect("chat still succeeds");

        assert_eq!(response.reply, TEXT_FAILURE_REPLY);
        assert_eq!(text.requests.lock().expect("requests lock").len(), 1);
    }

    #[tokio::test]
    async fn reset_rejects_blank_ids_and_is_idempotent() {
        let service = service(
            Arc::new(ScriptedText::default()),
            Arc::new(RecordingImage::default()),
        );

        let error = service
            .reset(ResetRequest::new(" "))
            .await
            .expect_err("blank id must fail");
        assert_eq!(error.kind, DialogErrorKind::InvalidRequest);

        for _ in 0..2 {
            let response = service
                .reset(ResetRequest::new("never-used"))
                .await
                .expect("reset should succeed");
            assert_eq!(
                response.message,
                "Conversation history reset for never-used."
            );
        }
    }

    #[test]
    fn text_request_includes_leading_summary_and_recent_window() {
        let service = service(
            Arc::new(ScriptedText::default()),
            Arc::new(RecordingImage::default()),
        );
        let mut turns = vec![Turn::summary("Earlier we talked about bees!")];
        for index in 0..14 {
            turns.push(Turn::user(format!("q{index}")));
        }
        let transcript = Transcript::from_turns(turns);

        let request = service
            .text_request(&transcript, false)
            .expect("request should build");

        assert_eq!(request.messages.len(), 12);
        assert_eq!(request.messages[1], Message::system("Earlier we talked about bees!"));
        assert_eq!(request.messages[2], Message::user("q4"));
        assert_eq!(request.messages[11], Message::user("q13"));
    }

    #[test]
    fn text_request_does_not_resend_a_stale_persona() {
        let service = service(
            Arc::new(ScriptedText::default()),
            Arc::new(RecordingImage::default()),
        );
        let transcript = Transcript::from_turns(vec![
            Turn::system("An older persona."),
            Turn::user("why is the sky blue?"),
        ]);

        let request = service
            .text_request(&transcript, false)
            .expect("request should build");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0], Message::system(service.policy.persona.clone()));
        assert_eq!(request.messages[1], Message::user("why is the sky blue?"));
    }
}
