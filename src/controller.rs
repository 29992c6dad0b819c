use crate::client::{ChatError, ChatRequest, ChatTransport};
use crate::render::{RenderError, RenderedReply, Renderer};
use crate::session::{ConversationRole, Session, Turn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Instrument;

/// Shown in place of a reply when the request itself failed.
pub const NETWORK_FALLBACK: &str = "Sorry, I encountered an error. Please try again.";

/// Shown in place of a reply that arrived but could not be displayed.
pub const RENDER_FALLBACK: &str = "Error displaying message";

/// The UI collaborator the controller draws into.
pub trait ChatView: Send + Sync {
    fn show_user_message(&self, content: &str);
    fn show_reply(&self, reply: &RenderedReply);
    fn show_error(&self, message: &str);
    fn set_loading(&self, loading: bool);
}

/// What happened to one submitted input
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// Another request is still outstanding; nothing was sent.
    Busy,
    Replied(RenderedReply),
    /// The request failed; only the user turn was recorded.
    Failed(String),
    /// The reply could not be rendered; only the user turn was recorded.
    RenderFailed(String),
}

/// Clears the busy flag and hides the loading indicator when dropped.
struct InFlight<'a> {
    busy: &'a AtomicBool,
    view: &'a dyn ChatView,
    loading: bool,
}

impl InFlight<'_> {
    fn show_loading(&mut self) {
        self.view.set_loading(true);
        self.loading = true;
    }

    /// Hide the indicator before anything else is drawn in its place.
    fn hide_loading(&mut self) {
        if self.loading {
            self.view.set_loading(false);
            self.loading = false;
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.hide_loading();
        self.busy.store(false, Ordering::Release);
    }
}

/// Owns the session and drives one user turn at a time through
/// transport → renderer → view.
pub struct ChatController {
    session: Mutex<Session>,
    transport: Box<dyn ChatTransport>,
    renderer: Renderer,
    view: Arc<dyn ChatView>,
    busy: AtomicBool,
    next_request_id: AtomicU64,
}

impl ChatController {
    pub fn new(
        transport: Box<dyn ChatTransport>,
        renderer: Renderer,
        view: Arc<dyn ChatView>,
    ) -> Self {
        Self {
            session: Mutex::new(Session::new()),
            transport,
            renderer,
            view,
            busy: AtomicBool::new(false),
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Copy of the conversation so far.
    pub fn history(&self) -> Vec<Turn> {
        self.lock_session().snapshot()
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        // A poisoned lock only means a panic elsewhere; the turn log itself is still valid.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Single entry point for every input source.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let message = input.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("request already in flight, rejecting submit");
            return SubmitOutcome::Busy;
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let mut in_flight = InFlight {
            busy: &self.busy,
            view: self.view.as_ref(),
            loading: false,
        };

        self.view.show_user_message(message);
        let (session_id, history) = {
            let mut session = self.lock_session();
            session.append(ConversationRole::User, message);
            (session.id(), session.snapshot())
        };
        in_flight.show_loading();

        let span = tracing::info_span!("chat", %session_id, request_id);
        self.exchange(message, history, &mut in_flight)
            .instrument(span)
            .await
    }

    async fn exchange(
        &self,
        message: &str,
        history: Vec<Turn>,
        in_flight: &mut InFlight<'_>,
    ) -> SubmitOutcome {
        let request = ChatRequest::new(message, history);
        let raw = self.transport.send(&request).await;
        in_flight.hide_loading();

        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => return self.fail(e),
        };

        match self.renderer.render(&raw) {
            Ok(reply) => {
                self.lock_session()
                    .append(ConversationRole::Assistant, reply.message.clone());
                tracing::info!(products = reply.products.len(), "reply received");
                self.view.show_reply(&reply);
                SubmitOutcome::Replied(reply)
            }
            Err(e) => self.render_failed(e),
        }
    }

    fn fail(&self, error: ChatError) -> SubmitOutcome {
        tracing::error!(error = %error, "chat request failed");
        self.view.show_error(NETWORK_FALLBACK);
        SubmitOutcome::Failed(error.to_string())
    }

    fn render_failed(&self, error: RenderError) -> SubmitOutcome {
        tracing::error!(error = %error, "could not render reply");
        self.view.show_error(RENDER_FALLBACK);
        SubmitOutcome::RenderFailed(error.to_string())
    }
}
