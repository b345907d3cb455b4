//! Single-writer access to a chat session.
//!
//! The session lives on one tokio task that drains a queue of commands, so
//! overlapping sends are handled one after another instead of interleaving
//! their history appends.

use crate::session::{ChatError, ChatSession};
use shared::agent_api::Turn;
use tokio::sync::{mpsc, oneshot};

enum SessionCommand {
    Submit {
        text: String,
        done: oneshot::Sender<Result<(), ChatError>>,
    },
    Reset {
        done: oneshot::Sender<()>,
    },
    History {
        reply: oneshot::Sender<Vec<Turn>>,
    },
}

/// Cloneable handle to a running session task
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Move `session` onto its own task. Must be called inside a tokio runtime.
    pub fn spawn(session: ChatSession) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(session, rx));
        Self { tx }
    }

    /// Queue a user message and wait until it has been fully handled.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), ChatError> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(SessionCommand::Submit {
                text: text.into(),
                done,
            })
            .map_err(|_| ChatError::SessionClosed)?;
        wait.await.map_err(|_| ChatError::SessionClosed)?
    }

    /// Queue a "new chat". Messages queued earlier finish first.
    pub async fn reset(&self) -> Result<(), ChatError> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(SessionCommand::Reset { done })
            .map_err(|_| ChatError::SessionClosed)?;
        wait.await.map_err(|_| ChatError::SessionClosed)
    }

    /// Snapshot of the history once everything queued before it has run.
    pub async fn history(&self) -> Result<Vec<Turn>, ChatError> {
        let (reply, wait) = oneshot::channel();
        self.tx
            .send(SessionCommand::History { reply })
            .map_err(|_| ChatError::SessionClosed)?;
        wait.await.map_err(|_| ChatError::SessionClosed)
    }
}

async fn run(mut session: ChatSession, mut rx: mpsc::UnboundedReceiver<SessionCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Submit { text, done } => {
                let result = session.process_message(&text).await;
                let _ = done.send(result);
            }
            SessionCommand::Reset { done } => {
                session.reset();
                let _ = done.send(());
            }
            SessionCommand::History { reply } => {
                let _ = reply.send(session.history().to_vec());
            }
        }
    }
    tracing::debug!("chat session task finished");
}
