//! Cooperative engine loop
//!
//! One tokio task owns the engine and handles host events, commands and timer
//! firings one at a time. Callers talk to it through a cloneable
//! [`RuntimeHandle`].

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use tabmind_tabs::{Clock, TabEvent};

use crate::commands::{Command, CommandResult};
use crate::engine::TabMind;
use crate::error::CoreError;
use crate::Result;

/// Clock that follows tokio time, so paused-time tests move it too
#[derive(Debug)]
pub struct TokioClock {
    origin: DateTime<Utc>,
    started: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            started: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin + elapsed
    }
}

enum Message {
    Event(TabEvent),
    Command(Command, oneshot::Sender<CommandResult<Value>>),
    Shutdown(oneshot::Sender<usize>),
}

pub struct Runtime;

impl Runtime {
    /// Move an initialized engine onto its own task. The task hands the
    /// engine back when it stops.
    pub fn spawn(engine: TabMind) -> (RuntimeHandle, JoinHandle<TabMind>) {
        let (inbox, messages) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(engine, messages));
        (RuntimeHandle { inbox }, task)
    }
}

#[derive(Clone)]
pub struct RuntimeHandle {
    inbox: mpsc::UnboundedSender<Message>,
}

impl RuntimeHandle {
    /// Queue a host event. Events are applied in the order they are sent.
    pub fn dispatch_event(&self, event: TabEvent) -> Result<()> {
        self.inbox
            .send(Message::Event(event))
            .map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn execute(&self, command: Command) -> Result<CommandResult<Value>> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(Message::Command(command, reply))
            .map_err(|_| CoreError::RuntimeClosed)?;
        response.await.map_err(|_| CoreError::RuntimeClosed)
    }

    /// Stop the loop, cancelling pending idle timers. Returns how many were
    /// cancelled.
    pub async fn shutdown(&self) -> Result<usize> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(Message::Shutdown(reply))
            .map_err(|_| CoreError::RuntimeClosed)?;
        response.await.map_err(|_| CoreError::RuntimeClosed)
    }
}

async fn run(mut engine: TabMind, mut messages: mpsc::UnboundedReceiver<Message>) -> TabMind {
    tracing::info!("Engine loop started");

    loop {
        let deadline = engine.next_deadline();
        let wait = deadline
            .and_then(|at| (at - engine.now()).to_std().ok())
            .unwrap_or(Duration::ZERO);

        tokio::select! {
            message = messages.recv() => match message {
                Some(Message::Event(event)) => {
                    if let Err(e) = engine.handle_event(event) {
                        tracing::warn!(error = %e, "Failed to handle tab event");
                    }
                }
                Some(Message::Command(command, reply)) => {
                    let _ = reply.send(engine.execute(command));
                }
                Some(Message::Shutdown(reply)) => {
                    let _ = reply.send(engine.shutdown());
                    break;
                }
                None => {
                    engine.shutdown();
                    break;
                }
            },
            _ = tokio::time::sleep(wait), if deadline.is_some() => {
                let suspended = engine.fire_due_timers();
                if !suspended.is_empty() {
                    tracing::debug!(count = suspended.len(), "Idle timers fired");
                }
            }
        }
    }

    tracing::info!("Engine loop stopped");
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tabmind_storage::MemoryStore;
    use tabmind_tabs::{placeholder_url, TabDirectory, TabManager};

    const MINUTE: Duration = Duration::from_secs(60);

    fn spawn_engine() -> (Arc<TabManager>, RuntimeHandle, JoinHandle<TabMind>) {
        let tabs = Arc::new(TabManager::new());
        let mut engine = TabMind::new(
            Arc::new(MemoryStore::new()),
            tabs.clone(),
            Arc::new(TokioClock::new()),
        );
        engine.initialize().unwrap();

        let (handle, task) = Runtime::spawn(engine);
        (tabs, handle, task)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_tab_suspended_after_delay() {
        let (tabs, handle, _task) = spawn_engine();
        let tab = tabs.open("https://example.com/article", "Article");

        handle
            .dispatch_event(TabEvent::Updated {
                tab: tab.clone(),
                complete: true,
            })
            .unwrap();
        // Round trip so the event is applied before time moves
        handle.execute(Command::GetTabs).await.unwrap();

        tokio::time::sleep(29 * MINUTE).await;
        assert_eq!(tabs.get(tab.id).unwrap().url, "https://example.com/article");

        tokio::time::sleep(2 * MINUTE).await;
        assert_eq!(tabs.get(tab.id).unwrap().url, placeholder_url(tab.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_cancels_timer() {
        let (tabs, handle, _task) = spawn_engine();
        let tab = tabs.open("https://example.com", "Example");

        handle
            .dispatch_event(TabEvent::Updated {
                tab: tab.clone(),
                complete: true,
            })
            .unwrap();
        tokio::time::sleep(10 * MINUTE).await;

        tabs.activate(tab.id).unwrap();
        handle
            .dispatch_event(TabEvent::Activated { tab_id: tab.id })
            .unwrap();

        tokio::time::sleep(60 * MINUTE).await;
        assert_eq!(tabs.get(tab.id).unwrap().url, "https://example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_timers() {
        let (tabs, handle, task) = spawn_engine();
        for i in 0..3 {
            let tab = tabs.open(&format!("https://example.com/{}", i), "Page");
            handle
                .dispatch_event(TabEvent::Updated { tab, complete: true })
                .unwrap();
        }

        assert_eq!(handle.shutdown().await.unwrap(), 3);

        let engine = task.await.unwrap();
        assert_eq!(engine.next_deadline(), None);

        assert!(matches!(
            handle.dispatch_event(TabEvent::Removed {
                tab_id: tabmind_tabs::TabId(1)
            }),
            Err(CoreError::RuntimeClosed)
        ));
        assert!(handle.execute(Command::GetTabs).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_through_handle() {
        let (tabs, handle, _task) = spawn_engine();
        tabs.open("https://www.reddit.com/r/rust", "r/rust");

        let other = handle.clone();
        let saved = other
            .execute(Command::SaveSession {
                name: Some("Evening".to_string()),
            })
            .await
            .unwrap();
        assert!(saved.success);

        let listed = handle.execute(Command::ListSessions).await.unwrap();
        assert_eq!(listed.data.unwrap()[0]["name"], "Evening");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        let before = clock.now();

        tokio::time::sleep(5 * MINUTE).await;

        assert_eq!((clock.now() - before).num_minutes(), 5);
    }
}
