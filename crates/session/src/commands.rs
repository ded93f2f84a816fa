//! Command router.
//!
//! Key presses and named commands reach the session only through a
//! [`CommandScope`]. At most one scope is active per session; dropping it
//! uninstalls the router, including on early returns and panics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lumen_core::commands::{command_for_key, Command, KeyEvent};
use lumen_core::error::CoreError;
use lumen_core::types::ViewMode;

use crate::error::SessionError;
use crate::session::Session;

pub struct CommandScope {
    session: Session,
    active: Arc<AtomicBool>,
}

impl CommandScope {
    pub(crate) fn acquire(session: Session, active: Arc<AtomicBool>) -> Result<Self, SessionError> {
        if active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoreError::Conflict("Command router is already active".to_string()).into());
        }
        tracing::debug!("Command router installed");
        Ok(Self { session, active })
    }

    /// Handle a key press. Returns whether it triggered a command.
    pub async fn handle_key(&self, event: &KeyEvent) -> Result<bool, SessionError> {
        match command_for_key(event) {
            Some(command) => self.dispatch(command).await,
            None => Ok(false),
        }
    }

    /// Run a named command. Returns `false` when it did not apply in the
    /// current state (e.g. `next-image` with the lightbox closed).
    pub async fn dispatch(&self, command: Command) -> Result<bool, SessionError> {
        tracing::trace!(command = %command, "Dispatching command");
        let session = &self.session;
        match command {
            Command::NextImage => {
                if session.lightbox().await.is_none() {
                    return Ok(false);
                }
                session.next().await?;
                Ok(true)
            }
            Command::PreviousImage => {
                if session.lightbox().await.is_none() {
                    return Ok(false);
                }
                session.previous().await?;
                Ok(true)
            }
            Command::Close => self.close().await,
            Command::ToggleTagMode => {
                session.toggle_tag_mode().await;
                Ok(true)
            }
            Command::ClearSelection => {
                session.clear_selection().await;
                Ok(true)
            }
            Command::ToggleSearch => {
                session.toggle_search().await;
                Ok(true)
            }
            Command::ToggleQuality => {
                if session.lightbox().await.is_none() {
                    return Ok(false);
                }
                session.toggle_quality().await?;
                Ok(true)
            }
            Command::OpenUploader => {
                session.set_mode(ViewMode::Upload).await;
                Ok(true)
            }
        }
    }

    /// Escape unwinds one layer: lightbox, then search box, then the
    /// current mode.
    async fn close(&self) -> Result<bool, SessionError> {
        let session = &self.session;
        if session.close().await {
            return Ok(true);
        }
        if session.hide_search().await {
            return Ok(true);
        }
        match session.mode().await {
            ViewMode::Tagging => {
                session.set_mode(ViewMode::Browse).await;
                Ok(true)
            }
            ViewMode::Upload if !session.upload_active().await => {
                session.set_mode(ViewMode::Browse).await;
                Ok(true)
            }
            ViewMode::Upload | ViewMode::Browse => Ok(false),
        }
    }
}

impl Drop for CommandScope {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        tracing::debug!("Command router removed");
    }
}
