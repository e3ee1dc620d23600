use crate::error::StoreError;
use crate::room::{RoomRegistry, ViewerCounter};
use periscope_core::{RoomId, SessionDescription};
use tracing::info;

#[derive(Debug)]
pub(crate) enum UndoAction {
    DeleteRoom,
    Leave {
        decrement: bool,
        /// Set when the join never completed, so the slot is freed for a retry.
        clear_answer: Option<SessionDescription>,
    },
}

/// Store writes a session still has to take back. Each step is marked done
/// as it succeeds, so running a partly failed undo again repeats nothing.
#[derive(Debug)]
pub(crate) struct StoreUndo {
    pub(crate) room_id: RoomId,
    pub(crate) action: UndoAction,
}

fn tolerate_missing(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(StoreError::NotFound) => Ok(()),
        other => other,
    }
}

impl StoreUndo {
    pub(crate) async fn run(
        &mut self,
        registry: &RoomRegistry,
        counter: &ViewerCounter,
    ) -> Result<(), StoreError> {
        match &mut self.action {
            UndoAction::DeleteRoom => {
                registry.delete(&self.room_id).await?;
                info!(room_id = %self.room_id, "Broadcast stopped");
            }
            UndoAction::Leave {
                decrement,
                clear_answer,
            } => {
                if let Some(answer) = clear_answer {
                    tolerate_missing(registry.clear_answer(&self.room_id, answer).await)?;
                    *clear_answer = None;
                }
                if *decrement {
                    tolerate_missing(counter.decrement(&self.room_id).await.map(|_| ()))?;
                    *decrement = false;
                }
                info!(room_id = %self.room_id, "Stopped viewing");
            }
        }
        Ok(())
    }
}
