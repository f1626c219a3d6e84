//! Inbox channel types.
//!
//! Background tasks and the surface host send `UiEvent`s here; the runtime
//! drains the receiver every loop iteration.

use tokio::sync::mpsc;

use crate::events::UiEvent;

pub type UiEventSender = mpsc::UnboundedSender<UiEvent>;
pub type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;
