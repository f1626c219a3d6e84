use sentinel_core::auth::{MainMode, SurfaceHost};

use super::inbox::UiEventSender;
use crate::events::{SurfaceEvent, UiEvent};

/// Surface host that forwards coordinator requests to the event loop.
///
/// Requests are queued in call order, so the reducer sees `PresentMain`
/// before `DisposeLogin`.
#[derive(Debug, Clone)]
pub struct ChannelSurfaceHost {
    tx: UiEventSender,
}

impl ChannelSurfaceHost {
    pub fn new(tx: UiEventSender) -> Self {
        Self { tx }
    }

    fn send(&self, event: SurfaceEvent) {
        if self.tx.send(UiEvent::Surface(event)).is_err() {
            tracing::debug!(?event, "Event loop gone, dropping surface request");
        }
    }
}

impl SurfaceHost for ChannelSurfaceHost {
    fn present_login(&self) {
        self.send(SurfaceEvent::PresentLogin);
    }

    fn present_main(&self, mode: MainMode) {
        self.send(SurfaceEvent::PresentMain(mode));
    }

    fn dispose_login(&self) {
        self.send(SurfaceEvent::DisposeLogin);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn test_requests_arrive_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = ChannelSurfaceHost::new(tx);
        host.present_main(MainMode::Authenticated);
        host.dispose_login();

        assert!(matches!(
            rx.try_recv(),
            Ok(UiEvent::Surface(SurfaceEvent::PresentMain(
                MainMode::Authenticated
            )))
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(UiEvent::Surface(SurfaceEvent::DisposeLogin))
        ));
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelSurfaceHost::new(tx).present_login();
    }
}
