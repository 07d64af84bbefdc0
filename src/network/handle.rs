use std::error::Error;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::{NetworkCommand, NetworkEvent};

use super::client::{NetworkSettings, P2PClient};

const CHANNEL_CAPACITY: usize = 100;

/// The chat view's view of the transport. Owned by the component that
/// needs it; nothing global.
pub trait ChatTransport {
    fn connect(&mut self) -> Result<(), Box<dyn Error>>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn join_room(&mut self, stream_id: &str);
    fn leave_room(&mut self, stream_id: &str);
    /// Fire-and-forget; delivery is never reported back.
    fn send_message(&mut self, stream_id: &str, text: &str, display_name: &str);
    fn poll_event(&mut self) -> Option<NetworkEvent>;
}

/// `ChatTransport` backed by a [`P2PClient`] task.
pub struct NetworkHandle {
    runtime: Handle,
    settings: NetworkSettings,
    command_sender: Option<mpsc::Sender<NetworkCommand>>,
    event_receiver: Option<mpsc::Receiver<NetworkEvent>>,
    task: Option<JoinHandle<()>>,
}

impl NetworkHandle {
    pub fn new(runtime: Handle, settings: NetworkSettings) -> Self {
        Self {
            runtime,
            settings,
            command_sender: None,
            event_receiver: None,
            task: None,
        }
    }

    /// Dials an extra peer by multiaddr.
    pub fn connect_to_peer(&mut self, address: String) {
        self.send_command(NetworkCommand::ConnectToPeer { address });
    }

    fn send_command(&mut self, command: NetworkCommand) {
        let Some(sender) = &self.command_sender else {
            log::warn!("Network not connected; dropping {command:?}");
            return;
        };
        if let Err(err) = sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }
}

impl ChatTransport for NetworkHandle {
    fn connect(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_connected() {
            return Ok(());
        }

        // UI -> Network
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        // Network -> UI
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let client = P2PClient::new(event_tx, cmd_rx, self.settings.clone());
        let task = self.runtime.spawn(async move {
            if let Err(err) = client.run().await {
                log::error!("Network client terminated: {err}");
            }
        });

        self.command_sender = Some(cmd_tx);
        self.event_receiver = Some(event_rx);
        self.task = Some(task);
        log::info!("Chat transport connecting");
        Ok(())
    }

    fn disconnect(&mut self) {
        // Closing the command channel ends the event loop.
        self.command_sender = None;
        self.event_receiver = None;
        if self.task.take().is_some() {
            log::info!("Chat transport disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.command_sender
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    fn join_room(&mut self, stream_id: &str) {
        self.send_command(NetworkCommand::JoinRoom {
            stream_id: stream_id.to_string(),
        });
    }

    fn leave_room(&mut self, stream_id: &str) {
        self.send_command(NetworkCommand::LeaveRoom {
            stream_id: stream_id.to_string(),
        });
    }

    fn send_message(&mut self, stream_id: &str, text: &str, display_name: &str) {
        self.send_command(NetworkCommand::SendMessage {
            stream_id: stream_id.to_string(),
            text: text.to_string(),
            display_name: display_name.to_string(),
        });
    }

    fn poll_event(&mut self) -> Option<NetworkEvent> {
        self.event_receiver.as_mut()?.try_recv().ok()
    }
}

impl Drop for NetworkHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> NetworkSettings {
        NetworkSettings {
            bootstrap_peers: Vec::new(),
            listen_port: 0,
            reconnect_delay: Duration::from_millis(3_000),
            viewer_publish_interval: Duration::from_secs(5),
            relay_only: false,
        }
    }

    #[tokio::test]
    async fn commands_before_connect_are_dropped() {
        let mut handle = NetworkHandle::new(Handle::current(), settings());

        handle.send_message("s", "hi", "You");

        assert!(!handle.is_connected());
        assert!(handle.poll_event().is_none());
    }

    #[tokio::test]
    async fn disconnect_closes_the_handle() {
        let mut handle = NetworkHandle::new(Handle::current(), settings());
        handle.connect().unwrap();
        assert!(handle.is_connected());

        handle.disconnect();

        assert!(!handle.is_connected());
        assert!(handle.poll_event().is_none());
    }
}
