use std::collections::HashSet;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use libp2p::gossipsub;
use libp2p::identify;
use libp2p::kad;
use libp2p::mdns;
use libp2p::multiaddr::Protocol;
use libp2p::swarm::{Config as SwarmConfig, SwarmEvent};
use libp2p::{Multiaddr, PeerId, Swarm, identity};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};

use crate::common::{
    IncomingChatMessage, NetworkCommand, NetworkEvent, OutgoingChatMessage, parse_viewer_count,
};

use super::behavior::{ChatBehavior, ChatBehaviorEvent, build_behavior};
use super::topics::{RoomTopic, chat_topic, parse_topic, viewers_topic};
use super::transport::build_transport;

const NODE_KEY_PATH: &str = "data/node_key.pk";

/// Knobs for one network task.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub bootstrap_peers: Vec<(PeerId, Multiaddr)>,
    pub listen_port: u16,
    pub reconnect_delay: Duration,
    pub viewer_publish_interval: Duration,
    /// Relay node: no chat of its own, follows every room and publishes
    /// viewer counts.
    pub relay_only: bool,
}

pub struct P2PClient {
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
    settings: NetworkSettings,
    rooms: HashSet<String>,
    connected_peers: HashSet<PeerId>,
}

impl P2PClient {
    pub fn new(
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
        settings: NetworkSettings,
    ) -> Self {
        Self {
            event_sender,
            command_receiver,
            settings,
            rooms: HashSet::new(),
            connected_peers: HashSet::new(),
        }
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error>> {
        let local_key = if self.settings.relay_only {
            load_or_generate_node_key()?
        } else {
            identity::Keypair::generate_ed25519()
        };
        let local_peer_id = PeerId::from(local_key.public());
        log::info!("Local PeerID: {local_peer_id:?}");

        let transport = build_transport(&local_key)?;
        let behavior = build_behavior(&local_key, local_peer_id)?;

        let mut swarm = Swarm::new(
            transport,
            behavior,
            local_peer_id,
            SwarmConfig::with_tokio_executor()
                .with_idle_connection_timeout(Duration::from_secs(60)),
        );

        let listen_addr = format!("/ip4/0.0.0.0/tcp/{}", self.settings.listen_port);
        swarm.listen_on(listen_addr.parse()?)?;

        if self.settings.bootstrap_peers.is_empty() {
            log::warn!("No bootstrap peers configured; only LAN peers (mDNS) will be found");
        } else {
            self.dial_bootstrap_peers(&mut swarm);
        }

        let reconnect_delay = self.settings.reconnect_delay;
        let mut reconnect = interval_at(Instant::now() + reconnect_delay, reconnect_delay);
        reconnect.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut viewer_publish = interval(self.settings.viewer_publish_interval);
        viewer_publish.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!("Network event loop started");

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command, &mut swarm).await,
                        None => break,
                    }
                }
                event = swarm.select_next_some() => {
                    self.handle_swarm_event(event, &mut swarm).await;
                }
                _ = reconnect.tick() => {
                    if self.connected_peers.is_empty() && !self.settings.bootstrap_peers.is_empty() {
                        log::debug!("No live connections; re-dialling bootstrap peers");
                        self.dial_bootstrap_peers(&mut swarm);
                    }
                }
                _ = viewer_publish.tick(), if self.settings.relay_only => {
                    self.publish_viewer_counts(&mut swarm);
                }
            }
        }

        log::info!("Network event loop stopped");
        Ok(())
    }

    fn dial_bootstrap_peers(&self, swarm: &mut Swarm<ChatBehavior>) {
        for (peer_id, addr) in &self.settings.bootstrap_peers {
            log::info!("Adding bootstrap peer {peer_id} at {addr}");
            swarm.behaviour_mut().kad.add_address(peer_id, addr.clone());
            if let Err(err) = swarm.dial(addr.clone()) {
                log::warn!("Failed to dial bootstrap peer {peer_id}: {err}");
            }
        }

        if let Err(err) = swarm.behaviour_mut().kad.bootstrap() {
            log::warn!("Failed to trigger Kademlia bootstrap: {err}");
        }
    }

    async fn handle_command(&mut self, command: NetworkCommand, swarm: &mut Swarm<ChatBehavior>) {
        match command {
            NetworkCommand::JoinRoom { stream_id } => {
                self.join_room(&stream_id, swarm);
            }
            NetworkCommand::LeaveRoom { stream_id } => {
                let gossipsub = &mut swarm.behaviour_mut().gossipsub;
                let _ = gossipsub.unsubscribe(&chat_topic(&stream_id));
                let _ = gossipsub.unsubscribe(&viewers_topic(&stream_id));
                self.rooms.remove(&stream_id);
                log::info!("Left room {stream_id}");
            }
            NetworkCommand::SendMessage {
                stream_id,
                text,
                display_name,
            } => {
                if self.settings.relay_only {
                    log::warn!("Relay node does not chat; ignoring SendMessage command");
                    return;
                }
                self.publish_chat(&stream_id, &text, &display_name, swarm)
                    .await;
            }
            NetworkCommand::ConnectToPeer { address } => match address.parse::<Multiaddr>() {
                Ok(addr) => {
                    log::info!("Attempting to connect to peer at {addr}");

                    let mut addr_clone = addr.clone();
                    if let Some(Protocol::P2p(peer_id)) = addr_clone.pop() {
                        swarm.behaviour_mut().kad.add_address(&peer_id, addr.clone());
                    }

                    if let Err(err) = swarm.dial(addr) {
                        log::error!("Failed to dial peer: {err}");
                    }
                }
                Err(err) => {
                    log::error!("Invalid multiaddr '{address}': {err}");
                }
            },
        }
    }

    fn join_room(&mut self, stream_id: &str, swarm: &mut Swarm<ChatBehavior>) {
        let gossipsub = &mut swarm.behaviour_mut().gossipsub;
        for topic in [chat_topic(stream_id), viewers_topic(stream_id)] {
            if let Err(err) = gossipsub.subscribe(&topic) {
                log::warn!("Failed to subscribe to {topic}: {err:?}");
                return;
            }
        }
        if self.rooms.insert(stream_id.to_string()) {
            log::info!("Joined room {stream_id}");
        }
    }

    async fn publish_chat(
        &mut self,
        stream_id: &str,
        text: &str,
        display_name: &str,
        swarm: &mut Swarm<ChatBehavior>,
    ) {
        let outgoing = OutgoingChatMessage::new(display_name, text);
        let payload = match serde_json::to_vec(&outgoing) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Failed to serialize message: {err:?}");
                return;
            }
        };

        if let Err(err) = swarm
            .behaviour_mut()
            .gossipsub
            .publish(chat_topic(stream_id), payload)
        {
            log::warn!("Publish error: {err:?}");
            return;
        }

        // Gossipsub never delivers our own publication back to us.
        let echo = IncomingChatMessage::from(&outgoing).into_chat_message(stream_id);
        if let Err(err) = self
            .event_sender
            .send(NetworkEvent::MessageReceived(echo))
            .await
        {
            log::warn!("Failed to notify UI about self message: {err:?}");
        }
    }

    fn publish_viewer_counts(&self, swarm: &mut Swarm<ChatBehavior>) {
        for stream_id in &self.rooms {
            let chat_hash = chat_topic(stream_id).hash();
            let count = swarm
                .behaviour()
                .gossipsub
                .all_peers()
                .filter(|(_, topics)| topics.iter().any(|topic| **topic == chat_hash))
                .count();

            // The timestamp keeps identical counts from being dropped as duplicates.
            let payload = serde_json::json!({
                "viewerCount": count,
                "at": Utc::now().timestamp_millis(),
            });

            match swarm
                .behaviour_mut()
                .gossipsub
                .publish(viewers_topic(stream_id), payload.to_string().into_bytes())
            {
                Ok(_) => log::debug!("Published {count} viewers for {stream_id}"),
                Err(err) => log::debug!("Failed to publish viewer count for {stream_id}: {err:?}"),
            }
        }
    }

    async fn handle_swarm_event(
        &mut self,
        event: SwarmEvent<ChatBehaviorEvent>,
        swarm: &mut Swarm<ChatBehavior>,
    ) {
        match event {
            SwarmEvent::Behaviour(ChatBehaviorEvent::Gossipsub(gossipsub::Event::Message {
                message,
                ..
            })) => {
                self.handle_gossip_message(message).await;
            }
            SwarmEvent::Behaviour(ChatBehaviorEvent::Gossipsub(gossipsub::Event::Subscribed {
                peer_id,
                topic,
            })) => {
                log::debug!("{peer_id} subscribed to {topic}");
                if self.settings.relay_only {
                    if let Some(RoomTopic::Chat(stream_id)) = parse_topic(topic.as_str()) {
                        self.join_room(&stream_id, swarm);
                    }
                }
            }
            SwarmEvent::Behaviour(ChatBehaviorEvent::Mdns(mdns::Event::Discovered(list))) => {
                for (peer_id, _) in list {
                    swarm.behaviour_mut().gossipsub.add_explicit_peer(&peer_id);
                    self.emit(NetworkEvent::PeerConnected(peer_id.to_string()))
                        .await;
                }
            }
            SwarmEvent::Behaviour(ChatBehaviorEvent::Mdns(mdns::Event::Expired(list))) => {
                for (peer_id, _) in list {
                    swarm
                        .behaviour_mut()
                        .gossipsub
                        .remove_explicit_peer(&peer_id);
                    self.emit(NetworkEvent::PeerDisconnected(peer_id.to_string()))
                        .await;
                }
            }
            SwarmEvent::Behaviour(ChatBehaviorEvent::Identify(identify::Event::Received {
                peer_id,
                info,
                ..
            })) => {
                for addr in info.listen_addrs {
                    swarm.behaviour_mut().kad.add_address(&peer_id, addr);
                }
            }
            SwarmEvent::Behaviour(ChatBehaviorEvent::Kad(
                kad::Event::OutboundQueryProgressed {
                    result: kad::QueryResult::Bootstrap(result),
                    ..
                },
            )) => match result {
                Ok(kad::BootstrapOk { num_remaining, .. }) => {
                    log::info!("Kademlia bootstrap ok, remaining peers: {num_remaining}");
                }
                Err(err) => log::warn!("Kademlia bootstrap error: {err:?}"),
            },
            SwarmEvent::NewListenAddr { address, .. } => {
                let full_addr = address.with(Protocol::P2p(*swarm.local_peer_id()));
                log::info!("Listening on {full_addr}");
            }
            SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                let first = self.connected_peers.is_empty();
                if self.connected_peers.insert(peer_id) {
                    if first {
                        self.emit(NetworkEvent::Connected).await;
                    }
                    self.emit(NetworkEvent::PeerConnected(peer_id.to_string()))
                        .await;
                }
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                num_established,
                ..
            } => {
                if num_established == 0 && self.connected_peers.remove(&peer_id) {
                    self.emit(NetworkEvent::PeerDisconnected(peer_id.to_string()))
                        .await;
                    if self.connected_peers.is_empty() {
                        self.emit(NetworkEvent::Disconnected).await;
                    }
                }
            }
            _ => {}
        }
    }

    async fn handle_gossip_message(&mut self, message: gossipsub::Message) {
        match parse_topic(message.topic.as_str()) {
            Some(RoomTopic::Chat(stream_id)) => {
                if self.settings.relay_only {
                    return;
                }
                match serde_json::from_slice::<IncomingChatMessage>(&message.data) {
                    Ok(incoming) => {
                        let chat = incoming.into_chat_message(&stream_id);
                        self.emit(NetworkEvent::MessageReceived(chat)).await;
                    }
                    Err(err) => log::warn!("Dropping invalid chat payload on {stream_id}: {err}"),
                }
            }
            Some(RoomTopic::Viewers(stream_id)) => match parse_viewer_count(&message.data) {
                Some(count) => {
                    self.emit(NetworkEvent::ViewerCount { stream_id, count })
                        .await;
                }
                None => log::debug!("Ignoring unreadable viewer count on {stream_id}"),
            },
            None => log::debug!("Message on unknown topic {}", message.topic),
        }
    }

    async fn emit(&self, event: NetworkEvent) {
        if self.settings.relay_only {
            return;
        }
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to deliver network event to UI: {err}");
        }
    }
}

fn load_or_generate_node_key() -> Result<identity::Keypair, Box<dyn Error>> {
    let path = Path::new(NODE_KEY_PATH);
    if path.exists() {
        let bytes = fs::read(path)?;
        let keypair = identity::Keypair::from_protobuf_encoding(&bytes)
            .map_err(|e| format!("Failed to decode node identity key: {e}"))?;
        log::info!("Loaded persisted node identity key from {NODE_KEY_PATH}");
        Ok(keypair)
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let keypair = identity::Keypair::generate_ed25519();
        let encoded = keypair
            .to_protobuf_encoding()
            .map_err(|e| format!("Failed to encode node identity key: {e}"))?;
        fs::write(path, encoded)?;
        log::info!("Generated new node identity key and saved to {NODE_KEY_PATH}");
        Ok(keypair)
    }
}

/// Splits `/ip4/.../tcp/.../p2p/<peer>` entries into dialable pairs.
pub fn parse_bootstrap_peers(entries: &[String]) -> Vec<(PeerId, Multiaddr)> {
    entries
        .iter()
        .filter_map(|entry| {
            let mut addr: Multiaddr = match entry.parse() {
                Ok(addr) => addr,
                Err(err) => {
                    log::warn!("Invalid multiaddr `{entry}`: {err}");
                    return None;
                }
            };

            let peer_id = match addr.pop() {
                Some(Protocol::P2p(peer)) => peer,
                _ => {
                    log::warn!("Multiaddr `{entry}` missing /p2p/PeerId suffix");
                    return None;
                }
            };

            Some((peer_id, addr))
        })
        .collect()
}
