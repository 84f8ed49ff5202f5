//! Transport seam and wire packets
//!
//! A [`Transport`] is one peer's endpoint: it moves opaque byte payloads to
//! other peers and hands back whatever has arrived. Users implement it for
//! their network stack; [`SimNetwork`](crate::SimNetwork) provides an
//! in-memory one. [`Packet`] is the protocol carried over it, encoded with
//! bincode.

use crate::Result;
use duet_core::{Effect, FieldUpdate, Intent, PeerId, Tick};
use serde::{Deserialize, Serialize};

/// Packet types of the duet protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    /// Mutation request for the target's State Authority
    Intent(Intent),
    /// Applied mutation, broadcast by a State Authority
    Effect(Effect),
    /// Field updates written by `from` during `tick`
    Replicate {
        from: PeerId,
        tick: Tick,
        updates: Vec<FieldUpdate>,
    },
}

impl Packet {
    /// Encode for the wire
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a wire payload
    pub fn decode(data: &[u8]) -> Result<Packet> {
        Ok(bincode::deserialize(data)?)
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Packet::Intent(_) => "intent",
            Packet::Effect(_) => "effect",
            Packet::Replicate { .. } => "replicate",
        }
    }
}

/// A decoded packet and the peer it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub from: PeerId,
    pub packet: Packet,
}

/// One peer's connectionless endpoint
pub trait Transport {
    /// The peer owning this endpoint
    fn local_peer(&self) -> PeerId;

    /// Every other peer currently reachable
    fn remote_peers(&self) -> Vec<PeerId>;

    /// Send a payload to a peer
    fn send(&mut self, to: PeerId, data: &[u8]) -> Result<()>;

    /// Receive one payload (non-blocking)
    ///
    /// Returns `Ok(None)` if nothing has arrived yet.
    fn recv(&mut self) -> Result<Option<(Vec<u8>, PeerId)>>;

    /// Encode and send a packet to one peer
    fn send_packet(&mut self, to: PeerId, packet: &Packet) -> Result<()> {
        let data = packet.encode()?;
        self.send(to, &data)
    }

    /// Encode once and send a packet to every remote peer
    fn broadcast_packet(&mut self, packet: &Packet) -> Result<()> {
        let data = packet.encode()?;
        for peer in self.remote_peers() {
            self.send(peer, &data)?;
        }
        Ok(())
    }

    /// Receive and decode every packet that has arrived
    ///
    /// Payloads that fail to decode are logged and skipped.
    fn drain_packets(&mut self) -> Result<Vec<Delivery>> {
        let mut deliveries = Vec::new();
        while let Some((data, from)) = self.recv()? {
            match Packet::decode(&data) {
                Ok(packet) => deliveries.push(Delivery { from, packet }),
                Err(err) => tracing::warn!(%from, error = %err, "dropping undecodable packet"),
            }
        }
        Ok(deliveries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_core::{EntityId, IntentKind, Value, Version};

    #[test]
    fn test_packet_encoding() {
        let packet = Packet::Replicate {
            from: PeerId::HOST,
            tick: 4,
            updates: vec![FieldUpdate {
                entity: EntityId::new(2),
                field: "count".into(),
                value: Value::Int(3),
                version: Version { tick: 4, seq: 9 },
            }],
        };
        let bytes = packet.encode().unwrap();
        assert_eq!(Packet::decode(&bytes).unwrap(), packet);
        assert_eq!(packet.name(), "replicate");
    }

    #[test]
    fn test_decode_garbage() {
        assert!(Packet::decode(&[0xff, 0xff, 0xff, 0xff, 0x01]).is_err());
    }

    #[test]
    fn test_intent_packet() {
        let intent = Intent::new(
            PeerId::new(1),
            EntityId::new(1),
            EntityId::new(2),
            IntentKind::PressSwitch,
        );
        let bytes = Packet::Intent(intent).encode().unwrap();
        assert!(matches!(Packet::decode(&bytes).unwrap(), Packet::Intent(i) if i == intent));
    }
}
