//! In-memory network for running several peers in one process
//!
//! Every payload is delivered exactly once after a latency drawn uniformly
//! from `[min_latency_ticks, max_latency_ticks]`. With a non-zero spread,
//! payloads between the same two peers can overtake each other, which is
//! exactly the reordering the replicated store has to tolerate.

use crate::{Error, Result, Transport};
use duet_core::{GameRng, PeerId, Tick};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Latency model of a [`SimNetwork`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Fewest ticks a payload spends in flight
    pub min_latency_ticks: u64,
    /// Most ticks a payload spends in flight
    pub max_latency_ticks: u64,
    /// Seed for latency jitter
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            min_latency_ticks: 1,
            max_latency_ticks: 3,
            seed: 12345,
        }
    }
}

impl NetworkConfig {
    /// Fixed latency, no reordering
    pub fn fixed(ticks: u64) -> Self {
        Self {
            min_latency_ticks: ticks,
            max_latency_ticks: ticks,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    from: PeerId,
    data: Vec<u8>,
    deliver_at: Tick,
    seq: u64,
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub sent: u64,
    pub delivered: u64,
    pub bytes: u64,
}

/// Shared in-memory network; hand out per-peer endpoints with [`endpoint`](Self::endpoint)
#[derive(Debug)]
pub struct SimNetwork {
    config: NetworkConfig,
    rng: GameRng,
    now: Tick,
    next_seq: u64,
    inboxes: IndexMap<PeerId, Vec<InFlight>>,
    stats: NetworkStats,
}

impl SimNetwork {
    /// Create a network with no peers
    pub fn new(config: NetworkConfig) -> Self {
        let rng = GameRng::new(config.seed);
        Self {
            config,
            rng,
            now: 0,
            next_seq: 0,
            inboxes: IndexMap::new(),
            stats: NetworkStats::default(),
        }
    }

    /// Connect a peer
    pub fn join(&mut self, peer: PeerId) {
        self.inboxes.entry(peer).or_default();
    }

    /// Disconnect a peer, discarding anything still addressed to it
    pub fn leave(&mut self, peer: PeerId) {
        self.inboxes.shift_remove(&peer);
    }

    /// Connected peers
    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.inboxes.keys().copied()
    }

    /// Set the network's notion of the current tick
    pub fn set_now(&mut self, tick: Tick) {
        self.now = tick;
    }

    /// Current tick
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Payloads still in flight to any peer
    pub fn in_flight(&self) -> usize {
        self.inboxes.values().map(Vec::len).sum()
    }

    /// Delivery counters
    pub fn stats(&self) -> NetworkStats {
        self.stats
    }

    /// Borrow the endpoint of one peer
    pub fn endpoint(&mut self, peer: PeerId) -> SimEndpoint<'_> {
        SimEndpoint { network: self, peer }
    }

    fn enqueue(&mut self, from: PeerId, to: PeerId, data: &[u8]) -> Result<()> {
        let latency = self
            .rng
            .range_u64(self.config.min_latency_ticks, self.config.max_latency_ticks);
        let deliver_at = self.now + latency;
        let seq = self.next_seq;

        let inbox = self.inboxes.get_mut(&to).ok_or(Error::UnknownPeer(to))?;
        inbox.push(InFlight {
            from,
            data: data.to_vec(),
            deliver_at,
            seq,
        });
        self.next_seq += 1;
        self.stats.sent += 1;
        self.stats.bytes += data.len() as u64;
        tracing::trace!(%from, %to, deliver_at, bytes = data.len(), "payload queued");
        Ok(())
    }

    fn dequeue(&mut self, peer: PeerId) -> Result<Option<(Vec<u8>, PeerId)>> {
        let now = self.now;
        let inbox = self.inboxes.get_mut(&peer).ok_or(Error::UnknownPeer(peer))?;

        let next = inbox
            .iter()
            .enumerate()
            .filter(|(_, msg)| msg.deliver_at <= now)
            .min_by_key(|(_, msg)| (msg.deliver_at, msg.seq))
            .map(|(i, _)| i);

        let Some(index) = next else {
            return Ok(None);
        };
        let msg = inbox.remove(index);
        self.stats.delivered += 1;
        Ok(Some((msg.data, msg.from)))
    }
}

impl Default for SimNetwork {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

/// One peer's view of a [`SimNetwork`]
#[derive(Debug)]
pub struct SimEndpoint<'a> {
    network: &'a mut SimNetwork,
    peer: PeerId,
}

impl Transport for SimEndpoint<'_> {
    fn local_peer(&self) -> PeerId {
        self.peer
    }

    fn remote_peers(&self) -> Vec<PeerId> {
        self.network.peers().filter(|p| *p != self.peer).collect()
    }

    fn send(&mut self, to: PeerId, data: &[u8]) -> Result<()> {
        self.network.enqueue(self.peer, to, data)
    }

    fn recv(&mut self) -> Result<Option<(Vec<u8>, PeerId)>> {
        self.network.dequeue(self.peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: PeerId = PeerId::HOST;
    const GUEST: PeerId = PeerId(1);

    fn network(config: NetworkConfig) -> SimNetwork {
        let mut net = SimNetwork::new(config);
        net.join(HOST);
        net.join(GUEST);
        net
    }

    #[test]
    fn test_latency_holds_payloads() {
        let mut net = network(NetworkConfig::fixed(2));
        net.endpoint(HOST).send(GUEST, b"hello").unwrap();

        net.set_now(1);
        assert!(net.endpoint(GUEST).recv().unwrap().is_none());

        net.set_now(2);
        let (data, from) = net.endpoint(GUEST).recv().unwrap().unwrap();
        assert_eq!(data, b"hello");
        assert_eq!(from, HOST);
        assert_eq!(net.in_flight(), 0);
        assert_eq!(net.stats().delivered, 1);
    }

    #[test]
    fn test_same_tick_order_preserved() {
        let mut net = network(NetworkConfig::fixed(1));
        {
            let mut host = net.endpoint(HOST);
            host.send(GUEST, b"a").unwrap();
            host.send(GUEST, b"b").unwrap();
        }
        net.set_now(1);
        let mut guest = net.endpoint(GUEST);
        assert_eq!(guest.recv().unwrap().unwrap().0, b"a");
        assert_eq!(guest.recv().unwrap().unwrap().0, b"b");
        assert!(guest.recv().unwrap().is_none());
    }

    #[test]
    fn test_unknown_peer() {
        let mut net = network(NetworkConfig::default());
        let err = net.endpoint(HOST).send(PeerId::new(9), b"x").unwrap_err();
        assert!(matches!(err, Error::UnknownPeer(p) if p == PeerId::new(9)));

        net.leave(GUEST);
        assert_eq!(net.endpoint(HOST).remote_peers(), Vec::<PeerId>::new());
    }

    #[test]
    fn test_jitter_within_bounds() {
        let config = NetworkConfig {
            min_latency_ticks: 1,
            max_latency_ticks: 4,
            seed: 99,
        };
        let mut net = network(config);
        for i in 0..32u8 {
            net.endpoint(HOST).send(GUEST, &[i]).unwrap();
        }
        net.set_now(0);
        assert!(net.endpoint(GUEST).recv().unwrap().is_none());

        net.set_now(4);
        let mut received = 0;
        while net.endpoint(GUEST).recv().unwrap().is_some() {
            received += 1;
        }
        assert_eq!(received, 32);
    }

    #[test]
    fn test_config_ron() {
        let config: NetworkConfig = ron::from_str("(max_latency_ticks: 6)").unwrap();
        assert_eq!(config.max_latency_ticks, 6);
        assert_eq!(config.min_latency_ticks, 1);
    }
}
