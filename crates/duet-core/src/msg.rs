//! Intent and effect messages
//!
//! An [`Intent`] is a mutation request. It travels from the peer holding
//! Input Authority over an actor to the peer holding State Authority over the
//! target, and is executed there only. An [`Effect`] announces a mutation the
//! State Authority has already applied; it is broadcast to every peer,
//! including the authority itself.

use crate::{EntityId, ModeTag, PeerId, Tick};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an intent asks the target's State Authority to do
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntentKind {
    /// Set the target's state index, once
    RequestMutate { index: i64 },
    /// Press a switch, once
    PressSwitch,
    /// Attach the target to the requesting actor
    StartCarry,
    /// Detach the target from the requesting actor
    StopCarry,
    /// Publish the actor's locally simulated pose
    ReportPose {
        position: Vec3,
        rotation: Quat,
        mode: ModeTag,
    },
}

impl IntentKind {
    pub fn name(&self) -> &'static str {
        match self {
            IntentKind::RequestMutate { .. } => "request_mutate",
            IntentKind::PressSwitch => "press_switch",
            IntentKind::StartCarry => "start_carry",
            IntentKind::StopCarry => "stop_carry",
            IntentKind::ReportPose { .. } => "report_pose",
        }
    }
}

/// A mutation request addressed to the State Authority of `target`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Peer that issued the intent
    pub sender: PeerId,
    /// Actor on whose behalf the intent was issued
    pub actor: EntityId,
    /// Entity the intent mutates
    pub target: EntityId,
    pub kind: IntentKind,
    /// Sender's tick when the intent was issued
    pub tick: Tick,
}

impl Intent {
    /// Create a new intent
    pub fn new(sender: PeerId, actor: EntityId, target: EntityId, kind: IntentKind) -> Self {
        Self {
            sender,
            actor,
            target,
            kind,
            tick: 0,
        }
    }

    /// Set the issue tick
    pub fn at_tick(mut self, tick: Tick) -> Self {
        self.tick = tick;
        self
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} ({} -> {}) @{}",
            self.kind.name(),
            self.sender,
            self.actor,
            self.target,
            self.tick
        )
    }
}

/// Why a carry link ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarryStopReason {
    /// The carrier let go
    Released,
    /// The object hit an obstruction while following
    Blocked,
    /// The carrier or the object left the session
    Despawned,
    /// The object was already carried by another actor
    Refused,
}

impl fmt::Display for CarryStopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CarryStopReason::Released => "released",
            CarryStopReason::Blocked => "blocked",
            CarryStopReason::Despawned => "despawned",
            CarryStopReason::Refused => "refused",
        };
        f.write_str(name)
    }
}

/// What an effect announces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    /// A one-shot mutation was applied on behalf of `actor`
    MutationApplied { actor: EntityId, index: Option<i64> },
    /// A shared counter changed
    CounterChanged { count: i64 },
    /// A shared counter reached its target for the first time
    ThresholdReached { count: i64, target: i64 },
    /// A gate flipped
    GateToggled { open: bool },
    /// A carry link was created
    CarryStarted { carrier: EntityId },
    /// A carry link ended
    CarryStopped {
        carrier: EntityId,
        reason: CarryStopReason,
    },
    /// A countdown reached zero
    TimeExpired,
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::MutationApplied { .. } => "mutation_applied",
            EffectKind::CounterChanged { .. } => "counter_changed",
            EffectKind::ThresholdReached { .. } => "threshold_reached",
            EffectKind::GateToggled { .. } => "gate_toggled",
            EffectKind::CarryStarted { .. } => "carry_started",
            EffectKind::CarryStopped { .. } => "carry_stopped",
            EffectKind::TimeExpired => "time_expired",
        }
    }
}

/// An applied mutation, broadcast by the State Authority of `target`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Authority that applied the mutation
    pub source: PeerId,
    /// Entity that was mutated
    pub target: EntityId,
    pub kind: EffectKind,
    /// Authority tick in which the mutation was applied
    pub tick: Tick,
}

impl Effect {
    /// Create a new effect
    pub fn new(source: PeerId, target: EntityId, kind: EffectKind, tick: Tick) -> Self {
        Self {
            source,
            target,
            kind,
            tick,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} by {} @{}",
            self.kind.name(),
            self.target,
            self.source,
            self.tick
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_builder() {
        let intent = Intent::new(
            PeerId::new(1),
            EntityId::new(10),
            EntityId::new(20),
            IntentKind::RequestMutate { index: 3 },
        )
        .at_tick(7);

        assert_eq!(intent.tick, 7);
        assert_eq!(
            intent.to_string(),
            "request_mutate from peer:1 (entity:10 -> entity:20) @7"
        );
    }

    #[test]
    fn test_effect_display() {
        let effect = Effect::new(
            PeerId::HOST,
            EntityId::new(5),
            EffectKind::CarryStopped {
                carrier: EntityId::new(1),
                reason: CarryStopReason::Blocked,
            },
            12,
        );
        assert_eq!(effect.to_string(), "carry_stopped on entity:5 by peer:host @12");
    }
}
