//! Locally driven actors
//!
//! The peer holding Input Authority over an actor runs its locomotion. The
//! controller turns what a step produced into intents: carry requests for the
//! object's authority, and a pose report whenever the actor moved or changed
//! mode, so the actor's State Authority can publish it.

use duet_core::{EntityId, InputFrame, Intent, IntentKind, ModeTag, PeerId, Tick};
use duet_motion::{
    CharacterBody, Locomotion, LocomotionConfig, MotionRequest, PhysicsQuery, StepOutcome,
    Transition,
};
use glam::{Quat, Vec3};

const POSE_EPSILON: f32 = 1e-4;

/// What one actor step produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorStep {
    pub outcome: StepOutcome,
    /// Intents to route this tick
    pub intents: Vec<Intent>,
}

/// An actor this peer drives
#[derive(Debug, Clone)]
pub struct ActorController {
    entity: EntityId,
    locomotion: Locomotion,
    last_report: Option<(Vec3, Quat, ModeTag)>,
}

impl ActorController {
    pub fn new(entity: EntityId, config: LocomotionConfig, position: Vec3, rotation: Quat) -> Self {
        let body = CharacterBody::new(position).with_rotation(rotation);
        Self {
            entity,
            locomotion: Locomotion::new(config, body),
            last_report: None,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    pub fn tag(&self) -> ModeTag {
        self.locomotion.tag()
    }

    /// Current simulated pose
    pub fn pose(&self) -> (Vec3, Quat) {
        let body = self.locomotion.body();
        (body.position, body.rotation)
    }

    /// Snap the actor onto the ground below its spawn point
    pub fn settle(&mut self, physics: &dyn PhysicsQuery) -> bool {
        self.locomotion.settle(physics)
    }

    /// Advance the actor one tick on behalf of `owner`
    pub fn step(
        &mut self,
        owner: PeerId,
        input: &InputFrame,
        physics: &dyn PhysicsQuery,
        dt: f32,
        tick: Tick,
    ) -> ActorStep {
        let outcome = self.locomotion.step(input, physics, dt);
        for rejection in &outcome.rejections {
            tracing::debug!(actor = %self.entity, %tick, ?rejection, "input ignored");
        }

        let mut intents: Vec<Intent> = outcome
            .requests
            .iter()
            .map(|request| {
                let (target, kind) = match *request {
                    MotionRequest::StartCarry { target } => (target, IntentKind::StartCarry),
                    MotionRequest::StopCarry { target } => (target, IntentKind::StopCarry),
                };
                Intent::new(owner, self.entity, target, kind).at_tick(tick)
            })
            .collect();

        if let Some(report) = self.pose_report(owner, tick) {
            intents.push(report);
        }
        ActorStep { outcome, intents }
    }

    /// End the actor's interaction with `target`, if that is what it is doing
    pub fn force_release(&mut self, target: EntityId) -> Option<Transition> {
        let current = self.locomotion.mode().interaction()?.target;
        if current != target {
            return None;
        }
        self.locomotion.force_release_interaction()?;
        Some(Transition {
            from: ModeTag::Interacting,
            to: self.locomotion.tag(),
        })
    }

    fn pose_report(&mut self, owner: PeerId, tick: Tick) -> Option<Intent> {
        let (position, rotation) = self.pose();
        let mode = self.tag();
        let unchanged = self.last_report.is_some_and(|(p, r, m)| {
            m == mode && p.abs_diff_eq(position, POSE_EPSILON) && r.abs_diff_eq(rotation, POSE_EPSILON)
        });
        if unchanged {
            return None;
        }
        self.last_report = Some((position, rotation, mode));
        Some(
            Intent::new(
                owner,
                self.entity,
                self.entity,
                IntentKind::ReportPose {
                    position,
                    rotation,
                    mode,
                },
            )
            .at_tick(tick),
        )
    }
}
