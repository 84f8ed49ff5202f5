//! Locomotion state machine
//!
//! [`Locomotion::step`] advances one actor by one fixed tick. It is the only
//! place the mode changes, and every change goes through a single transition
//! helper that keeps the physical controller consistent with the mode: locked
//! modes (hanging, climbing) disable it, every other mode has it enabled.
//!
//! Ledge scanning happens inside the step that detects the ledge. An airborne
//! actor never ends a tick "scanning"; it is either still airborne or hanging.

use crate::body::CharacterBody;
use crate::config::LocomotionConfig;
use crate::mode::{Axis, Climb, Guards, Interaction, LedgeHold, Mode};
use crate::physics::PhysicsQuery;
use crate::probes;
use duet_core::{EntityId, Error, InputFrame, ModeTag};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Share of the climb spent going up before moving onto the ledge
const CLIMB_UP_SHARE: f32 = 0.7;

/// A mode change that happened during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: ModeTag,
    pub to: ModeTag,
}

/// Request for the authority of another entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionRequest {
    StartCarry { target: EntityId },
    StopCarry { target: EntityId },
}

/// Why an input was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The current mode excludes the requested one
    InvalidTransition { from: ModeTag, to: ModeTag },
    /// The requested mode is on cooldown
    CoolingDown { from: ModeTag, to: ModeTag },
    /// The feature is not configured
    MissingCollaborator(&'static str),
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::InvalidTransition { from, to } | Rejection::CoolingDown { from, to } => {
                Error::InvalidTransition { from, to }
            }
            Rejection::MissingCollaborator(name) => Error::MissingCollaborator(name),
        }
    }
}

/// Everything a step produced besides the new body state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub transitions: Vec<Transition>,
    pub requests: Vec<MotionRequest>,
    pub rejections: Vec<Rejection>,
}

impl StepOutcome {
    /// Whether the mode changed
    pub fn changed(&self) -> bool {
        !self.transitions.is_empty()
    }

    fn reject(&mut self, rejection: Rejection) {
        self.rejections.push(rejection);
    }
}

/// One actor's locomotion: body, mode and cooldowns
#[derive(Debug, Clone)]
pub struct Locomotion {
    config: LocomotionConfig,
    body: CharacterBody,
    mode: Mode,
    guards: Guards,
}

impl Locomotion {
    /// Create an actor in Grounded mode
    pub fn new(config: LocomotionConfig, body: CharacterBody) -> Self {
        if config.ledge_layer.is_none() {
            tracing::warn!(error = %Error::MissingCollaborator("ledge layer"), "ledge grabbing disabled");
        }
        if config.interact_layer.is_none() {
            tracing::warn!(error = %Error::MissingCollaborator("interact layer"), "interaction disabled");
        }
        Self {
            config,
            body,
            mode: Mode::Grounded,
            guards: Guards::default(),
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn body(&self) -> &CharacterBody {
        &self.body
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn tag(&self) -> ModeTag {
        self.mode.tag()
    }

    pub fn guards(&self) -> &Guards {
        &self.guards
    }

    /// Establish ground contact without moving, e.g. right after spawn
    pub fn settle(&mut self, physics: &dyn PhysicsQuery) -> bool {
        self.body.probe_ground(physics)
    }

    /// Advance by one fixed tick
    pub fn step(&mut self, input: &InputFrame, physics: &dyn PhysicsQuery, dt: f32) -> StepOutcome {
        let mut out = StepOutcome::default();
        self.guards.tick(dt);

        match self.mode {
            Mode::Grounded | Mode::Falling | Mode::Landing { .. } | Mode::Jumping => {
                self.step_free(input, physics, dt, &mut out)
            }
            Mode::LedgeGrabbed(hold) | Mode::LedgeTraversing(hold) => {
                self.step_ledge(hold, input, physics, dt, &mut out)
            }
            Mode::Climbing(climb) => self.step_climb(climb, input, physics, dt, &mut out),
            Mode::Interacting(interaction) => {
                self.step_interacting(interaction, input, physics, dt, &mut out)
            }
        }

        for rejection in &out.rejections {
            tracing::debug!(?rejection, mode = %self.mode.tag(), "input ignored");
        }
        out
    }

    /// End an interaction the actor did not choose to end
    ///
    /// Used when the object's authority reports a blocking collision, refuses
    /// the carry, or the object despawns. Returns the released target.
    pub fn force_release_interaction(&mut self) -> Option<EntityId> {
        let Mode::Interacting(interaction) = self.mode else {
            return None;
        };
        let mut out = StepOutcome::default();
        self.enter(Mode::Grounded, &mut out);
        tracing::debug!(entity = %interaction.target, "interaction released");
        Some(interaction.target)
    }

    /// Change mode, keeping the controller consistent with the new mode
    fn enter(&mut self, next: Mode, out: &mut StepOutcome) {
        let from = self.mode.tag();
        let to = next.tag();

        self.body.controller_enabled = !to.is_locked();
        self.mode = next;

        if from != to {
            tracing::trace!(%from, %to, "mode transition");
            out.transitions.push(Transition { from, to });
        }
    }

    fn move_direction(&self, input: &InputFrame) -> Vec3 {
        let raw = Vec3::new(input.move_axis.x, 0.0, input.move_axis.y);
        if raw.length() < self.config.dead_zone {
            Vec3::ZERO
        } else {
            raw.normalize_or_zero()
        }
    }

    fn apply_gravity(&mut self, dt: f32) {
        if self.body.grounded && self.body.velocity.y < 0.0 {
            self.body.velocity.y = self.config.ground_stick_velocity;
        } else {
            self.body.velocity.y += self.config.gravity * dt;
        }
    }

    fn step_free(
        &mut self,
        input: &InputFrame,
        physics: &dyn PhysicsQuery,
        dt: f32,
        out: &mut StepOutcome,
    ) {
        let mut mode = self.mode;

        match mode {
            Mode::Landing { .. } => {
                if input.jump {
                    out.reject(Rejection::InvalidTransition {
                        from: ModeTag::Landing,
                        to: ModeTag::Jumping,
                    });
                }
                if input.interact {
                    out.reject(Rejection::InvalidTransition {
                        from: ModeTag::Landing,
                        to: ModeTag::Interacting,
                    });
                }
            }
            Mode::Grounded if self.body.grounded => {
                if input.jump {
                    self.body.velocity.y = self.config.jump_force;
                    mode = Mode::Jumping;
                } else if input.interact && self.try_interact(physics, out) {
                    return;
                }
            }
            _ => {}
        }

        self.apply_gravity(dt);

        let locked = matches!(mode, Mode::Landing { .. });
        let horizontal = if locked {
            Vec3::ZERO
        } else {
            self.move_direction(input) * self.config.move_speed
        };
        self.body
            .move_by((horizontal + Vec3::Y * self.body.velocity.y) * dt, physics);
        if horizontal != Vec3::ZERO {
            self.body.face(horizontal);
        }

        let grounded = self.body.grounded;
        let falling = self.body.velocity.y < self.config.fall_velocity_threshold;
        mode = match mode {
            Mode::Grounded if !grounded && falling => Mode::Falling,
            Mode::Jumping if grounded && self.body.velocity.y <= 0.0 => Mode::Landing { elapsed: 0.0 },
            Mode::Jumping if !grounded && falling => Mode::Falling,
            Mode::Falling if grounded => Mode::Landing { elapsed: 0.0 },
            Mode::Landing { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.config.land_lock_duration {
                    Mode::Grounded
                } else {
                    Mode::Landing { elapsed }
                }
            }
            other => other,
        };
        self.enter(mode, out);

        if !self.body.grounded
            && matches!(self.mode, Mode::Grounded | Mode::Falling | Mode::Jumping)
        {
            self.scan_for_ledge(physics, out);
        }
    }

    fn scan_for_ledge(&mut self, physics: &dyn PhysicsQuery, out: &mut StepOutcome) {
        if !self.guards.can_grab() {
            return;
        }
        let Some(layer) = self.config.ledge_layer else {
            return;
        };

        tracing::trace!(from = %self.mode.tag(), "{}", ModeTag::LedgeScan);
        let Some(hit) = probes::scan_ledge(&self.config, layer, &self.body, physics) else {
            return;
        };

        let (position, rotation) = probes::grab_pose(&self.config, &hit, self.body.rotation);
        self.body.position = position;
        self.body.rotation = rotation;
        self.body.velocity = Vec3::ZERO;
        self.body.grounded = false;
        self.enter(Mode::LedgeGrabbed(LedgeHold::new(rotation)), out);
    }

    fn try_interact(&mut self, physics: &dyn PhysicsQuery, out: &mut StepOutcome) -> bool {
        let Some(layer) = self.config.interact_layer else {
            out.reject(Rejection::MissingCollaborator("interact layer"));
            return false;
        };
        let Some(target) = probes::probe_interact(&self.config, layer, &self.body, physics)
            .and_then(|hit| hit.entity)
        else {
            tracing::trace!("nothing to interact with");
            return false;
        };

        let interaction = Interaction {
            target,
            axis: None,
            rotation: self.body.rotation,
        };
        self.body.velocity = Vec3::new(0.0, self.config.ground_stick_velocity, 0.0);
        self.enter(Mode::Interacting(interaction), out);
        out.requests.push(MotionRequest::StartCarry { target });
        true
    }

    fn step_interacting(
        &mut self,
        mut interaction: Interaction,
        input: &InputFrame,
        physics: &dyn PhysicsQuery,
        dt: f32,
        out: &mut StepOutcome,
    ) {
        let target = interaction.target;

        if input.jump {
            out.reject(Rejection::InvalidTransition {
                from: ModeTag::Interacting,
                to: ModeTag::Jumping,
            });
        }
        if input.interact {
            out.requests.push(MotionRequest::StopCarry { target });
            self.enter(Mode::Grounded, out);
            return;
        }

        let (x, z) = (input.move_axis.x, input.move_axis.y);
        let dead_zone = self.config.dead_zone;
        if x.abs() < dead_zone && z.abs() < dead_zone {
            interaction.axis = None;
        } else if interaction.axis.is_none() {
            interaction.axis = Some(if x.abs() > z.abs() { Axis::X } else { Axis::Z });
        }

        let amount = match interaction.axis {
            Some(Axis::X) if x.abs() >= dead_zone => x.clamp(-1.0, 1.0),
            Some(Axis::Z) if z.abs() >= dead_zone => z.clamp(-1.0, 1.0),
            _ => 0.0,
        };
        let horizontal = interaction.axis.map_or(Vec3::ZERO, Axis::unit)
            * amount
            * self.config.move_speed
            * self.config.carry_speed_multiplier;

        self.body.rotation = interaction.rotation;
        self.apply_gravity(dt);
        self.body
            .move_by((horizontal + Vec3::Y * self.body.velocity.y) * dt, physics);

        if !self.body.grounded && self.body.velocity.y < self.config.fall_velocity_threshold {
            out.requests.push(MotionRequest::StopCarry { target });
            self.enter(Mode::Falling, out);
            return;
        }
        self.enter(Mode::Interacting(interaction), out);
    }

    fn step_ledge(
        &mut self,
        mut hold: LedgeHold,
        input: &InputFrame,
        physics: &dyn PhysicsQuery,
        dt: f32,
        out: &mut StepOutcome,
    ) {
        let from = self.mode.tag();
        hold.held_for += dt;
        self.body.rotation = hold.rotation;

        if input.interact {
            out.reject(Rejection::InvalidTransition {
                from,
                to: ModeTag::Interacting,
            });
        }

        if let Some(waited) = hold.climb_pending {
            let waited = waited + dt;
            if waited >= self.config.climb_confirm_delay {
                self.guards.climb_jump_cooldown = self.config.climb_jump_cooldown;
                let climb = Climb {
                    start: self.body.position,
                    forward: hold.rotation * Vec3::Z,
                    elapsed: 0.0,
                };
                self.enter(Mode::Climbing(climb), out);
            } else {
                hold.climb_pending = Some(waited);
                self.enter(Mode::LedgeGrabbed(hold), out);
            }
            return;
        }

        if input.release {
            self.release_ledge(out);
            return;
        }

        if input.jump {
            if hold.held_for < self.config.grab_jump_input_delay || !self.guards.can_climb() {
                out.reject(Rejection::CoolingDown {
                    from,
                    to: ModeTag::Climbing,
                });
            } else {
                hold.climb_pending = Some(0.0);
                self.enter(Mode::LedgeGrabbed(hold), out);
                return;
            }
        }

        let x = input.move_axis.x;
        let mut moved = false;
        if x.abs() >= self.config.dead_zone {
            let direction = if x > 0.0 {
                self.body.right()
            } else {
                -self.body.right()
            };
            let clear = !probes::blocked_laterally(&self.config, &self.body, direction, physics)
                && self.config.ledge_layer.is_some_and(|layer| {
                    probes::ledge_continues(&self.config, layer, &self.body, direction, physics)
                });
            if clear {
                self.body.position += direction * self.config.ledge_move_speed * dt;
                moved = true;
            }
        }

        let next = if moved {
            Mode::LedgeTraversing(hold)
        } else {
            Mode::LedgeGrabbed(hold)
        };
        self.enter(next, out);
    }

    fn release_ledge(&mut self, out: &mut StepOutcome) {
        let pushback = self.body.forward() * self.config.release_pushback;
        self.body.position -= pushback;
        self.body.velocity = Vec3::ZERO;
        self.body.grounded = false;
        self.guards.grab_cooldown = self.config.grab_cooldown;
        self.enter(Mode::Falling, out);
    }

    fn step_climb(
        &mut self,
        mut climb: Climb,
        input: &InputFrame,
        physics: &dyn PhysicsQuery,
        dt: f32,
        out: &mut StepOutcome,
    ) {
        if input.jump {
            out.reject(Rejection::InvalidTransition {
                from: ModeTag::Climbing,
                to: ModeTag::Jumping,
            });
        }
        if input.interact {
            out.reject(Rejection::InvalidTransition {
                from: ModeTag::Climbing,
                to: ModeTag::Interacting,
            });
        }

        climb.elapsed += dt;
        let t = (climb.elapsed / self.config.climb_duration).min(1.0);
        let up = (t / CLIMB_UP_SHARE).min(1.0);
        let over = ((t - CLIMB_UP_SHARE) / (1.0 - CLIMB_UP_SHARE)).clamp(0.0, 1.0);
        self.body.position = climb.start
            + Vec3::Y * (self.config.climb_height * up)
            + climb.forward * (self.config.climb_forward * over);

        if t < 1.0 {
            self.enter(Mode::Climbing(climb), out);
            return;
        }

        self.body.controller_enabled = true;
        self.body.velocity = Vec3::ZERO;
        let grounded = self.body.probe_ground(physics);
        self.guards.grab_cooldown = self.config.grab_cooldown;
        self.enter(if grounded { Mode::Grounded } else { Mode::Falling }, out);
    }
}
