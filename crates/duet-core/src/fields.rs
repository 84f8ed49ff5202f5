//! Names of the replicated fields used by actors and world objects

/// Actor or carried object position (`Vec3`)
pub const POSITION: &str = "position";
/// Actor or carried object rotation (`Quat`)
pub const ROTATION: &str = "rotation";
/// Actor locomotion mode code (`Int`, see [`ModeTag::as_code`](crate::ModeTag::as_code))
pub const MODE: &str = "mode";

/// Applied state index of a paintable, -1 while unset (`Int`)
pub const STATE_INDEX: &str = "state_index";
/// One-shot guard of a paintable or switch (`Bool`)
pub const USED: &str = "used";

/// Shared counter value (`Int`)
pub const COUNT: &str = "count";
/// Shared counter threshold (`Int`)
pub const TARGET: &str = "target";
/// Whether the threshold has been crossed (`Bool`)
pub const REACHED: &str = "reached";

/// Gate visibility (`Bool`)
pub const OPEN: &str = "open";

/// Current carrier of a carryable object (`EntityRef` or `Null`)
pub const CARRIER: &str = "carrier";

/// Countdown seconds left (`Float`)
pub const REMAINING: &str = "remaining";
/// Whether the countdown has expired (`Bool`)
pub const EXPIRED: &str = "expired";
