//! Simulation context: seeded RNG, tuning, and the outbound event queue.
//!
//! Passed explicitly into every update call so the core has no ambient
//! global state and is replayable in tests: same seed plus same inputs
//! gives an identical run.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::tuning::Tuning;

/// Discrete fire-and-forget events for collaborators (audio, particles,
/// scenes). Emitted at transition points; the core never awaits a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Jump,
    Coin,
    Hurt,
    Stomp,
    EnemyDeath,
    /// A breakable tile was cleared.
    Break,
    /// The player's power tier increased.
    PowerUp,
    /// The player dropped a power tier after a hit.
    PowerDown,
    Throw,
    OneUp,
    BossEnraged,
    /// The player entered the exit region.
    Victory,
    /// Lives reached zero.
    PlayerDefeated,
}

/// Everything an update call may draw on besides the level itself.
#[derive(Debug)]
pub struct SimulationContext {
    pub rng: Pcg32,
    pub tuning: Tuning,
    events: Vec<SimEvent>,
}

impl SimulationContext {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            events: Vec::with_capacity(16),
        }
    }

    /// Queue an event for collaborators to pick up after the tick.
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last drain, in emission order.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Hand the queued events to a collaborator and clear the queue.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
