pub mod events;
pub mod tick;
pub mod timers;

pub use events::{EventBus, SubscriptionId};
pub use tick::{Simulation, StepReport, TickConfig, TickLoop};
pub use timers::{TimerId, TimerQueue};
