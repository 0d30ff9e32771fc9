//! Actor registry: stake-backed capacity.
//!
//! An actor registers with a pool by staking `slots * amount_per_slot`. Each
//! slot is one concurrent duty: pools reserve a slot when they pick the actor
//! for a channel or challenge and return it when the duty ends. The registry
//! is the only writer of slot counts.

pub mod error;
pub mod record;
pub mod registry;
pub mod selection;

pub use error::RegistryError;
pub use record::ActorRecord;
pub use registry::ActorRegistry;
pub use selection::ActorSelector;
