#![forbid(unsafe_code)]

//! Keeps a client's view of a Flamenco Manager in sync: fetch, cache on disk,
//! and re-validate the user's job type and worker tag choices.

pub mod cache;
pub mod codec;
pub mod fetch;
pub mod items;
pub mod model;
pub mod reconcile;
pub mod refresh;

pub use cache::*;
pub use codec::{decode, encode, ApiModel, DecodeError, RegistryEntry, TYPE_REGISTRY};
pub use fetch::*;
pub use items::*;
pub use model::*;
pub use reconcile::*;
pub use refresh::*;
