//! Capability profiles and the profile-scoped toolbox.
//!
//! Each agent is bound to a fixed subset of the tool registry. The subset is
//! validated once at startup and enforced on every call through
//! [`ScopedToolbox`].

pub mod profile;
pub mod toolbox;

pub use profile::{CapabilityProfiles, ProfileError};
pub use toolbox::ScopedToolbox;
