//! Provider configuration as data.
//!
//! A [`ProviderDescriptor`] carries everything that differs between authorization servers:
//! protocol generation, endpoints, capability flags, wire quirks, and the user-info field
//! mapping. Clients read descriptors and never subclass per provider.

pub mod descriptor;
pub mod id;
pub mod user_info;

pub use descriptor::*;
pub use id::*;
pub use user_info::*;
