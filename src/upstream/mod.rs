//! Clients for the external collaborators: the identity provider and the
//! multimodal model.

pub mod identity;
pub mod model;

pub use identity::SupabaseIdentity;
pub use model::{ChartModel, GeminiModel, ModelError};
