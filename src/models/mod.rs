//! Request and Response models for the node and registry APIs
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ApiQuery, NodePoolUpdate, PeerQuery, RegistrationRequest, ResolveRequest};
pub use responses::{ControllerStats, Envelope, HealthResponse, ResolvedInstance, SUCCESS_CODE};
