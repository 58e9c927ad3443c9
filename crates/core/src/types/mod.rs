//! Core types for QuickImage identity.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod code;
pub mod credits;
pub mod email;
pub mod id;
pub mod phone;
pub mod status;

pub use code::{InvitationCode, InvitationCodeError};
pub use credits::Credits;
pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{Phone, PhoneError};
pub use status::*;
