//! Identity domain module
//!
//! Tutor accounts: registration, lookup and the credential check. The
//! registry never touches this module directly; it goes through the
//! `TutorDirectory` port, which `IdentityService` implements.
//!
//! Credentials are opaque strings compared verbatim. Hashing them is an
//! explicit non-goal of this system; they are kept inside this module and
//! never serialized outward.

mod entity;
mod error;
mod service;

pub use entity::{Tutor, TutorDraft};
pub use error::{IdentityError, Result};
pub use service::IdentityService;
