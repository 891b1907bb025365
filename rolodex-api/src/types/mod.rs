//! API Request and Response Types
//!
//! View models returned by the REST routes. Entities and forms live in
//! `rolodex_core`; the types here add joins, counts and warnings.

// Contact types
mod contact;
pub use contact::*;

// Company, group and tag types
mod directory;
pub use directory::*;

// Note and task types
mod note;
pub use note::*;

// Activity and dashboard types
mod activity;
pub use activity::*;

// Demo data and upload types
mod demo;
pub use demo::*;
