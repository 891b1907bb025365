//! Rolodex Core - Entity Types
//!
//! Pure data structures, form validation and configuration with no I/O.
//! All other crates depend on this.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod forms;
pub mod identity;

pub use config::*;
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use forms::*;
pub use identity::*;
