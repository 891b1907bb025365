//! Rolodex Storage - Backend Traits and Implementations
//!
//! Defines the seam between the services and the hosted backend: the
//! relational query API (`Backend`), bucket storage (`ObjectStore`), the
//! query model both speak, in-memory mocks for tests and the REST clients
//! used in production.

pub mod backend;
pub mod memory;
pub mod query;
pub mod rest;

pub use backend::{from_row, to_row, Backend, BackendExt, ObjectStore, Operation};
pub use memory::{MockBackend, MockObjectStore, StoredObject};
pub use query::{compare_values, Condition, Filter, Order, Query, Row};
pub use rest::{RestBackend, RestObjectStore};
