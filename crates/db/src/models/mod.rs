//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and the `Deserialize` DTOs used for writes.

pub mod assignment;
pub mod quest;
pub mod step;
