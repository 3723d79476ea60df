//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` (or an open transaction) as the first argument.

pub mod assignment_repo;
pub mod quest_repo;
pub mod step_repo;

pub use assignment_repo::AssignmentRepo;
pub use quest_repo::QuestRepo;
pub use step_repo::StepRepo;
