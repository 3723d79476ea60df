//! Questy domain core.
//!
//! Pure, I/O-free building blocks shared by the persistence and transport
//! layers: identifier types, the [`error::CoreError`] taxonomy, quest and step
//! vocabulary, the assignment state machine and the [`quest_line::QuestLine`]
//! traversal engine.

pub mod answer;
pub mod assignment;
pub mod error;
pub mod pagination;
pub mod progression;
pub mod quest;
pub mod quest_line;
pub mod types;
