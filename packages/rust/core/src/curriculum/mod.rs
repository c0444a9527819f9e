//! Curriculum generation: per-domain learning paths, the generator that
//! assembles them into a curriculum, and the best-practice rules it is
//! checked against.

pub mod best_practices;
pub mod generator;
pub mod learning_path;

pub use best_practices::{BestPracticesEngine, RULES};
pub use generator::{CurriculumGenerator, default_title};
pub use learning_path::LearningPathBuilder;
