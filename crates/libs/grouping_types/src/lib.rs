#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod bounding_box;
mod face;
mod file;
mod group;
mod ids;
mod input;
mod settings;

pub use bounding_box::*;
pub use face::*;
pub use file::*;
pub use group::*;
pub use ids::*;
pub use input::*;
pub use settings::*;
