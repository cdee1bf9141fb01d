#![warn(clippy::pedantic)]

pub mod build;
pub mod bytes;
pub mod descriptor;
pub mod game;
pub mod geometry;
pub mod image;
pub mod layout;
pub mod placement;
pub mod report;
pub mod rom;
pub mod save;
pub mod sector;
pub mod util;

pub use build::{BuildError, Builder, Compilation};
