//! Domain layer for Cartoons

pub mod entities;
