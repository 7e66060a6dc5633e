//! HTTP handlers for the Cartoons domain

pub mod cartoons;
