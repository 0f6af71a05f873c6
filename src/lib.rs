//! Streaming isometric tile terrain engine
//!
//! An endless board of stacked tiles: fractal terrain is generated chunk by
//! chunk as the viewport moves, annotated with per-cell face visibility, and
//! painted into a software canvas with an incremental repaint path that only
//! redraws the strips of screen a pan exposes.

pub mod canvas;
pub mod chunk;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod render;
pub mod stats;
pub mod terrain;
pub mod tileset;
pub mod transition;
pub mod view;
pub mod visibility;
pub mod world;
