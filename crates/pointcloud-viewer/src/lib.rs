// src/lib.rs
//! Interactive point cloud viewer library.
//!
//! Loads a PLY point cloud, renders it with wgpu, lets the user orbit and pick
//! points, and reports the picked point's height and WGS-84 position.

pub mod app;
pub mod camera;
pub mod config;
pub mod loader;
pub mod picking;
pub mod renderer;
pub mod scene;
pub mod selection;
pub mod ui;
