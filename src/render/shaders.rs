// src/render/shaders.rs
//
// Centralized shader sources.

pub const TERRAIN_WGSL: &str = include_str!("../shaders/terrain.wgsl");

pub const VS_ENTRY: &str = "vs_main";
pub const FS_BIOME_ENTRY: &str = "fs_biome";
pub const FS_WIREFRAME_ENTRY: &str = "fs_wireframe";

#[inline]
pub fn terrain_wgsl() -> &'static str {
    TERRAIN_WGSL
}
