// ─── InterfaceOficial Core ───
// Version resolution, shared artifact cache and install engine for a
// Minecraft launcher.
//
// Architecture:
//   core/
//     version/    — Descriptor model, rules, arguments, inheritance resolver
//     game/       — On-disk layout + caching version repository
//     loaders/    — Library analyzer (which mod loaders a version carries)
//     maven/      — Artifact coordinate parser
//     cache/      — Content-addressed store + library index
//     task/       — Dependency-ordered async task engine
//     downloader/ — Network fetch with SHA-1 while streaming
//     install/    — Install tasks + graph builder
//     java/       — Java version constraints + runtime selection
//     state/      — Engine wiring the above together

pub mod cache;
pub mod config;
pub mod downloader;
pub mod error;
pub mod game;
pub mod http;
pub mod install;
pub mod java;
pub mod loaders;
pub mod maven;
pub mod state;
pub mod task;
pub mod version;
