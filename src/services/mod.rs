/// Owner operations on game definitions.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Player-facing operations: join, poll, answer, results.
pub mod player_service;
/// Leaderboard and statistics projection.
pub mod results;
/// Answer judging.
pub mod scoring;
/// Owner-driven session lifecycle.
pub mod session_service;
