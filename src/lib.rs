//! Math Snake - a Snake game where the food answers an arithmetic question
//!
//! This library provides:
//! - Core game logic and the game loop controller (game module)
//! - High score persistence (storage module)
//! - Keyboard and swipe input mapping (input module)
//! - TUI rendering (render module)
//! - Run timing for the HUD (metrics module)
//! - The interactive terminal mode (modes module)
//! - File and default configuration (config module)

pub mod config;
pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod storage;
