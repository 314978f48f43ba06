//! rigforge CLI library.
//!
//! The host side of a rig build: input loading, the editor session that
//! wraps each build in an undo chunk, and the command implementations.

pub mod commands;
pub mod input;
pub mod session;
