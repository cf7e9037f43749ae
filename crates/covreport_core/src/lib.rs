//! Provide the canonical vocabulary of the coverage pipeline: external tool names, the exact flag spellings each
//! tool expects, and the file layout inside a build directory.
//!
//! ## Notes
//!
//! - This crate is pure: **no IO**, no process spawning, no global state.
//! - The flag spellings are a compatibility contract with CMake and the LLVM tools. Changing one changes what the
//!   external tool sees, so the unit tests pin them.

pub mod flags;
pub mod layout;
pub mod tools;
