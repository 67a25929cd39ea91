// ABOUTME: Version and banner constants for the CLI driver

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "Lotus Interpreter v1.0";
pub const WELCOME_SUBTITLE: &str = "A statically-typed imperative language in Rust";
