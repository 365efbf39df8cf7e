//! Terminal-facing pieces shared by the binary.

pub mod console;

pub use console::ConsoleReporter;
