//! Command-line surface of the `paytpv` binary.

pub mod cli;
