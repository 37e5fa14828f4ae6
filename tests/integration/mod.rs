//! End-to-end tests through the public API: templates compiled against real
//! Java and Kotlin sources, searched and rewritten.

mod overlap;
mod properties;
mod scenarios;
