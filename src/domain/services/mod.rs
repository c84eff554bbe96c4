//! Domain services
//!
//! Pure business logic that does not itself perform I/O: the
//! best-name heuristic shared by the directory resolver and the path
//! cache, and wildcard pattern matching for source path expansion.

pub mod naming;
pub mod wildcard;
