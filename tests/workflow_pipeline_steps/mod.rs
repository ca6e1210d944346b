//! Step definitions for approval pipeline scenarios.


mod given;
