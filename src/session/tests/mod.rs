//! Tests for the annotation session.
//!
//! `facade_tests` covers how the session keeps its parts consistent;
//! `scenario_tests` walks whole user flows from drawing to export.

mod facade_tests;
