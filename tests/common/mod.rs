#![allow(dead_code, unused_imports)] // Not every test module uses every helper

pub mod fake_runner;
pub mod helpers;

pub use fake_runner::{FakeRunner, ScriptedRun};
pub use helpers::{RecordingSink, args_of, fake_tools, touch, touch_tool};
