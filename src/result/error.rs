// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading or writing session results.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultReadError {
    #[error("When reading {file}, expected {expected:?} as the first 8 characters, got '{got}' instead!")]
    Magic {
        file: String,
        expected: &'static str,
        got: String,
    },

    #[error("{file} has result format version {got}, but only version {supported} is supported")]
    Version {
        file: String,
        got: u32,
        supported: u32,
    },

    #[error("The species label in {file} isn't valid UTF-8")]
    Species { file: String },

    #[error("{file} ends early: its {what} need {expected} bytes, but only {got} are left")]
    Truncated {
        file: String,
        what: &'static str,
        expected: u64,
        got: u64,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ResultWriteError {
    #[error("Result vectors must have equal lengths, but velocity has {velocity}, u1 has {u1} and u9 has {u9}")]
    BadShape { velocity: usize, u1: usize, u9: usize },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
