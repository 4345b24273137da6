// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod commission;
pub mod config;
pub mod db;
pub mod directory;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod settlement;
pub mod utils;
pub mod wallet;

pub use engine::{Deadline, Engine};
pub use error::{EngineError, EngineResult};
