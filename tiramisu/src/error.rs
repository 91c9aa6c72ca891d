// Tiramisu: Reachability Verification of Multi-Protocol Networks
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module containing all error types

use crate::netmodel::{LoadError, ModelError};
use crate::tpg::{QueryError, SimulationError};
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// The network model is inconsistent
    #[error("Model Error: {0}")]
    ModelError(#[from] ModelError),
    /// The configuration could not be loaded
    #[error("Load Error: {0}")]
    LoadError(#[from] LoadError),
    /// A single query could not be answered
    #[error("Query Error: {0}")]
    QueryError(#[from] QueryError),
    /// The path-vector simulation failed
    #[error("Simulation Error: {0}")]
    SimulationError(#[from] SimulationError),
}
