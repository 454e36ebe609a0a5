// SPDX-License-Identifier: MIT

//! Run-scoped state for workflow executions
//!
//! `RunState` lives exactly as long as one run: node outputs keyed by node
//! id, plus named variables written and read by node behaviors.

mod store;

pub use store::RunState;
