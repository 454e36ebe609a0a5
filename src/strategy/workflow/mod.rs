// SPDX-License-Identifier: MIT

pub mod condition;
pub mod graph;
pub mod history;
pub mod loader;
pub mod nodes;
pub mod registry;
pub mod state;
