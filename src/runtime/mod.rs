// SPDX-License-Identifier: MIT

pub mod config;
pub mod error;
pub mod hooks;
pub mod sink;
