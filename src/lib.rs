// SPDX-License-Identifier: MIT

pub mod runtime;
pub mod strategy;
