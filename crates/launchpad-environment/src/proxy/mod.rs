// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Proxy module - reverse proxy backends.

pub mod mock;
pub mod nginx;
mod traits;

pub use mock::MockProxy;
pub use nginx::{NginxConfig, NginxProxy};
pub use traits::*;
