// Copyright 2025 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A bounded, strictly FIFO-fair resource pool for Async Rust.
//!
//! The pool manages a set of expensive-to-create, reusable resources (for
//! example backend connections) shared by concurrent consumers:
//!
//! - the number of tracked resources never exceeds `max`;
//! - the pool replenishes itself toward `min` after destructions, validating
//!   free resources on the way;
//! - callers that find the pool saturated wait in strict arrival order, and
//!   a released resource is handed directly to the oldest waiter;
//! - resources are validated on borrow and on return when the manager
//!   implements a health check.
//!
//! The pool is resource-agnostic and runtime-agnostic: it is parameterized
//! by a [`ManageResource`] implementation and never spawns tasks.
//!
//! Unlike drop-to-return pool designs, callers hand resources back
//! explicitly with [`Pool::release`] (or remove them with [`Pool::destroy`])
//! and misuse is reported: releasing an untracked handle or releasing the
//! same handle twice is an error, not a no-op.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//! use std::sync::atomic::AtomicUsize;
//! use std::sync::atomic::Ordering;
//!
//! struct Conn {
//!     id: usize,
//! }
//!
//! struct Manager {
//!     next_id: AtomicUsize,
//! }
//!
//! impl fairpool::ManageResource for Manager {
//!     type Resource = Conn;
//!     type Error = Infallible;
//!
//!     async fn create(&self) -> Result<Conn, Infallible> {
//!         let id = self.next_id.fetch_add(1, Ordering::Relaxed);
//!         Ok(Conn { id })
//!     }
//!
//!     async fn destroy(&self, _conn: &Conn) -> Result<(), Infallible> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = fairpool::PoolConfig::default().with_min(1).with_max(4);
//! let pool = fairpool::Pool::new(config, Manager { next_id: AtomicUsize::new(0) });
//!
//! pool.start().await.unwrap();
//! assert_eq!(pool.active(), 1);
//!
//! let conn = pool.acquire().await.unwrap();
//! assert_eq!(conn.id, 0);
//! pool.release(&conn).await.unwrap();
//! # }
//! ```

mod error;
mod manage;
mod pool;
mod sync;

pub use error::PoolError;
pub use manage::ManageResource;
pub use pool::Pool;
pub use pool::PoolConfig;
