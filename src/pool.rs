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

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::PoolError;
use crate::manage::ManageResource;
use crate::sync::Mutex;
use crate::sync::Waiter;

/// The configuration of [`Pool`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Minimum number of resources the pool keeps alive.
    ///
    /// The pool replenishes toward this count after destruction and on
    /// [`Pool::start`].
    pub min: usize,

    /// Maximum number of resources the pool tracks at once.
    ///
    /// Callers that would push the pool past this bound wait in FIFO order
    /// instead.
    pub max: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { min: 0, max: 1 }
    }
}

impl PoolConfig {
    /// Creates a new [`PoolConfig`].
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Returns a new [`PoolConfig`] with the specified minimum size.
    pub fn with_min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    /// Returns a new [`PoolConfig`] with the specified maximum size.
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    /// Clamps the bounds to a usable range: `max >= 1` and `min <= max`.
    fn constrained(mut self) -> Self {
        if self.max < 1 {
            self.max = 1;
        }
        if self.min > self.max {
            self.min = self.max;
        }
        self
    }
}

/// One tracked resource and its allocation flag.
struct Record<T> {
    resource: Arc<T>,
    allocated: bool,
}

struct PoolState<T> {
    /// Every resource the pool tracks, free and allocated alike.
    records: Vec<Record<T>>,
    /// Suspended `acquire` calls; insertion order is service order.
    queue: VecDeque<Arc<Waiter<Arc<T>>>>,
}

/// The decision an `acquire` call makes while holding the chain lock.
enum Decision<T> {
    Reuse(Arc<T>),
    Create,
    Wait(Arc<Waiter<Arc<T>>>),
}

/// Generic runtime-agnostic resource pool with `min`/`max` bounds, borrow
/// and return validation, and strictly FIFO service of saturated callers.
///
/// See the [module level documentation](crate) for more.
pub struct Pool<M: ManageResource> {
    config: PoolConfig,
    manager: M,

    /// Serializes the decision step of every `acquire` call in arrival
    /// order, so two concurrent callers can never both see "room under max"
    /// and both create.
    chain: mea::mutex::Mutex<()>,
    state: Mutex<PoolState<M::Resource>>,
}

impl<M: ManageResource> fmt::Debug for Pool<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.config)
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

impl<M: ManageResource> Pool<M> {
    /// Creates a new [`Pool`].
    ///
    /// The config is normalized first: `max` is clamped to at least 1 and
    /// `min` to at most `max`. No resources are created yet; call
    /// [`Pool::start`] to create the minimum eagerly, or let the first
    /// `acquire` do it lazily.
    pub fn new(config: PoolConfig, manager: M) -> Arc<Self> {
        let config = config.constrained();
        let state = Mutex::new(PoolState {
            records: Vec::with_capacity(config.max),
            queue: VecDeque::new(),
        });

        Arc::new(Self {
            config,
            manager,
            chain: mea::mutex::Mutex::new(()),
            state,
        })
    }

    /// Returns the number of resources the pool currently tracks, free and
    /// allocated alike.
    pub fn active(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Eagerly brings the pool up to its minimum size.
    ///
    /// Useful to fail fast on connectivity problems before first use. Lazy
    /// pools (`min == 0`) do not need this.
    pub async fn start(&self) -> Result<(), PoolError<M::Error>> {
        self.ensure_min_resources().await
    }

    /// Retrieves a resource from this [`Pool`].
    ///
    /// Reuses a free resource if one exists, creates a new one if the pool
    /// is under `max`, and otherwise suspends until [`Pool::release`] or
    /// [`Pool::destroy`] hands a resource over. Suspended callers are served
    /// strictly in arrival order, with no timeout; a caller that finds
    /// others already waiting queues behind them rather than jumping ahead.
    ///
    /// Fails only if resource creation fails for this specific call; the
    /// failure adds nothing to the pool and does not affect other callers.
    pub async fn acquire(&self) -> Result<Arc<M::Resource>, PoolError<M::Error>> {
        let waiter = {
            let _chain = self.chain.lock().await;

            self.ensure_min_resources().await?;

            let decision = {
                let mut state = self.state.lock();
                if !state.queue.is_empty() {
                    // Queued callers are older than this one. Reusing or
                    // creating past them would break FIFO and race the
                    // replenishment already on its way for them, pushing the
                    // pool over max once both creates land.
                    let waiter = Arc::new(Waiter::new());
                    state.queue.push_back(waiter.clone());
                    Decision::Wait(waiter)
                } else if let Some(record) = state.records.iter_mut().find(|r| !r.allocated) {
                    record.allocated = true;
                    Decision::Reuse(record.resource.clone())
                } else if state.records.len() < self.config.max {
                    Decision::Create
                } else {
                    let waiter = Arc::new(Waiter::new());
                    state.queue.push_back(waiter.clone());
                    Decision::Wait(waiter)
                }
            };

            match decision {
                Decision::Reuse(resource) => return Ok(resource),
                Decision::Create => return self.create_resource(true).await,
                Decision::Wait(waiter) => {
                    tracing::trace!("pool saturated; queueing acquire");
                    waiter
                }
            }

            // the chain lock is released here: a queued caller must not
            // block the decisions of callers that arrive after it
        };

        let guard = scopeguard::guard((), |()| self.abandon_waiter(&waiter));
        let resource = waiter.wait().await;
        scopeguard::ScopeGuard::into_inner(guard);
        Ok(resource)
    }

    /// Returns a resource to the pool.
    ///
    /// A valid resource goes straight to the oldest waiter if any caller is
    /// queued; it stays allocated throughout, never observably free. An
    /// invalid resource, or a valid one while the pool is above `min`, is
    /// destroyed instead; otherwise the resource is marked free for reuse.
    ///
    /// Fails with [`PoolError::NotFound`] for a handle this pool does not
    /// track and with [`PoolError::NotAllocated`] on double release.
    pub async fn release(&self, resource: &Arc<M::Resource>) -> Result<(), PoolError<M::Error>> {
        {
            let state = self.state.lock();
            let record = state
                .records
                .iter()
                .find(|r| Arc::ptr_eq(&r.resource, resource))
                .ok_or(PoolError::NotFound)?;
            if !record.allocated {
                return Err(PoolError::NotAllocated);
            }
        }

        let valid = self.manager.validate(resource).await;

        if valid {
            let handed_off = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(waiter) => {
                        waiter.grant(resource.clone());
                        true
                    }
                    None => false,
                }
            };
            if handed_off {
                tracing::trace!("released resource handed to the oldest waiter");
                return Ok(());
            }
        }

        let above_min = self.active() > self.config.min;
        if !valid || above_min {
            return self.destroy(resource).await;
        }

        let mut state = self.state.lock();
        if let Some(record) = state
            .records
            .iter_mut()
            .find(|r| Arc::ptr_eq(&r.resource, resource))
        {
            record.allocated = false;
        }
        Ok(())
    }

    /// Destroys a resource, removing it from the pool permanently.
    ///
    /// The record is removed whether or not the manager's destroy fails; a
    /// destroy error is still surfaced afterwards. On success the pool
    /// replenishes toward `min`, creates additional resources for queued
    /// callers (never exceeding `max`), and serves the queue in FIFO order.
    ///
    /// Fails with [`PoolError::NotFound`] for a handle this pool does not
    /// track.
    pub async fn destroy(&self, resource: &Arc<M::Resource>) -> Result<(), PoolError<M::Error>> {
        self.destroy_record(resource).await?;
        self.replenish_and_drain().await
    }

    /// Destroys a resource without replenishing afterwards.
    ///
    /// The validation sweep in `ensure_min_resources` uses this directly;
    /// replenishing there would recurse into the sweep.
    async fn destroy_record(
        &self,
        resource: &Arc<M::Resource>,
    ) -> Result<(), PoolError<M::Error>> {
        let tracked = {
            let state = self.state.lock();
            state
                .records
                .iter()
                .any(|r| Arc::ptr_eq(&r.resource, resource))
        };
        if !tracked {
            return Err(PoolError::NotFound);
        }

        let destroyed = self.manager.destroy(resource).await;

        // Removal is unconditional: a resource whose destroy failed must not
        // be handed out again.
        {
            let mut state = self.state.lock();
            if let Some(idx) = state
                .records
                .iter()
                .position(|r| Arc::ptr_eq(&r.resource, resource))
            {
                state.records.remove(idx);
            }
            tracing::debug!(active = state.records.len(), "destroyed pool resource");
        }
        destroyed.map_err(PoolError::Resource)
    }

    /// Replenishes after a destruction: back up to `min`, plus enough for
    /// the queued callers, then serves the queue.
    async fn replenish_and_drain(&self) -> Result<(), PoolError<M::Error>> {
        self.ensure_min_resources().await?;

        // Enough for both min and the queued callers, but never beyond max.
        // The remaining need is recomputed before every create, so creation
        // landing concurrently elsewhere shrinks it instead of stacking on
        // top of it.
        loop {
            let needed = {
                let state = self.state.lock();
                let active = state.records.len();
                (active + state.queue.len())
                    .min(self.config.max)
                    .max(self.config.min)
                    .saturating_sub(active)
            };
            if needed == 0 {
                break;
            }
            self.create_resource(false).await?;
        }

        self.drain_queue();
        Ok(())
    }

    /// Hands free resources to queued callers, oldest first, until the queue
    /// or the free set runs out.
    fn drain_queue(&self) {
        let mut state = self.state.lock();
        while !state.queue.is_empty() {
            let resource = match state.records.iter_mut().find(|r| !r.allocated) {
                Some(record) => {
                    record.allocated = true;
                    record.resource.clone()
                }
                None => break,
            };
            if let Some(waiter) = state.queue.pop_front() {
                waiter.grant(resource);
                tracing::trace!("handed a free resource to the oldest waiter");
            }
        }
    }

    /// Validates every free resource (destroying failures), then creates
    /// resources one at a time until the pool reaches `min`.
    ///
    /// Sequential creation bounds the simultaneous load on the backend and
    /// keeps ordering deterministic. Creation errors propagate to the caller
    /// that triggered the replenishment.
    async fn ensure_min_resources(&self) -> Result<(), PoolError<M::Error>> {
        let free: Vec<Arc<M::Resource>> = {
            let state = self.state.lock();
            state
                .records
                .iter()
                .filter(|r| !r.allocated)
                .map(|r| r.resource.clone())
                .collect()
        };
        for resource in free {
            if !self.manager.validate(&resource).await {
                tracing::debug!("free resource failed validation; destroying it");
                // a destroy failure must not stop the sweep or the top-up below
                if self.destroy_record(&resource).await.is_err() {
                    tracing::debug!("destroy of an invalid resource failed; continuing");
                }
            }
        }

        // Re-checked before every create for the same convergence reason as
        // the replenishment loop in `replenish_and_drain`.
        loop {
            let needed = {
                let state = self.state.lock();
                self.config.min.saturating_sub(state.records.len())
            };
            if needed == 0 {
                break;
            }
            self.create_resource(false).await?;
        }
        Ok(())
    }

    /// Creates one resource and starts tracking it. The record is inserted
    /// with the given allocation state so that an acquiring caller claims
    /// its new resource atomically with the insertion.
    async fn create_resource(
        &self,
        allocated: bool,
    ) -> Result<Arc<M::Resource>, PoolError<M::Error>> {
        let resource = self.manager.create().await.map_err(PoolError::Resource)?;
        let resource = Arc::new(resource);

        let mut state = self.state.lock();
        state.records.push(Record {
            resource: resource.clone(),
            allocated,
        });
        tracing::debug!(active = state.records.len(), "created pool resource");
        Ok(resource)
    }

    /// Cleans up after an `acquire` future that was dropped while queued.
    ///
    /// If a grant raced with the drop, the granted resource goes back to the
    /// free set and is offered to the next waiter; otherwise the waiter is
    /// simply removed from the queue. Grants only happen under the state
    /// lock, so holding it here rules out a concurrent grant.
    fn abandon_waiter(&self, waiter: &Arc<Waiter<Arc<M::Resource>>>) {
        let mut state = self.state.lock();
        match waiter.take() {
            Some(resource) => {
                if let Some(record) = state
                    .records
                    .iter_mut()
                    .find(|r| Arc::ptr_eq(&r.resource, &resource))
                {
                    record.allocated = false;
                }
                if !state.queue.is_empty() {
                    if let Some(record) = state.records.iter_mut().find(|r| !r.allocated) {
                        record.allocated = true;
                        let resource = record.resource.clone();
                        if let Some(next) = state.queue.pop_front() {
                            next.grant(resource);
                        }
                    }
                }
                tracing::trace!("queued acquire cancelled after grant; resource reassigned");
            }
            None => {
                if let Some(idx) = state.queue.iter().position(|w| Arc::ptr_eq(w, waiter)) {
                    state.queue.remove(idx);
                }
                tracing::trace!("queued acquire cancelled; waiter removed");
            }
        }
    }
}
