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

use std::fmt;
use std::sync::PoisonError;

use mea::latch::Latch;

/// A mutex that ignores poisoning.
///
/// Guards short, non-async critical sections only; never held across an
/// await point.
pub(crate) struct Mutex<T: ?Sized>(std::sync::Mutex<T>);

impl<T: ?Sized + fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> Mutex<T> {
    pub(crate) const fn new(t: T) -> Self {
        Self(std::sync::Mutex::new(t))
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One queued `acquire` call awaiting a direct hand-off.
///
/// `grant` fills the slot before it releases the latch, so a waiter that
/// finishes `wait` always finds the slot filled. All `grant` calls happen
/// while the pool state lock is held, which serializes them against waiter
/// abandonment.
pub(crate) struct Waiter<T> {
    slot: Mutex<Option<T>>,
    latch: Latch,
}

impl<T> Waiter<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            latch: Latch::new(1),
        }
    }

    /// Hands a value to this waiter and wakes it.
    pub(crate) fn grant(&self, value: T) {
        *self.slot.lock() = Some(value);
        self.latch.count_down();
    }

    /// Takes back an already-granted value without waiting, if any.
    pub(crate) fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    /// Suspends until a value is granted.
    pub(crate) async fn wait(&self) -> T {
        self.latch.wait().await;
        // SAFETY-adjacent invariant: `grant` fills the slot before counting
        // down the latch, and nothing else counts the latch down.
        self.slot.lock().take().expect("waiter woken without a grant")
    }
}
