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

/// Errors returned by pool operations.
///
/// `E` is the manager's error type ([`ManageResource::Error`]); it is carried
/// through unchanged in [`PoolError::Resource`].
///
/// [`ManageResource::Error`]: crate::ManageResource::Error
#[derive(Debug, thiserror::Error)]
pub enum PoolError<E> {
    /// The handle passed to `release` or `destroy` is not tracked by this
    /// pool.
    #[error("resource not found in pool")]
    NotFound,

    /// `release` was called on a resource that is tracked but not currently
    /// allocated, i.e. a double release.
    #[error("resource not currently allocated")]
    NotAllocated,

    /// The manager failed to create or destroy a resource.
    #[error("failed to create or destroy a resource")]
    Resource(E),
}

impl<E> PoolError<E> {
    /// Returns the underlying manager error, if this is a lifecycle failure.
    pub fn into_resource_error(self) -> Option<E> {
        match self {
            PoolError::Resource(error) => Some(error),
            _ => None,
        }
    }
}
