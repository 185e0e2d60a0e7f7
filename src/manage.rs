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

use std::future::Future;

/// A trait whose instance creates, destroys, and optionally validates pooled
/// resources.
///
/// The pool knows nothing about the resources it manages beyond this trait.
/// `create` and `destroy` are mandatory; `validate` has a default
/// implementation that accepts every resource, so managers that have no
/// health check simply leave it out.
pub trait ManageResource: Send + Sync {
    /// The type of resources that this instance creates and destroys.
    type Resource: Send + Sync;

    /// The type of errors that `create` and `destroy` can return.
    type Error: Send;

    /// Creates a new resource.
    fn create(&self) -> impl Future<Output = Result<Self::Resource, Self::Error>> + Send;

    /// Destroys a resource.
    ///
    /// The pool stops tracking the resource whether or not this returns an
    /// error; the error is still surfaced to the caller that triggered the
    /// destruction.
    fn destroy(
        &self,
        resource: &Self::Resource,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Whether the resource is still healthy.
    ///
    /// Returning `false` causes the pool to destroy the resource instead of
    /// reusing it. There is no error channel here on purpose: a health check
    /// that cannot decide is indistinguishable from an unhealthy resource.
    fn validate(&self, _resource: &Self::Resource) -> impl Future<Output = bool> + Send {
        std::future::ready(true)
    }
}
