//SPDX-License-Identifier: MIT OR Apache-2.0

//! # automation_entities procedural macros
//!
//! This crate provides the `#[describe]` attribute for the
//! automation_entities tracing harness.  Use it through the re-export,
//! `automation_entities::describe`.
//!
//! ## Expansion
//!
//! ```rust
//! use automation_entities::{Context, Entity, NamedEntity, describe};
//!
//! struct Thermostat {
//!     entity: NamedEntity,
//! }
//!
//! impl Entity for Thermostat {
//!     fn context(&self) -> &Context { self.entity.context() }
//!     fn name(&self) -> &str { self.entity.name() }
//! }
//!
//! impl Thermostat {
//!     // This method:
//!     #[describe]
//!     fn set(&self, degrees: f32) -> bool {
//!         degrees < 30.0
//!     }
//!
//!     // expands to approximately:
//!     fn set_expanded(&self, degrees: f32) -> bool {
//!         let __ae_context = automation_entities::hidden::entity_context::<Self>(self);
//!         let __ae_args = automation_entities::hidden::Args::new().arg(&degrees).render();
//!         automation_entities::hidden::describe_call(
//!             &__ae_context,
//!             &automation_entities::hidden::qualname::<Self>("set"),
//!             __ae_args,
//!             || -> bool { degrees < 30.0 },
//!         )
//!     }
//! }
//! ```
//!
//! The parsing is done directly on the token stream; only the parts of the
//! signature the expansion needs are looked at.

use proc_macro::TokenStream;

mod describe_attr;

/// Traces each call of an entity method in the entity's context.
///
/// See `automation_entities::describe` for the user-facing documentation.
///
/// # Error Cases
///
/// Free functions have no entity to log through:
/// ```compile_fail
/// use automation_entities::describe;
///
/// #[describe]
/// fn lookup(user: &str) -> u32 {
///     user.len() as u32
/// }
/// # fn main() {}
/// ```
///
/// Async methods:
/// ```compile_fail
/// # use automation_entities::{Context, Entity, NamedEntity};
/// use automation_entities::describe;
/// # struct Api { entity: NamedEntity }
/// # impl Entity for Api {
/// #     fn context(&self) -> &Context { self.entity.context() }
/// #     fn name(&self) -> &str { self.entity.name() }
/// # }
///
/// impl Api {
///     #[describe]
///     async fn lookup(&self, user: &str) -> u32 {
///         user.len() as u32
///     }
/// }
/// # fn main() {}
/// ```
///
/// `impl Trait` return types, which can't be named in the expansion:
/// ```compile_fail
/// # use automation_entities::{Context, Entity, NamedEntity};
/// use automation_entities::describe;
/// # struct Api { entity: NamedEntity }
/// # impl Entity for Api {
/// #     fn context(&self) -> &Context { self.entity.context() }
/// #     fn name(&self) -> &str { self.entity.name() }
/// # }
///
/// impl Api {
///     #[describe]
///     fn users(&self) -> impl Iterator<Item = u32> {
///         0..3
///     }
/// }
/// # fn main() {}
/// ```
///
/// Methods of types that aren't entities:
/// ```compile_fail
/// use automation_entities::describe;
///
/// struct Plain;
///
/// impl Plain {
///     #[describe]
///     fn lookup(&self, user: &str) -> u32 {
///         user.len() as u32
///     }
/// }
/// # fn main() {}
/// ```
#[proc_macro_attribute]
pub fn describe(attr: TokenStream, item: TokenStream) -> TokenStream {
    describe_attr::describe_attr_impl(attr, item)
}
