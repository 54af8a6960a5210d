//! `fleet-dispatch` — who goes where: the policy trait, vehicle actions, and
//! the greedy auto-pilot.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`action`]  | `Action` enum (`MoveTo`, cargo and vehicle load / unload)     |
//! | [`context`] | `DispatchContext<'a>` — read-only step view for policies      |
//! | [`policy`]  | `DispatchPolicy` trait                                       |
//! | [`auto`]    | `AutoAgent` — nearest-target greedy heuristic                |
//! | [`idle`]    | `IdlePolicy` — placeholder that never acts                   |
//! | [`error`]   | `DispatchError`, `DispatchResult<T>`                         |
//!
//! # Design notes
//!
//! A step in `fleet-sim` has two phases:
//!
//! 1. **Decide**: every vehicle's policy call reads the store through a
//!    shared `&DispatchContext`.  No mutation.
//! 2. **Apply**: the collected actions run against `&mut StateStore` in
//!    vehicle order.
//!
//! Policies therefore never see a half-applied step.

pub mod action;
pub mod auto;
pub mod context;
pub mod error;
pub mod idle;
pub mod policy;


pub use action::Action;
pub use auto::AutoAgent;
pub use context::DispatchContext;
pub use error::{DispatchError, DispatchResult};
pub use idle::IdlePolicy;
pub use policy::DispatchPolicy;
