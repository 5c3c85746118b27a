//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): Network error codes matching `net_error_list.h`
//! - [`LoadState`](loadstate::LoadState): Request loading states from `load_states_list.h`
//! - [`LoadFlags`](loadflags::LoadFlags) and [`RequestPriority`](priority::RequestPriority)
//! - [`Completion`](completion::Completion): sync-or-async collaborator results
//! - [`isolation`]: sites, site-for-cookies and isolation keys

pub mod completion;
pub mod isolation;
pub mod loadflags;
pub mod loadstate;
pub mod neterror;
pub mod priority;
