//! Embedded CPython bridge for insitu.
//!
//! The simulation embeds an interpreter and exposes its data through a
//! native module named `libyt`. Startup is two-phase:
//!
//! 1. [`register`] appends `libyt` to the interpreter's init table. This
//!    must happen before the interpreter starts.
//! 2. [`activate`] imports `libyt` and then the user's analysis script
//!    into the running interpreter.
//!
//! [`start`] runs both phases around interpreter start-up for hosts that
//! don't manage the interpreter themselves.
//!
//! Analysis code calls `libyt.derived_func(gid, field_name)`, which is
//! served by the [`InSituContext`](insitu_core::InSituContext) installed
//! with [`install_context`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(unsafe_code)]

mod bootstrap;
mod error;
mod module;
mod session;

pub use bootstrap::{activate, phase, register, start, BootstrapPhase};
pub use module::{shared_dict, SharedDict, MODULE_NAME};
pub use session::{
    active_context, install_context, uninstall_context, withdraw_context, SharedContext,
};
