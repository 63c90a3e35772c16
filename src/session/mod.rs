//! Busy state, spinner, status ticker and form state.
//!
//! A [`Session`] stands between orchestrators and the UI [`Controls`]. It
//! serialises top-level actions: [`Session::try_begin`] hands out at most one
//! [`BusyGuard`] at a time, and dropping the guard restores the UI whatever
//! the action's outcome.
//!
//! Two independent axes are tracked:
//!
//! - **busy**: inputs disabled and the status ticker running
//! - **spinner**: visible for at least a minimum time once shown, so a fast
//!   response does not make it flicker
//!
//! The status line is cleared only once both axes are idle.
//!
//! [`Controls`]: crate::traits::Controls

mod busy;
mod previews;

pub use busy::{format_status, BusyGuard, Phase, Session};
pub use previews::{ImagePreviews, MAX_PREVIEWS};
