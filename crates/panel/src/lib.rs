//! Proof-of-existence panel
//!
//! Thin wiring over the digest computer, the claim-state projector, and the
//! transaction dispatcher: file selection feeds the projector, action
//! triggers are checked against the derived action set and submitted, and
//! `view` exposes a plain-data snapshot for rendering. No independent
//! logic lives here.

pub mod panel;

pub use panel::{Panel, PanelError, PanelView};
