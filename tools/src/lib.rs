//! Inspection and simulation tools for Opulent Voice Protocol stations.
//!
//! - Decode and print captured frames
//! - Drive a transmit pipeline from a scripted PTT session with a synthetic
//!   tone source and a constant-rate stand-in codec
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what went on the air.

mod inspect;
mod sim;

pub use inspect::{format_inspect_pretty, frame_type_name, inspect_frame, InspectReport, PREVIEW_LEN};
pub use sim::{
    run_session, Clock, FixedRateEncoder, LogIndicator, Recorder, SessionPlan, ToneBackend,
    ToneCapture, ToneSource,
};
