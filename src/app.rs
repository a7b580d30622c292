//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the search box, the
//! result list, selection and focus. Playback state lives in the transport.

mod model;

pub use model::*;
