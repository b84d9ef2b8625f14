// Phishwatch: session-based phishing URL checks
//
// This is the library root. `verify` holds the core (validation, the
// submission lifecycle, history); `classifier` is the seam to the external
// detector; `output` renders snapshots for the terminal.

pub mod classifier;
pub mod config;
pub mod output;
pub mod verify;
