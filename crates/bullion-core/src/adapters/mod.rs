//! Provider adapters.
//!
//! | Adapter | Prices | News | Network |
//! |---------|--------|------|---------|
//! | [`SimulatedAdapter`] | deterministic grid | fixed headlines | no |
//! | [`YahooAdapter`] | chart endpoint | search endpoint | yes |
//! | [`ScriptedPriceSource`] / [`ScriptedNewsSource`] | queued responses | queued responses | no |

mod scripted;
mod simulated;
mod yahoo;

pub use scripted::{ScriptedNewsSource, ScriptedPriceSource};
pub use simulated::SimulatedAdapter;
pub use yahoo::YahooAdapter;
