// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Wideband pulsar timing tools for CHIME fold-mode data: DM refinement of pulse
portraits and a pipeline that reduces archives into wideband TOAs.
 */

pub mod constants;
pub mod dedisperse;
pub mod dm_search;
pub mod math;
pub mod pipeline;
pub mod portrait;

mod cli;
mod io;
#[cfg(feature = "plotting")]
mod plotting;
#[cfg(test)]
mod tests;

use crossbeam_utils::atomic::AtomicCell;

// Re-exports.
pub use cli::{ChimeWb, ChimeWbError};
pub use dm_search::{search, DmSearchError, DmSearchResult};
pub use portrait::{read_portrait, write_portrait, Portrait, PortraitError, Subband};

lazy_static::lazy_static! {
    /// Should progress bars be drawn? Off unless the CLI turns them on.
    pub(crate) static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}
