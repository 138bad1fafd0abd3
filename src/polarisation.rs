// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The two receiver polarisations recorded in each scan.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::constants::{U1_COLUMN, U9_COLUMN};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum Polarisation {
    #[strum(serialize = "u1")]
    #[serde(rename = "u1")]
    U1,

    #[strum(serialize = "u9")]
    #[serde(rename = "u9")]
    U9,
}

impl Polarisation {
    /// The column of a raw scan containing this polarisation's amplitudes.
    pub fn scan_column(self) -> usize {
        match self {
            Polarisation::U1 => U1_COLUMN,
            Polarisation::U9 => U9_COLUMN,
        }
    }

    /// The index of this polarisation in a log's system-temperature list.
    pub fn tsys_index(self) -> usize {
        match self {
            Polarisation::U1 => 0,
            Polarisation::U9 => 1,
        }
    }
}
