// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff (reading scans, globs).

mod glob;
pub mod read;

pub(crate) use self::glob::get_sorted_files_in_dir;
pub use self::glob::GlobError;
