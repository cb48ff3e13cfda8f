// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff: globs and checks that files, directories and programs are
//! usable before a pipeline run starts.

mod glob;
mod validation;

pub(crate) use self::glob::{get_all_matches_from_glob, glob_matches, GlobError};
pub(crate) use validation::{
    can_write_to_file, check_input_file, check_read_dir, check_write_dir, find_program,
    FileCheckError,
};
