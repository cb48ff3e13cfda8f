// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stamp the processing level into the primary header of pipeline products.

use std::{ffi::CString, path::Path};

use fitsio::{errors::check_status as fits_check_status, FitsFile};

/// Write `PL_CMD` (the command line that produced the file) and `PL_LVL` (its
/// processing level) into the primary HDU of `file`.
pub(super) fn update_fits_header(
    file: &Path,
    command_line: &str,
    level: i64,
) -> Result<(), fitsio::errors::Error> {
    let mut fptr = FitsFile::edit(file)?;
    let hdu = fptr.primary_hdu()?;
    let mut status = 0;

    // Command lines are often longer than a single header card.
    let key_name = CString::new("PL_CMD")?;
    let value = CString::new(command_line)?;
    let comment = CString::new("Pipeline command")?;
    unsafe {
        // ffplsw = fits_write_key_longwarn
        fitsio_sys::ffplsw(fptr.as_raw(), &mut status);
        fits_check_status(status)?;
        // ffukls = fits_update_key_longstr
        fitsio_sys::ffukls(
            fptr.as_raw(),     /* I - FITS file pointer        */
            key_name.as_ptr(), /* I - name of keyword to write */
            value.as_ptr(),    /* I - keyword value            */
            comment.as_ptr(),  /* I - keyword comment          */
            &mut status,       /* IO - error status            */
        );
        fits_check_status(status)?;
    }
    hdu.write_key(&mut fptr, "PL_LVL", level)?;
    Ok(())
}
