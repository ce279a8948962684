//! C bindings.
//!
//! Every entry point takes a caller-owned [`ReaderContext`] handle created by
//! `amrex_reader_new` and released by `amrex_reader_free`. Status is reported
//! through `err` using the codes registered with `amrex_set_error_code`;
//! detail text goes to `msg`, NUL-terminated and truncated to `nmsg - 1`
//! bytes.

use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int};

use crate::context::ReaderContext;
use crate::error::PlotfileError;
use crate::status::{Severity, UNCONFIGURED_STATUS};
use crate::types::{GridBox, IntVect, NCOMP, SPACEDIM};

/************************* Handle *********************************/

#[unsafe(export_name = "amrex_reader_new")]
pub extern "C" fn amrex_reader_new() -> *mut ReaderContext {
    Box::into_raw(Box::new(ReaderContext::new()))
}

/// # Safety
/// `ctx` must be null or a pointer returned by `amrex_reader_new` that has
/// not been freed.
#[unsafe(export_name = "amrex_reader_free")]
pub unsafe extern "C" fn amrex_reader_free(ctx: *mut ReaderContext) {
    if !ctx.is_null() {
        drop(unsafe { Box::from_raw(ctx) });
    }
}

/// # Safety
/// `ctx` must be null or a live handle.
#[unsafe(export_name = "amrex_set_error_code")]
pub unsafe extern "C" fn amrex_set_error_code(
    ctx: *mut ReaderContext,
    noerror: c_int,
    severe: c_int,
    fatal: c_int,
) {
    if let Some(ctx) = unsafe { ctx.as_mut() } {
        ctx.configure_status_codes(noerror, severe, fatal);
    }
}

/************************* Reading *********************************/

/// Load the plotfile directory `name` and report its cell counts, origin,
/// cell size and time.
///
/// # Safety
/// `ctx` must be null or a live handle. `name` must be a NUL-terminated
/// string. `dims`, `origin` and `dx` must point to 3 writable elements,
/// `time` and `err` to one. `msg` must be null or hold `nmsg` bytes.
#[unsafe(export_name = "amrex_read_header")]
pub unsafe extern "C" fn amrex_read_header(
    ctx: *mut ReaderContext,
    name: *const c_char,
    dims: *mut c_int,
    origin: *mut c_double,
    dx: *mut c_double,
    time: *mut c_double,
    err: *mut c_int,
    msg: *mut c_char,
    nmsg: c_int,
) {
    let Some(ctx) = (unsafe { ctx.as_mut() }) else {
        unsafe { report(err, UNCONFIGURED_STATUS, msg, nmsg, Some("reader handle is null")) };
        return;
    };
    let fatal = ctx.status_code(Severity::Fatal);
    let no_error = ctx.status_code(Severity::NoError);

    if name.is_null() || dims.is_null() || origin.is_null() || dx.is_null() || time.is_null() {
        unsafe { report(err, fatal, msg, nmsg, Some("null argument")) };
        return;
    }
    let Ok(path) = unsafe { CStr::from_ptr(name) }.to_str() else {
        unsafe { report(err, fatal, msg, nmsg, Some("plotfile name is not valid UTF-8")) };
        return;
    };

    match ctx.load(path) {
        Ok(meta) => {
            unsafe {
                for d in 0..SPACEDIM {
                    *dims.add(d) = meta.dims[d];
                    *origin.add(d) = meta.origin[d];
                    *dx.add(d) = meta.cell_size[d];
                }
                *time = meta.time;
            }
            unsafe { report(err, no_error, msg, nmsg, None) };
        }
        Err(e) => unsafe { report(err, fatal, msg, nmsg, Some(&e.to_string())) },
    }
}

/// Fill `a` with the cells of the local box `a_lo..=a_hi`.
///
/// # Safety
/// `ctx` must be null or a live handle. `a_lo` and `a_hi` must point to 3
/// readable ints. `a` must hold `ncells * 3` doubles for a non-empty box.
/// `err` must be writable; `msg` must be null or hold `nmsg` bytes.
#[unsafe(export_name = "amrex_read_subdomain")]
pub unsafe extern "C" fn amrex_read_subdomain(
    ctx: *const ReaderContext,
    a: *mut c_double,
    a_lo: *const c_int,
    a_hi: *const c_int,
    err: *mut c_int,
    msg: *mut c_char,
    nmsg: c_int,
) {
    let Some(ctx) = (unsafe { ctx.as_ref() }) else {
        unsafe { report(err, UNCONFIGURED_STATUS, msg, nmsg, Some("reader handle is null")) };
        return;
    };
    let fatal = ctx.status_code(Severity::Fatal);

    if !ctx.dataset_loaded() {
        let text = PlotfileError::NotLoaded.to_string();
        unsafe { report(err, fatal, msg, nmsg, Some(&text)) };
        return;
    }
    if a_lo.is_null() || a_hi.is_null() {
        unsafe { report(err, fatal, msg, nmsg, Some("null argument")) };
        return;
    }

    let (lo, hi) = unsafe { (read_ivect(a_lo), read_ivect(a_hi)) };
    let query = GridBox { lo, hi };
    let len = if query.is_empty() {
        0
    } else {
        match query.num_cells().and_then(|n| n.checked_mul(NCOMP)) {
            Some(n) => n,
            None => {
                let text = PlotfileError::InvalidQuery(format!("query {query} is too large"));
                unsafe { report(err, fatal, msg, nmsg, Some(&text.to_string())) };
                return;
            }
        }
    };
    if len > 0 && a.is_null() {
        unsafe { report(err, fatal, msg, nmsg, Some("null output buffer")) };
        return;
    }

    let out: &mut [f64] = if len == 0 {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(a, len) }
    };

    match ctx.extract(lo, hi, out) {
        Ok(r) => {
            let code = ctx.status_code(r.severity);
            unsafe { report(err, code, msg, nmsg, r.message.as_deref()) };
        }
        Err(e) => unsafe { report(err, fatal, msg, nmsg, Some(&e.to_string())) },
    }
}

/************************* Helpers *********************************/

unsafe fn read_ivect(p: *const c_int) -> IntVect {
    IntVect(std::array::from_fn(|d| unsafe { *p.add(d) }))
}

/// Store `code` in `err` and, when given, `text` in `msg`.
unsafe fn report(err: *mut c_int, code: c_int, msg: *mut c_char, nmsg: c_int, text: Option<&str>) {
    if !err.is_null() {
        unsafe { *err = code };
    }
    if let Some(text) = text {
        unsafe { write_message(msg, nmsg, text) };
    }
}

unsafe fn write_message(msg: *mut c_char, nmsg: c_int, text: &str) {
    let Ok(cap) = usize::try_from(nmsg) else {
        return;
    };
    if msg.is_null() || cap == 0 {
        return;
    }
    let fitted = truncate_message(text, cap - 1);
    unsafe {
        std::ptr::copy_nonoverlapping(fitted.as_ptr().cast::<c_char>(), msg, fitted.len());
        *msg.add(fitted.len()) = 0;
    }
}

/// Longest prefix of `text` no longer than `max_bytes` that ends on a char
/// boundary.
fn truncate_message(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;
    use test_utils::{assert_approx_eq, expected_output, sentinel, PlotfileBuilder};

    fn message(buf: &[c_char]) -> String {
        let bytes: Vec<u8> = buf.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("hello", 10), "hello");
        assert_eq!(truncate_message("hello", 3), "hel");
        assert_eq!(truncate_message("hello", 0), "");
        // 'é' is two bytes
        assert_eq!(truncate_message("aé", 2), "a");
        assert_eq!(truncate_message("aé", 3), "aé");
    }

    #[test]
    fn test_write_message_terminates() {
        let mut buf = [1 as c_char; 4];
        unsafe { write_message(buf.as_mut_ptr(), 4, "abcdef") };
        assert_eq!(message(&buf), "abc");
        assert_eq!(buf[3], 0);

        let mut one = [1 as c_char; 1];
        unsafe { write_message(one.as_mut_ptr(), 1, "abc") };
        assert_eq!(one[0], 0);

        let mut untouched = [1 as c_char; 2];
        unsafe { write_message(untouched.as_mut_ptr(), 0, "abc") };
        assert_eq!(untouched, [1, 1]);
    }

    #[test]
    fn test_null_handle_reports_sentinel() {
        let mut err: c_int = 0;
        let mut buf = [0 as c_char; 64];
        let lo = [0; 3];
        let hi = [0; 3];
        unsafe {
            amrex_read_subdomain(
                ptr::null(),
                ptr::null_mut(),
                lo.as_ptr(),
                hi.as_ptr(),
                &mut err,
                buf.as_mut_ptr(),
                64,
            )
        };
        assert_eq!(err, UNCONFIGURED_STATUS);
        assert!(message(&buf).contains("null"));
    }

    #[test]
    fn test_subdomain_before_header() {
        let ctx = amrex_reader_new();
        unsafe { amrex_set_error_code(ctx, 0, 1, -1) };

        let mut a = [5.0f64; 3];
        let lo = [0; 3];
        let hi = [0; 3];
        let mut err: c_int = 99;
        let mut buf = [0 as c_char; 64];
        unsafe {
            amrex_read_subdomain(
                ctx,
                a.as_mut_ptr(),
                lo.as_ptr(),
                hi.as_ptr(),
                &mut err,
                buf.as_mut_ptr(),
                64,
            );
            amrex_reader_free(ctx);
        }
        assert_eq!(err, -1);
        assert_eq!(message(&buf), "plotfile header not loaded yet");
        assert_eq!(a, [5.0; 3]);
    }

    #[test]
    fn test_unconfigured_codes_use_sentinel() {
        let ctx = amrex_reader_new();
        let dir = tempfile::tempdir().unwrap();
        let name = std::ffi::CString::new(dir.path().to_str().unwrap()).unwrap();
        let mut dims = [0 as c_int; 3];
        let mut origin = [0.0; 3];
        let mut dx = [0.0; 3];
        let mut time = 0.0;
        let mut err: c_int = 0;
        let mut buf = [0 as c_char; 128];
        unsafe {
            amrex_read_header(
                ctx,
                name.as_ptr(),
                dims.as_mut_ptr(),
                origin.as_mut_ptr(),
                dx.as_mut_ptr(),
                &mut time,
                &mut err,
                buf.as_mut_ptr(),
                128,
            );
            amrex_reader_free(ctx);
        }
        assert_eq!(err, UNCONFIGURED_STATUS);
        assert!(message(&buf).starts_with("Failed to read"));
    }

    /// Run `amrex_read_subdomain` and return `(err, message)`.
    unsafe fn read_subdomain(
        ctx: *const ReaderContext,
        out: &mut [f64],
        lo: [c_int; 3],
        hi: [c_int; 3],
    ) -> (c_int, String) {
        let mut err: c_int = 99;
        let mut buf = [0 as c_char; 256];
        unsafe {
            amrex_read_subdomain(
                ctx,
                out.as_mut_ptr(),
                lo.as_ptr(),
                hi.as_ptr(),
                &mut err,
                buf.as_mut_ptr(),
                256,
            )
        };
        (err, message(&buf))
    }

    #[test]
    fn test_header_then_subdomains() {
        let plot = PlotfileBuilder::new()
            .grid([-4, 0, 0], [3, 3, 3])
            .grid_in_file([4, 0, 0], [11, 3, 3], 1)
            .prob_lo([-1.0, 0.0, 2.0])
            .cell_size([0.25, 0.5, 1.0])
            .time(2.5)
            .build()
            .unwrap();
        let name = CString::new(plot.path().to_str().unwrap()).unwrap();

        let ctx = amrex_reader_new();
        unsafe { amrex_set_error_code(ctx, 0, 1, -1) };

        let mut dims = [0 as c_int; 3];
        let mut origin = [0.0; 3];
        let mut dx = [0.0; 3];
        let mut time = 0.0;
        let mut err: c_int = 99;
        let mut buf = [0 as c_char; 128];
        unsafe {
            amrex_read_header(
                ctx,
                name.as_ptr(),
                dims.as_mut_ptr(),
                origin.as_mut_ptr(),
                dx.as_mut_ptr(),
                &mut time,
                &mut err,
                buf.as_mut_ptr(),
                128,
            )
        };
        assert_eq!(err, 0, "{}", message(&buf));
        assert_eq!(dims, [16, 4, 4]);
        assert_approx_eq!(origin[0], -2.0, 1e-12);
        assert_approx_eq!(origin[1], 0.0, 1e-12);
        assert_approx_eq!(origin[2], 2.0, 1e-12);
        assert_eq!(dx, [0.25, 0.5, 1.0]);
        assert_approx_eq!(time, 2.5, 1e-12);

        // local (2,1,0)..(9,2,3) is absolute (-2,1,0)..(5,2,3), across both files
        let mut a = vec![-7.0; 8 * 2 * 4 * 3];
        let (code, text) = unsafe { read_subdomain(ctx, &mut a, [2, 1, 0], [9, 2, 3]) };
        assert_eq!(code, 0, "{text}");
        assert_eq!(a, expected_output([-2, 1, 0], [5, 2, 3]));

        // one cell past the upper face on axis 0
        let mut b = vec![-7.0; 3 * 3];
        let (code, text) = unsafe { read_subdomain(ctx, &mut b, [14, 0, 0], [16, 0, 0]) };
        assert_eq!(code, 1);
        assert_eq!(
            text,
            "Available data domain: (0:15,0:3,0:3), ask for data on domain: (14:16,0:0,0:0)"
        );
        for (n, i) in [10, 11].into_iter().enumerate() {
            for c in 0..3 {
                assert_eq!(b[n * 3 + c], sentinel(c, [i, 0, 0]));
            }
        }
        assert_eq!(&b[6..], &[-7.0; 3]);

        unsafe { amrex_reader_free(ctx) };
    }
}
