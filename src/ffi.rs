//! C ABI over the invoice pipeline, for hosts that link the `cdylib` or
//! `staticlib` build.
//!
//! # Contract
//!
//! Every exported symbol is `#[no_mangle] extern "C"` and prefixed with
//! `invoice_forge_`. Invoice input is the UTF-8 JSON form of
//! [`InvoiceDocument`] (not necessarily null-terminated).
//!
//! ## Memory management
//! - Buffers and strings returned by `invoice_forge_*` functions are allocated
//!   on the Rust heap.
//! - Callers **must** free them with `invoice_forge_free_buffer` /
//!   `invoice_forge_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int`:
//!   `0` success, `1` null pointer, `2` invalid UTF-8, `3` invalid invoice
//!   JSON, `4` export failed, `5` output contained a NUL byte.
//! - Error details can be retrieved via `invoice_forge_last_error`.
//!
//! ## Threads
//! - The last error is kept per thread.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;
use std::time::Duration;

use crate::model::{InvoiceDocument, InvoiceTheme};
use crate::pagination::PaginationMode;
use crate::pipeline::{export_pdf, render_export_html, PipelineConfig};
use crate::totals::compute_totals;

const ERR_NULL: c_int = 1;
const ERR_UTF8: c_int = 2;
const ERR_JSON: c_int = 3;
const ERR_EXPORT: c_int = 4;
const ERR_NUL_BYTE: c_int = 5;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

// ---------------------------------------------------------------------------
// C-compatible configuration types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub enum InvoiceForgePagination {
    Auto = 0,
    SinglePage = 1,
    Banded = 2,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub enum InvoiceForgeTheme {
    Light = 0,
    Dark = 1,
}

/// Optional configuration passed to the export functions.
///
/// Fields set to `0` (or `NULL`) fall back to their defaults:
/// - `title`              → "<title label> <invoice number>"
/// - `print_endpoint`     → none (client rasterization only)
/// - `print_timeout_secs` → 30
/// - `raster_scale`       → 2.0
#[repr(C)]
pub struct InvoiceForgeConfig {
    /// Null-terminated UTF-8 PDF title.
    pub title: *const c_char,
    /// Null-terminated UTF-8 print service URL.
    pub print_endpoint: *const c_char,
    pub print_timeout_secs: u32,
    pub raster_scale: f32,
    pub pagination: InvoiceForgePagination,
    pub app_theme: InvoiceForgeTheme,
}

/// # Safety
/// `p`, if non-null, must point to a valid null-terminated string.
unsafe fn opt_string(p: *const c_char) -> Option<String> {
    if p.is_null() {
        return None;
    }
    CStr::from_ptr(p)
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Convert an `InvoiceForgeConfig` (FFI) to a `PipelineConfig` (Rust).
///
/// # Safety
/// String fields, if non-null, must point to valid null-terminated strings.
unsafe fn pipeline_config_from_c(cfg: &InvoiceForgeConfig) -> PipelineConfig {
    let defaults = PipelineConfig::default();
    PipelineConfig {
        title: opt_string(cfg.title),
        print_endpoint: opt_string(cfg.print_endpoint),
        print_timeout: if cfg.print_timeout_secs == 0 {
            defaults.print_timeout
        } else {
            Duration::from_secs(cfg.print_timeout_secs as u64)
        },
        raster_scale: if cfg.raster_scale > 0.0 && cfg.raster_scale.is_finite() {
            cfg.raster_scale
        } else {
            defaults.raster_scale
        },
        pagination: match cfg.pagination {
            InvoiceForgePagination::Auto => PaginationMode::Auto,
            InvoiceForgePagination::SinglePage => PaginationMode::SinglePage,
            InvoiceForgePagination::Banded => PaginationMode::Banded,
        },
        app_theme: match cfg.app_theme {
            InvoiceForgeTheme::Light => InvoiceTheme::Light,
            InvoiceForgeTheme::Dark => InvoiceTheme::Dark,
        },
        ..defaults
    }
}

/// # Safety
/// `cfg`, if non-null, must point to a valid [`InvoiceForgeConfig`].
unsafe fn config_or_default(cfg: *const InvoiceForgeConfig) -> PipelineConfig {
    if cfg.is_null() {
        PipelineConfig::default()
    } else {
        pipeline_config_from_c(&*cfg)
    }
}

/// Decode the invoice JSON argument.
///
/// # Safety
/// `json_ptr` must point to `json_len` valid bytes.
unsafe fn read_document(json_ptr: *const u8, json_len: u32) -> Result<InvoiceDocument, c_int> {
    let bytes = slice::from_raw_parts(json_ptr, json_len as usize);
    let json = std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        ERR_UTF8
    })?;
    InvoiceDocument::from_json(json).map_err(|e| {
        set_last_error(&format!("Invalid invoice JSON: {e}"));
        ERR_JSON
    })
}

/// # Safety
/// `out` must be a valid pointer.
unsafe fn write_string(out: *mut *mut c_char, s: String) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            *out = cs.into_raw();
            0
        }
        Err(_) => {
            set_last_error("Output contained a null byte");
            *out = ptr::null_mut();
            ERR_NUL_BYTE
        }
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Export an invoice to PDF.
///
/// # Parameters
/// - `json_ptr`, `json_len`: UTF-8 invoice JSON
/// - `cfg`: optional pointer to an [`InvoiceForgeConfig`]; pass `NULL` for defaults
/// - `out_buf`, `out_len`: on success, the heap-allocated PDF bytes
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `invoice_forge_last_error`.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `cfg`, if non-null, must point to a fully-initialised [`InvoiceForgeConfig`].
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` by calling `invoice_forge_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn invoice_forge_export_pdf(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const InvoiceForgeConfig,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }
    let doc = match read_document(json_ptr, json_len) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let config = config_or_default(cfg);

    match export_pdf(&doc, &config, &mut |p| log::debug!("{p}")) {
        Ok(pdf) => {
            let len = pdf.bytes.len() as u32;
            let buf = pdf.bytes.into_boxed_slice();
            *out_buf = Box::into_raw(buf) as *mut u8;
            *out_len = len;
            0
        }
        Err(e) => {
            set_last_error(&e.message);
            ERR_EXPORT
        }
    }
}

/// Render the standalone print HTML for an invoice.
///
/// # Safety
/// Same as `invoice_forge_export_pdf`. `*out_html` must be freed with
/// `invoice_forge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn invoice_forge_render_html(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const InvoiceForgeConfig,
    out_html: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_html.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }
    let doc = match read_document(json_ptr, json_len) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let html = render_export_html(&doc, &config_or_default(cfg));
    write_string(out_html, html)
}

/// Compute the invoice totals and return them as JSON.
///
/// # Safety
/// `json_ptr` must point to `json_len` valid bytes and `out_json` must be a
/// valid pointer. `*out_json` must be freed with `invoice_forge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn invoice_forge_compute_totals(
    json_ptr: *const u8,
    json_len: u32,
    out_json: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_json.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }
    let doc = match read_document(json_ptr, json_len) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let totals = compute_totals(&doc.items, &doc.fees);
    match serde_json::to_string(&totals) {
        Ok(json) => write_string(out_json, json),
        Err(e) => {
            set_last_error(&format!("Failed to encode totals: {e}"));
            ERR_JSON
        }
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `invoice_forge_export_pdf`.
///
/// # Safety
/// `buf` must have been returned by `invoice_forge_export_pdf`, and `len`
/// must be the corresponding length.
#[no_mangle]
pub unsafe extern "C" fn invoice_forge_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by an `invoice_forge_*` function.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn invoice_forge_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next failing call on the same
/// thread. The caller should **not** free this pointer.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn invoice_forge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn invoice_forge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE: &[u8] = br#"{
        "id": "ffi",
        "meta": {"invoiceNumber": "INV-FFI"},
        "items": [{"id": "1", "name": "Design", "quantity": 2, "rate": "50"}]
    }"#;

    fn client_only_config(pagination: InvoiceForgePagination) -> InvoiceForgeConfig {
        InvoiceForgeConfig {
            title: ptr::null(),
            print_endpoint: ptr::null(),
            print_timeout_secs: 0,
            raster_scale: 1.0,
            pagination,
            app_theme: InvoiceForgeTheme::Light,
        }
    }

    #[test]
    fn ffi_export_pdf() {
        let cfg = client_only_config(InvoiceForgePagination::Banded);
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            invoice_forge_export_pdf(
                INVOICE.as_ptr(),
                INVOICE.len() as u32,
                &cfg,
                &mut out_buf,
                &mut out_len,
            )
        };

        assert_eq!(rc, 0, "Expected success");
        assert!(!out_buf.is_null());
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");
        unsafe { invoice_forge_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_render_html() {
        let mut html_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            invoice_forge_render_html(
                INVOICE.as_ptr(),
                INVOICE.len() as u32,
                ptr::null(),
                &mut html_ptr,
            )
        };
        assert_eq!(rc, 0);
        let html = unsafe { CStr::from_ptr(html_ptr) }.to_str().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("INV-FFI"));
        unsafe { invoice_forge_free_string(html_ptr) };
    }

    #[test]
    fn ffi_compute_totals() {
        let mut json_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            invoice_forge_compute_totals(INVOICE.as_ptr(), INVOICE.len() as u32, &mut json_ptr)
        };
        assert_eq!(rc, 0);
        let json = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["subtotal"], 100.0);
        assert_eq!(value["amountDue"], 100.0);
        unsafe { invoice_forge_free_string(json_ptr) };
    }

    #[test]
    fn ffi_null_input() {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe {
            invoice_forge_export_pdf(ptr::null(), 0, ptr::null(), &mut out_buf, &mut out_len)
        };
        assert_eq!(rc, ERR_NULL);
    }

    #[test]
    fn ffi_invalid_json_sets_last_error() {
        let bad = b"{not json";
        let mut json_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            invoice_forge_compute_totals(bad.as_ptr(), bad.len() as u32, &mut json_ptr)
        };
        assert_eq!(rc, ERR_JSON);
        let err = unsafe { CStr::from_ptr(invoice_forge_last_error()) }
            .to_str()
            .unwrap();
        assert!(err.starts_with("Invalid invoice JSON"), "{err}");
    }

    #[test]
    fn ffi_version() {
        let v = invoice_forge_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
