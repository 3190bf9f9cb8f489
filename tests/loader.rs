//! Loader integration tests against a real system library
//!
//! These exercise dlopen/dlsym through `SharedLibrary` using glibc, which
//! is present on any Linux host running the test suite. The libX11 binding
//! itself is not loaded here since test machines rarely have an X server
//! or even the client library installed.

#![cfg(target_os = "linux")]

use x11link::{Config, Error, SharedLibrary};

const LIBC: &[&str] = &["libc.so.6", "libc.so"];

#[test]
fn resolves_present_symbol() {
    let lib = SharedLibrary::open_any(LIBC).expect("libc should load");
    let addr = lib.get("strlen").expect("strlen should resolve");

    // The resolved entry point must actually be callable
    let strlen: unsafe extern "C" fn(*const std::os::raw::c_char) -> usize =
        unsafe { std::mem::transmute(addr.as_ptr()) };
    let len = unsafe { strlen(b"x11link\0".as_ptr() as *const std::os::raw::c_char) };
    assert_eq!(len, 7);
}

#[test]
fn missing_symbol_is_fatal_by_default() {
    let lib = SharedLibrary::open_any(LIBC).expect("libc should load");

    match lib.get("x11link_definitely_not_a_symbol") {
        Err(Error::MissingSymbol { library, symbol }) => {
            assert_eq!(symbol, "x11link_definitely_not_a_symbol");
            assert!(LIBC.contains(&library.as_str()));
        }
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("bogus symbol unexpectedly resolved"),
    }
}

#[test]
fn missing_symbol_tolerated_yields_no_address() {
    let lib = SharedLibrary::open_any(LIBC).expect("libc should load");

    assert!(lib.get_opt("x11link_definitely_not_a_symbol").is_none());
    assert!(lib.get_opt("strlen").is_some());
}

#[test]
fn lookup_honors_configured_policy() {
    let lib = SharedLibrary::open_any(LIBC).expect("libc should load");

    let strict = Config::default();
    assert!(lib.lookup("x11link_definitely_not_a_symbol", &strict).is_err());

    let tolerant = Config::permissive();
    let resolved = lib
        .lookup("x11link_definitely_not_a_symbol", &tolerant)
        .expect("tolerant lookup never fails");
    assert!(resolved.is_none());
}

#[test]
fn open_any_falls_through_to_later_candidates() {
    let lib = SharedLibrary::open_any(&["libx11link-no-such-library.so", "libc.so.6"])
        .expect("second candidate should load");
    assert_eq!(lib.name(), "libc.so.6");
}

#[test]
fn open_failure_reports_loader_reason() {
    let err = SharedLibrary::open("libx11link-no-such-library.so").unwrap_err();
    match err {
        Error::LibraryLoad { name, reason } => {
            assert_eq!(name, "libx11link-no-such-library.so");
            assert!(!reason.is_empty());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
