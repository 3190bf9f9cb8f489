//! Shared library loading and function-address resolution
//!
//! This module wraps the platform's dynamic loading facility (dlopen on
//! Unix, LoadLibrary on Windows) behind a single [`SharedLibrary`] type.
//! The handle and every address resolved from it are immutable once
//! obtained, so a loaded library can be shared freely across threads.
//!
//! Missing symbols are not a policy decision made here: [`SharedLibrary::get`]
//! fails with [`Error::MissingSymbol`] while [`SharedLibrary::get_opt`]
//! logs and returns `None`, and the caller picks whichever suits the
//! entry point being resolved.

use std::ffi::{c_void, CString};
use std::fmt;
use std::ptr::NonNull;

use crate::config::Config;
use crate::error::{Error, Result};

/// Supported operating systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    FreeBsd,
    MacOs,
    Windows,
}

impl Platform {
    /// The platform this crate was compiled for
    pub fn current() -> Platform {
        #[cfg(target_os = "linux")]
        return Platform::Linux;

        #[cfg(target_os = "freebsd")]
        return Platform::FreeBsd;

        #[cfg(target_os = "macos")]
        return Platform::MacOs;

        #[cfg(target_os = "windows")]
        return Platform::Windows;

        #[cfg(not(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "macos",
            target_os = "windows"
        )))]
        compile_error!("unsupported platform");
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::FreeBsd => "freebsd",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        }
    }

    /// Map a logical library name to the platform's file name convention.
    ///
    /// `"X11"` becomes `libX11.so` on Linux/FreeBSD, `libX11.dylib` on
    /// macOS and `X11.dll` on Windows. Names that already carry an
    /// extension or path separator are returned unchanged.
    pub fn map_library_name(&self, name: &str) -> String {
        if name.contains('/') || name.contains('\\') || name.contains('.') {
            return name.to_string();
        }
        match self {
            Platform::Linux | Platform::FreeBsd => format!("lib{}.so", name),
            Platform::MacOs => format!("lib{}.dylib", name),
            Platform::Windows => format!("{}.dll", name),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A loaded native library
///
/// The underlying handle is closed when the value is dropped. Resolved
/// addresses stay valid for as long as the `SharedLibrary` is alive.
pub struct SharedLibrary {
    name: String,
    handle: NonNull<c_void>,
}

// The handle is written once at load time and only read afterwards.
unsafe impl Send for SharedLibrary {}
unsafe impl Sync for SharedLibrary {}

impl SharedLibrary {
    /// Load a library by name or path using the platform convention.
    pub fn open(name: &str) -> Result<SharedLibrary> {
        let handle = platform::open(name)?;
        log::debug!("Loaded library {} ({:p})", name, handle.as_ptr());
        Ok(SharedLibrary {
            name: name.to_string(),
            handle,
        })
    }

    /// Load the first candidate that resolves.
    ///
    /// Used for soname fallbacks, e.g. `["libX11.so.6", "libX11.so"]`.
    /// The returned error is the last candidate's failure.
    pub fn open_any(names: &[&str]) -> Result<SharedLibrary> {
        let mut last_err = Error::LibraryLoad {
            name: String::new(),
            reason: "no candidate names given".to_string(),
        };
        for name in names {
            match SharedLibrary::open(name) {
                Ok(lib) => return Ok(lib),
                Err(e) => {
                    log::debug!("Candidate {} not loadable: {}", name, e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    /// The name this library was opened with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a function entry point, failing if the symbol is missing.
    pub fn get(&self, symbol: &str) -> Result<NonNull<c_void>> {
        platform::sym(self.handle, symbol).ok_or_else(|| Error::MissingSymbol {
            library: self.name.clone(),
            symbol: symbol.to_string(),
        })
    }

    /// Resolve a function entry point, tolerating a missing symbol.
    ///
    /// Returns `None` (and logs a warning) when the symbol is absent.
    pub fn get_opt(&self, symbol: &str) -> Option<NonNull<c_void>> {
        let addr = platform::sym(self.handle, symbol);
        if addr.is_none() {
            log::warn!("Function {} missing from {}", symbol, self.name);
        }
        addr
    }

    /// Resolve an entry point honoring the configured missing-symbol policy.
    ///
    /// With `require_all_symbols` set this behaves like [`get`](Self::get)
    /// wrapped in `Some`; without it, a missing symbol is `Ok(None)`.
    pub fn lookup(&self, symbol: &str, config: &Config) -> Result<Option<NonNull<c_void>>> {
        if config.require_all_symbols {
            let addr = self.get(symbol)?;
            if config.debug {
                log::debug!("{}::{} -> {:p}", self.name, symbol, addr.as_ptr());
            }
            Ok(Some(addr))
        } else {
            let addr = self.get_opt(symbol);
            if config.debug {
                if let Some(a) = addr {
                    log::debug!("{}::{} -> {:p}", self.name, symbol, a.as_ptr());
                }
            }
            Ok(addr)
        }
    }
}

impl Drop for SharedLibrary {
    fn drop(&mut self) {
        platform::close(self.handle);
    }
}

impl fmt::Debug for SharedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLibrary")
            .field("name", &self.name)
            .field("handle", &self.handle.as_ptr())
            .finish()
    }
}

fn to_c_string(s: &str) -> CString {
    // Interior NUL cannot round-trip through the C loader API; truncating at
    // it matches what the native call would see anyway.
    CString::new(s).unwrap_or_else(|e| {
        let nul = e.nul_position();
        let mut bytes = e.into_vec();
        bytes.truncate(nul);
        CString::new(bytes).expect("truncated at first NUL")
    })
}

#[cfg(unix)]
mod platform {
    use super::*;
    use std::ffi::CStr;

    pub fn open(name: &str) -> Result<NonNull<c_void>> {
        let c_name = to_c_string(name);
        let handle = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        NonNull::new(handle).ok_or_else(|| Error::LibraryLoad {
            name: name.to_string(),
            reason: last_error(),
        })
    }

    pub fn sym(handle: NonNull<c_void>, symbol: &str) -> Option<NonNull<c_void>> {
        let c_symbol = to_c_string(symbol);
        NonNull::new(unsafe { libc::dlsym(handle.as_ptr(), c_symbol.as_ptr()) })
    }

    pub fn close(handle: NonNull<c_void>) {
        unsafe {
            libc::dlclose(handle.as_ptr());
        }
    }

    fn last_error() -> String {
        let msg = unsafe { libc::dlerror() };
        if msg.is_null() {
            "unknown dlopen error".to_string()
        } else {
            unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
        }
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows_sys::Win32::Foundation::GetLastError;
    use windows_sys::Win32::System::LibraryLoader::{
        FreeLibrary, GetProcAddress, LoadLibraryA,
    };

    pub fn open(name: &str) -> Result<NonNull<c_void>> {
        let c_name = to_c_string(name);
        let handle = unsafe { LoadLibraryA(c_name.as_ptr() as *const u8) };
        NonNull::new(handle as *mut c_void).ok_or_else(|| Error::LibraryLoad {
            name: name.to_string(),
            reason: format!("LoadLibrary failed (error {})", unsafe { GetLastError() }),
        })
    }

    pub fn sym(handle: NonNull<c_void>, symbol: &str) -> Option<NonNull<c_void>> {
        let c_symbol = to_c_string(symbol);
        let proc = unsafe { GetProcAddress(handle.as_ptr() as _, c_symbol.as_ptr() as *const u8) };
        proc.map(|p| {
            // FARPROC is a function pointer; the address itself is what we store.
            unsafe { NonNull::new_unchecked(p as *mut c_void) }
        })
    }

    pub fn close(handle: NonNull<c_void>) {
        unsafe {
            FreeLibrary(handle.as_ptr() as _);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_library_name() {
        assert_eq!(Platform::Linux.map_library_name("X11"), "libX11.so");
        assert_eq!(Platform::FreeBsd.map_library_name("X11"), "libX11.so");
        assert_eq!(Platform::MacOs.map_library_name("X11"), "libX11.dylib");
        assert_eq!(Platform::Windows.map_library_name("X11"), "X11.dll");
    }

    #[test]
    fn test_map_library_name_passthrough() {
        // Versioned sonames and paths are used as-is
        assert_eq!(Platform::Linux.map_library_name("libX11.so.6"), "libX11.so.6");
        assert_eq!(
            Platform::Linux.map_library_name("/usr/lib/libX11.so"),
            "/usr/lib/libX11.so"
        );
    }

    #[test]
    fn test_open_missing_library_reports_name() {
        let err = SharedLibrary::open("libx11link-does-not-exist.so").unwrap_err();
        match err {
            Error::LibraryLoad { name, .. } => {
                assert_eq!(name, "libx11link-does-not-exist.so");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
