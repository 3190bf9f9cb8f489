//! x11probe - Query the default X display through dynamically loaded Xlib
//!
//! Loads libX11, opens the display given as the first argument (falling
//! back to the DISPLAY environment variable), and prints the default
//! screen and root window. Mostly useful to verify that the loader and
//! binding layer work on a given machine.

use std::env;
use std::process;
use std::ptr;

use x11link::{Config, MemoryStack, Xlib};

fn main() {
    env_logger::init();

    let config = Config::from_env();
    let display_name = env::args().nth(1);

    let xlib = match Xlib::load(&config) {
        Ok(xlib) => xlib,
        Err(e) => {
            eprintln!("x11probe: {}", e);
            process::exit(1);
        }
    };
    log::info!("Loaded {}", xlib.library().name());

    let mut stack = MemoryStack::new();
    let display = unsafe {
        match &display_name {
            Some(name) => xlib.open_display_name(&mut stack, name),
            None => xlib.open_display(ptr::null()),
        }
    };
    if display.is_null() {
        eprintln!(
            "x11probe: cannot open display {}",
            display_name
                .or_else(|| env::var("DISPLAY").ok())
                .unwrap_or_else(|| "(unset)".to_string())
        );
        process::exit(1);
    }

    unsafe {
        let screen = xlib.default_screen(display);
        let root = xlib.root_window(display, screen);
        println!("default screen: {}", screen);
        println!("root window:    0x{:x}", root);
        xlib.close_display(display);
    }
}
