//! Dynamically loaded libX11 bindings
//!
//! This module exposes a small slice of Xlib: display open/close, screen
//! and root window queries, colormap and window creation/destruction, and
//! `XFree`. Entry points are resolved eagerly by exact symbol name when
//! [`Xlib::load`] runs and are immutable afterwards.
//!
//! The binding is a pure pass-through. Arguments are forwarded unchanged,
//! results come back uninterpreted, and native resource handles (displays,
//! windows, colormaps) carry no lifetime tracking here - their validity is
//! governed entirely by the X server and the caller. Call failures are
//! reported through Xlib's own error handler convention, never through
//! this layer. Non-null display validation runs in debug builds only.

#![allow(non_upper_case_globals)]
#![allow(non_snake_case)]

use std::mem;
use std::os::raw::{c_char, c_int, c_long, c_uint, c_ulong, c_void};

use crate::config::Config;
use crate::error::Result;
use crate::loader::SharedLibrary;
use crate::stack::MemoryStack;
use crate::tokens::TokenDef;

/// Generic X resource ID (29-bit in the protocol)
pub type XID = c_ulong;
pub type Window = XID;
pub type Pixmap = XID;
pub type Colormap = XID;
pub type Cursor = XID;
pub type Bool = c_int;

/// Opaque connection to the X server
#[repr(C)]
pub struct Display([u8; 0]);

/// Opaque visual type
#[repr(C)]
pub struct Visual([u8; 0]);

/// Window attributes for `XCreateWindow` / `XChangeWindowAttributes`,
/// selected by the CW* bits of the value mask.
#[repr(C)]
pub struct XSetWindowAttributes {
    pub background_pixmap: Pixmap,
    pub background_pixel: c_ulong,
    pub border_pixmap: Pixmap,
    pub border_pixel: c_ulong,
    pub bit_gravity: c_int,
    pub win_gravity: c_int,
    pub backing_store: c_int,
    pub backing_planes: c_ulong,
    pub backing_pixel: c_ulong,
    pub save_under: Bool,
    pub event_mask: c_long,
    pub do_not_propagate_mask: c_long,
    pub override_redirect: Bool,
    pub colormap: Colormap,
    pub cursor: Cursor,
}

// Declares the constants and the static TOKENS table over them in one
// place, so debug display can never drift from the definitions.
macro_rules! x11_tokens {
    ($($name:ident = $value:expr),* $(,)?) => {
        $(pub const $name: c_int = $value;)*

        /// Every constant in this module, for [`crate::tokens::token_map`]
        pub const TOKENS: &[TokenDef] = &[
            $(TokenDef { name: stringify!($name), value: $name }),*
        ];
    };
}

x11_tokens! {
    // Boolean values
    True = 1,
    False = 0,

    // Reserved resource and constant definitions
    None = 0,
    ParentRelative = 1,
    CopyFromParent = 0,
    PointerWindow = 0,
    InputFocus = 1,
    PointerRoot = 1,
    AnyPropertyType = 0,
    AnyKey = 0,
    AnyButton = 0,
    AllTemporary = 0,
    CurrentTime = 0,
    NoSymbol = 0,

    // Error codes
    Success = 0,
    BadRequest = 1,
    BadValue = 2,
    BadWindow = 3,
    BadPixmap = 4,
    BadAtom = 5,
    BadCursor = 6,
    BadFont = 7,
    BadMatch = 8,
    BadDrawable = 9,
    BadAccess = 10,
    BadAlloc = 11,
    BadColor = 12,
    BadGC = 13,
    BadIDChoice = 14,
    BadName = 15,
    BadLength = 16,
    BadImplementation = 17,

    // Window attribute bits for CreateWindow and ChangeWindowAttributes
    CWBackPixmap = 1 << 0,
    CWBackPixel = 1 << 1,
    CWBorderPixmap = 1 << 2,
    CWBorderPixel = 1 << 3,
    CWBitGravity = 1 << 4,
    CWWinGravity = 1 << 5,
    CWBackingStore = 1 << 6,
    CWBackingPlanes = 1 << 7,
    CWBackingPixel = 1 << 8,
    CWOverrideRedirect = 1 << 9,
    CWSaveUnder = 1 << 10,
    CWEventMask = 1 << 11,
    CWDontPropagate = 1 << 12,
    CWColormap = 1 << 13,
    CWCursor = 1 << 14,

    // Input event masks (event-mask attribute and Grab request arguments)
    NoEventMask = 0,
    KeyPressMask = 1 << 0,
    KeyReleaseMask = 1 << 1,
    ButtonPressMask = 1 << 2,
    ButtonReleaseMask = 1 << 3,
    EnterWindowMask = 1 << 4,
    LeaveWindowMask = 1 << 5,
    PointerMotionMask = 1 << 6,
    PointerMotionHintMask = 1 << 7,
    Button1MotionMask = 1 << 8,
    Button2MotionMask = 1 << 9,
    Button3MotionMask = 1 << 10,
    Button4MotionMask = 1 << 11,
    Button5MotionMask = 1 << 12,
    ButtonMotionMask = 1 << 13,
    KeymapStateMask = 1 << 14,
    ExposureMask = 1 << 15,
    VisibilityChangeMask = 1 << 16,
    StructureNotifyMask = 1 << 17,
    ResizeRedirectMask = 1 << 18,
    SubstructureNotifyMask = 1 << 19,
    SubstructureRedirectMask = 1 << 20,
    FocusChangeMask = 1 << 21,
    PropertyChangeMask = 1 << 22,
    ColormapChangeMask = 1 << 23,
    OwnerGrabButtonMask = 1 << 24,

    // Event names; 0 and 1 are reserved in the protocol for errors and replies
    KeyPress = 2,
    KeyRelease = 3,
    ButtonPress = 4,
    ButtonRelease = 5,
    MotionNotify = 6,
    EnterNotify = 7,
    LeaveNotify = 8,
    FocusIn = 9,
    FocusOut = 10,
    KeymapNotify = 11,
    Expose = 12,
    GraphicsExpose = 13,
    NoExpose = 14,
    VisibilityNotify = 15,
    CreateNotify = 16,
    DestroyNotify = 17,
    UnmapNotify = 18,
    MapNotify = 19,
    MapRequest = 20,
    ReparentNotify = 21,
    ConfigureNotify = 22,
    ConfigureRequest = 23,
    GravityNotify = 24,
    ResizeRequest = 25,
    CirculateNotify = 26,
    CirculateRequest = 27,
    PropertyNotify = 28,
    SelectionClear = 29,
    SelectionRequest = 30,
    SelectionNotify = 31,
    ColormapNotify = 32,
    ClientMessage = 33,
    MappingNotify = 34,
    GenericEvent = 35,
    LASTEvent = 36,

    // Key masks
    ShiftMask = 1 << 0,
    LockMask = 1 << 1,
    ControlMask = 1 << 2,
    Mod1Mask = 1 << 3,
    Mod2Mask = 1 << 4,
    Mod3Mask = 1 << 5,
    Mod4Mask = 1 << 6,
    Mod5Mask = 1 << 7,

    // Modifier names, corresponding to the masks above
    ShiftMapIndex = 0,
    LockMapIndex = 1,
    ControlMapIndex = 2,
    Mod1MapIndex = 3,
    Mod2MapIndex = 4,
    Mod3MapIndex = 5,
    Mod4MapIndex = 6,
    Mod5MapIndex = 7,

    // Button masks
    Button1Mask = 1 << 8,
    Button2Mask = 1 << 9,
    Button3Mask = 1 << 10,
    Button4Mask = 1 << 11,
    Button5Mask = 1 << 12,
    AnyModifier = 1 << 15,

    // Button names
    Button1 = 1,
    Button2 = 2,
    Button3 = 3,
    Button4 = 4,
    Button5 = 5,

    // Notify modes
    NotifyNormal = 0,
    NotifyGrab = 1,
    NotifyUngrab = 2,
    NotifyWhileGrabbed = 3,
    NotifyHint = 1,

    // Notify detail
    NotifyAncestor = 0,
    NotifyVirtual = 1,
    NotifyInferior = 2,
    NotifyNonlinear = 3,
    NotifyNonlinearVirtual = 4,
    NotifyPointer = 5,
    NotifyPointerRoot = 6,
    NotifyDetailNone = 7,

    // Visibility notify
    VisibilityUnobscured = 0,
    VisibilityPartiallyObscured = 1,
    VisibilityFullyObscured = 2,

    // Circulation request
    PlaceOnTop = 0,
    PlaceOnBottom = 1,

    // Property notification
    PropertyNewValue = 0,
    PropertyDelete = 1,

    // Colormap notification
    ColormapUninstalled = 0,
    ColormapInstalled = 1,

    // Grab modes
    GrabModeSync = 0,
    GrabModeAsync = 1,

    // GrabPointer, GrabKeyboard reply status
    GrabSuccess = 0,
    AlreadyGrabbed = 1,
    GrabInvalidTime = 2,
    GrabNotViewable = 3,
    GrabFrozen = 4,

    // AllowEvents modes
    AsyncPointer = 0,
    SyncPointer = 1,
    ReplayPointer = 2,
    AsyncKeyboard = 3,
    SyncKeyboard = 4,
    ReplayKeyboard = 5,
    AsyncBoth = 6,
    SyncBoth = 7,

    // Colormap entry allocation for XCreateColormap
    AllocNone = 0,
    AllocAll = 1,

    // Used in XSetInputFocus, XGetInputFocus
    RevertToNone = None,
    RevertToPointerRoot = PointerRoot,
    RevertToParent = 2,

    // Window classes used by XCreateWindow
    InputOutput = 1,
    InputOnly = 2,

    // Screen saver
    DontPreferBlanking = 0,
    PreferBlanking = 1,
    DefaultBlanking = 2,
    DisableScreenSaver = 0,
    DisableScreenInterval = 0,
    DontAllowExposures = 0,
    AllowExposures = 1,
    DefaultExposures = 2,
    ScreenSaverReset = 0,
    ScreenSaverActive = 1,

    // Property modes
    PropModeReplace = 0,
    PropModePrepend = 1,
    PropModeAppend = 2,

    // Graphics functions, as in GC.alu
    GXclear = 0x0,
    GXand = 0x1,
    GXandReverse = 0x2,
    GXcopy = 0x3,
    GXandInverted = 0x4,
    GXnoop = 0x5,
    GXxor = 0x6,
    GXor = 0x7,
    GXnor = 0x8,
    GXequiv = 0x9,
    GXinvert = 0xA,
    GXorReverse = 0xB,
    GXcopyInverted = 0xC,
    GXorInverted = 0xD,
    GXnand = 0xE,
    GXset = 0xF,

    // LineStyle
    LineSolid = 0,
    LineOnOffDash = 1,
    LineDoubleDash = 2,

    // capStyle
    CapNotLast = 0,
    CapButt = 1,
    CapRound = 2,
    CapProjecting = 3,

    // joinStyle
    JoinMiter = 0,
    JoinRound = 1,
    JoinBevel = 2,

    // fillStyle
    FillSolid = 0,
    FillTiled = 1,
    FillStippled = 2,
    FillOpaqueStippled = 3,

    // fillRule
    EvenOddRule = 0,
    WindingRule = 1,

    // Subwindow mode
    ClipByChildren = 0,
    IncludeInferiors = 1,

    // SetClipRectangles ordering
    Unsorted = 0,
    YSorted = 1,
    YXSorted = 2,
    YXBanded = 3,

    // CoordinateMode for drawing routines
    CoordModeOrigin = 0,
    CoordModePrevious = 1,

    // Polygon shapes
    Complex = 0,
    Nonconvex = 1,
    Convex = 2,

    // Arc modes for PolyFillArc
    ArcChord = 0,
    ArcPieSlice = 1,

    // GC components, OR'ed into the CreateGC/ChangeGC value mask
    GCFunction = 1 << 0,
    GCPlaneMask = 1 << 1,
    GCForeground = 1 << 2,
    GCBackground = 1 << 3,
    GCLineWidth = 1 << 4,
    GCLineStyle = 1 << 5,
    GCCapStyle = 1 << 6,
    GCJoinStyle = 1 << 7,
    GCFillStyle = 1 << 8,
    GCFillRule = 1 << 9,
    GCTile = 1 << 10,
    GCStipple = 1 << 11,
    GCTileStipXOrigin = 1 << 12,
    GCTileStipYOrigin = 1 << 13,
    GCFont = 1 << 14,
    GCSubwindowMode = 1 << 15,
    GCGraphicsExposures = 1 << 16,
    GCClipXOrigin = 1 << 17,
    GCClipYOrigin = 1 << 18,
    GCClipMask = 1 << 19,
    GCDashOffset = 1 << 20,
    GCDashList = 1 << 21,
    GCArcMode = 1 << 22,
    GCLastBit = 22,
}

#[cfg(target_os = "macos")]
const LIB_CANDIDATES: &[&str] = &["libX11.6.dylib", "libX11.dylib"];
#[cfg(target_os = "windows")]
const LIB_CANDIDATES: &[&str] = &["libX11.dll"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const LIB_CANDIDATES: &[&str] = &["libX11.so.6", "libX11.so"];

/// The loaded libX11 function table
///
/// Every entry point is resolved at load time; a missing one fails
/// [`Xlib::load`] before any call can reach it. The raw function-pointer
/// fields stay public for callers that want the bare entry points; the
/// snake_case methods add debug-build argument validation and nothing else.
pub struct Xlib {
    pub XOpenDisplay: unsafe extern "C" fn(display_name: *const c_char) -> *mut Display,
    pub XCloseDisplay: unsafe extern "C" fn(display: *mut Display) -> c_int,
    pub XDefaultScreen: unsafe extern "C" fn(display: *mut Display) -> c_int,
    pub XRootWindow: unsafe extern "C" fn(display: *mut Display, screen_number: c_int) -> Window,
    pub XCreateColormap: unsafe extern "C" fn(
        display: *mut Display,
        w: Window,
        visual: *mut Visual,
        alloc: c_int,
    ) -> Colormap,
    pub XFreeColormap: unsafe extern "C" fn(display: *mut Display, colormap: Colormap) -> c_int,
    #[allow(clippy::type_complexity)]
    pub XCreateWindow: unsafe extern "C" fn(
        display: *mut Display,
        parent: Window,
        x: c_int,
        y: c_int,
        width: c_uint,
        height: c_uint,
        border_width: c_uint,
        depth: c_int,
        class: c_uint,
        visual: *mut Visual,
        valuemask: c_ulong,
        attributes: *mut XSetWindowAttributes,
    ) -> Window,
    pub XDestroyWindow: unsafe extern "C" fn(display: *mut Display, w: Window) -> c_int,
    pub XFree: unsafe extern "C" fn(data: *mut c_void) -> c_int,

    // Keeps the resolved addresses valid
    lib: SharedLibrary,
}

impl Xlib {
    /// Load libX11 (soname fallback per platform) and resolve all entry points.
    pub fn load(config: &Config) -> Result<Xlib> {
        let lib = SharedLibrary::open_any(LIB_CANDIDATES)?;
        Xlib::from_library(lib, config)
    }

    /// Resolve the function table from an already-loaded library.
    pub fn from_library(lib: SharedLibrary, config: &Config) -> Result<Xlib> {
        macro_rules! sym {
            ($name:ident) => {{
                let addr = lib.get(stringify!($name))?;
                if config.debug {
                    log::debug!("{}::{} -> {:p}", lib.name(), stringify!($name), addr.as_ptr());
                }
                unsafe { mem::transmute(addr.as_ptr()) }
            }};
        }

        Ok(Xlib {
            XOpenDisplay: sym!(XOpenDisplay),
            XCloseDisplay: sym!(XCloseDisplay),
            XDefaultScreen: sym!(XDefaultScreen),
            XRootWindow: sym!(XRootWindow),
            XCreateColormap: sym!(XCreateColormap),
            XFreeColormap: sym!(XFreeColormap),
            XCreateWindow: sym!(XCreateWindow),
            XDestroyWindow: sym!(XDestroyWindow),
            XFree: sym!(XFree),
            lib,
        })
    }

    /// The underlying shared library
    pub fn library(&self) -> &SharedLibrary {
        &self.lib
    }

    /// Connect to the X server. A null `display_name` selects `DISPLAY`.
    ///
    /// # Safety
    /// `display_name` must be null or point to a NUL-terminated string.
    pub unsafe fn open_display(&self, display_name: *const c_char) -> *mut Display {
        (self.XOpenDisplay)(display_name)
    }

    /// Connect to the named X server, staging the name on the scratch stack.
    ///
    /// # Safety
    /// Performs a native call; see `XOpenDisplay(3)`.
    pub unsafe fn open_display_name(&self, stack: &mut MemoryStack, name: &str) -> *mut Display {
        let mut frame = stack.push();
        let encoded = frame.c_string(name);
        (self.XOpenDisplay)(encoded)
    }

    /// Close the connection and destroy all resources created on it.
    ///
    /// # Safety
    /// `display` must be a live connection; it must not be used afterwards.
    pub unsafe fn close_display(&self, display: *mut Display) -> c_int {
        debug_assert!(!display.is_null(), "XCloseDisplay: null display");
        (self.XCloseDisplay)(display)
    }

    /// Default screen number of the connection.
    ///
    /// # Safety
    /// `display` must be a live connection.
    pub unsafe fn default_screen(&self, display: *mut Display) -> c_int {
        debug_assert!(!display.is_null(), "XDefaultScreen: null display");
        (self.XDefaultScreen)(display)
    }

    /// Root window of the given screen.
    ///
    /// # Safety
    /// `display` must be a live connection.
    pub unsafe fn root_window(&self, display: *mut Display, screen_number: c_int) -> Window {
        debug_assert!(!display.is_null(), "XRootWindow: null display");
        (self.XRootWindow)(display, screen_number)
    }

    /// Create a colormap for the screen `w` resides on.
    /// `alloc` is [`AllocNone`] or [`AllocAll`].
    ///
    /// # Safety
    /// `display` must be live and `visual` supported on the screen.
    pub unsafe fn create_colormap(
        &self,
        display: *mut Display,
        w: Window,
        visual: *mut Visual,
        alloc: c_int,
    ) -> Colormap {
        debug_assert!(!display.is_null(), "XCreateColormap: null display");
        (self.XCreateColormap)(display, w, visual, alloc)
    }

    /// Free colormap storage and break its resource ID association.
    ///
    /// # Safety
    /// `display` must be a live connection.
    pub unsafe fn free_colormap(&self, display: *mut Display, colormap: Colormap) -> c_int {
        debug_assert!(!display.is_null(), "XFreeColormap: null display");
        (self.XFreeColormap)(display, colormap)
    }

    /// Create an unmapped subwindow of `parent`.
    ///
    /// `valuemask` selects which `attributes` fields apply (CW* bits); with
    /// a zero mask the attributes are not referenced. `depth`, `class` and
    /// `visual` accept [`CopyFromParent`].
    ///
    /// # Safety
    /// `display` must be live; `attributes` must be valid for the bits set
    /// in `valuemask`.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn create_window(
        &self,
        display: *mut Display,
        parent: Window,
        x: c_int,
        y: c_int,
        width: c_uint,
        height: c_uint,
        border_width: c_uint,
        depth: c_int,
        class: c_uint,
        visual: *mut Visual,
        valuemask: c_ulong,
        attributes: *mut XSetWindowAttributes,
    ) -> Window {
        debug_assert!(!display.is_null(), "XCreateWindow: null display");
        (self.XCreateWindow)(
            display,
            parent,
            x,
            y,
            width,
            height,
            border_width,
            depth,
            class,
            visual,
            valuemask,
            attributes,
        )
    }

    /// Destroy `w` and all of its subwindows.
    ///
    /// # Safety
    /// `display` must be a live connection.
    pub unsafe fn destroy_window(&self, display: *mut Display, w: Window) -> c_int {
        debug_assert!(!display.is_null(), "XDestroyWindow: null display");
        (self.XDestroyWindow)(display, w)
    }

    /// Free in-memory data allocated by an Xlib function.
    ///
    /// # Safety
    /// `data` must have been allocated by Xlib and not freed before.
    pub unsafe fn free(&self, data: *mut c_void) -> c_int {
        (self.XFree)(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::token_map;

    #[test]
    fn test_constants_bit_exact() {
        assert_eq!(BadWindow, 3);
        assert_eq!(BadImplementation, 17);
        assert_eq!(CWEventMask, 1 << 11);
        assert_eq!(KeyPressMask, 1);
        assert_eq!(OwnerGrabButtonMask, 1 << 24);
        assert_eq!(KeyPress, 2);
        assert_eq!(LASTEvent, 36);
        assert_eq!(AnyModifier, 1 << 15);
        assert_eq!(GrabModeAsync, 1);
        assert_eq!(GCArcMode, 1 << 22);
        assert_eq!(GCLastBit, 22);
    }

    #[test]
    fn test_revert_constants_alias_reserved_values() {
        assert_eq!(RevertToNone, None);
        assert_eq!(RevertToPointerRoot, PointerRoot);
        assert_eq!(RevertToParent, 2);
    }

    #[test]
    fn test_token_table_joins_shared_values() {
        let map = token_map(&[TOKENS]);

        let zero = map.get(&0).expect("value 0 is defined");
        assert!(zero.contains("None"));
        assert!(zero.contains("RevertToNone"));
        assert!(zero.contains("AllocNone"));

        // A value with a single name maps to exactly that name
        assert_eq!(map.get(&36).map(String::as_str), Option::Some("LASTEvent"));
    }

    #[test]
    #[cfg(all(unix, target_pointer_width = "64"))]
    fn test_set_window_attributes_layout() {
        // LP64 Xlib layout
        assert_eq!(mem::size_of::<XSetWindowAttributes>(), 112);
    }
}
