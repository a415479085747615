
//! Platform-specific surface creation.
//!
//! ash does not provide a cross-platform way to create a `vk::SurfaceKHR`; each windowing
//! backend needs its own extension and a handful of native handles pulled out of the `winit`
//! window. This module isolates that boilerplate behind `generate_surface`/`platform_surface_names`
//! so the rest of the crate never has to care which platform it's running on.

use ash::vk;
use ash::version::EntryV1_0;
use ash::extensions::khr;

use std::ffi::CStr;

#[cfg(target_os = "windows")]
pub fn platform_surface_names() -> &'static CStr {
    khr::Win32Surface::name()
}

#[cfg(target_os = "macos")]
pub fn platform_surface_names() -> &'static CStr {
    ash::extensions::mvk::MacOSSurface::name()
}

#[cfg(all(unix, not(target_os = "android"), not(target_os = "macos")))]
pub fn platform_surface_names() -> &'static CStr {
    khr::XlibSurface::name()
}

#[cfg(target_os = "windows")]
pub unsafe fn generate_surface(
    entry: &ash::Entry,
    instance: &ash::Instance,
    window: &winit::Window,
) -> Result<vk::SurfaceKHR, vk::Result> {

    use std::os::raw::c_void;
    use std::ptr;
    use winapi::shared::windef::HWND;
    use winapi::um::libloaderapi::GetModuleHandleW;
    use winit::os::windows::WindowExt;

    let hwnd = window.get_hwnd() as HWND;
    let hinstance = GetModuleHandleW(ptr::null()) as *const c_void;

    let surface_ci = vk::Win32SurfaceCreateInfoKHR {
        s_type: vk::StructureType::WIN32_SURFACE_CREATE_INFO_KHR,
        p_next: ptr::null(),
        flags: vk::Win32SurfaceCreateFlagsKHR::empty(),
        hinstance,
        hwnd: hwnd as *const c_void,
    };

    let surface_loader = khr::Win32Surface::new(entry, instance);
    surface_loader.create_win32_surface(&surface_ci, None)
}

#[cfg(target_os = "macos")]
pub unsafe fn generate_surface(
    entry: &ash::Entry,
    instance: &ash::Instance,
    window: &winit::Window,
) -> Result<vk::SurfaceKHR, vk::Result> {

    use std::mem;
    use std::ptr;
    use std::os::raw::c_void;
    use cocoa::appkit::{NSView, NSWindow};
    use cocoa::base::id as cocoa_id;
    use metal::CoreAnimationLayer;
    use objc::runtime::YES;
    use winit::os::macos::WindowExt;

    let wnd: cocoa_id = mem::transmute(window.get_nswindow());

    let layer = CoreAnimationLayer::new();
    layer.set_edge_antialiasing_mask(0);
    layer.set_presents_with_transaction(false);
    layer.remove_all_animations();

    let view = wnd.contentView();

    layer.set_contents_scale(view.backingScaleFactor());
    view.setLayer(mem::transmute(layer.as_ref()));
    view.setWantsLayer(YES);

    let surface_ci = vk::MacOSSurfaceCreateInfoMVK {
        s_type: vk::StructureType::MACOS_SURFACE_CREATE_INFO_MVK,
        p_next: ptr::null(),
        flags: Default::default(),
        p_view: window.get_nsview() as *const c_void,
    };

    let surface_loader = ash::extensions::mvk::MacOSSurface::new(entry, instance);
    surface_loader.create_mac_os_surface_mvk(&surface_ci, None)
}

#[cfg(all(unix, not(target_os = "android"), not(target_os = "macos")))]
pub unsafe fn generate_surface(
    entry: &ash::Entry,
    instance: &ash::Instance,
    window: &winit::Window,
) -> Result<vk::SurfaceKHR, vk::Result> {

    use std::ptr;
    use winit::os::unix::WindowExt;

    let x11_display = window.get_xlib_display()
        .expect("Failed to obtain the xlib display handle from the window; is this process running under X11?");
    let x11_window = window.get_xlib_window()
        .expect("Failed to obtain the xlib window handle from the window; is this process running under X11?");

    let surface_ci = vk::XlibSurfaceCreateInfoKHR {
        s_type: vk::StructureType::XLIB_SURFACE_CREATE_INFO_KHR,
        p_next: ptr::null(),
        flags: vk::XlibSurfaceCreateFlagsKHR::empty(),
        window: x11_window as vk::Window,
        dpy: x11_display as *mut vk::Display,
    };

    let surface_loader = khr::XlibSurface::new(entry, instance);
    surface_loader.create_xlib_surface(&surface_ci, None)
}
