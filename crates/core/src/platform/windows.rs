//! Windows desktop shell
//!
//! - ShellExecuteW for launching
//! - IShellLinkW (COM) for .lnk resolution
//! - System image lists (SHGetImageList) / ExtractIconExW for icons
//! - HKCU Run key for login startup

use crate::icons::IconImage;
use crate::platform::{
    normalize_arguments, PlatformError, PlatformShell, StartupRegistration, APP_STARTUP_NAME,
};
use crate::resolver::Resolution;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::process::CommandExt;
use std::path::Path;
use std::process::Command;
use windows::core::{Interface, PCWSTR};
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, DeleteDC, DeleteObject, GetDIBits, GetObjectW, BITMAP, BITMAPINFO,
    BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HGDIOBJ,
};
use windows::Win32::Storage::FileSystem::{FILE_FLAGS_AND_ATTRIBUTES, WIN32_FIND_DATAW};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, IPersistFile, CLSCTX_INPROC_SERVER,
    COINIT_APARTMENTTHREADED, STGM_READ,
};
use windows::Win32::UI::Controls::{IImageList, ILD_TRANSPARENT};
use windows::Win32::UI::Shell::{
    ExtractIconExW, IShellLinkW, SHGetFileInfoW, SHGetImageList, ShellExecuteW, ShellLink,
    SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHGFI_SYSICONINDEX, SLGP_RAWPATH, SLR_ANY_MATCH,
    SLR_NO_UI,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyIcon, GetIconInfo, HICON, ICONINFO, SHOW_WINDOW_CMD,
};
use winreg::enums::{HKEY_CURRENT_USER, KEY_READ};
use winreg::RegKey;

const RUN_KEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Run";

const SHIL_LARGE: i32 = 0;
const SHIL_SMALL: i32 = 1;
const SHIL_EXTRALARGE: i32 = 2;
const SHIL_JUMBO: i32 = 4;

/// System image lists and the icon side each one holds, smallest first
const IMAGE_LISTS: [(i32, u32); 4] = [
    (SHIL_SMALL, 16),
    (SHIL_LARGE, 32),
    (SHIL_EXTRALARGE, 48),
    (SHIL_JUMBO, 256),
];

pub struct WindowsShell;

impl WindowsShell {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsShell {
    fn default() -> Self {
        Self::new()
    }
}

fn to_wide(path: &Path) -> Vec<u16> {
    path.as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

fn str_to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

fn utf16z_to_string(wide: &[u16]) -> String {
    let end = wide.iter().position(|c| *c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..end])
}

impl StartupRegistration for WindowsShell {
    fn is_startup_enabled(&self) -> bool {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        match hkcu.open_subkey_with_flags(RUN_KEY, KEY_READ) {
            Ok(run) => run.get_value::<String, _>(APP_STARTUP_NAME).is_ok(),
            Err(_) => false,
        }
    }

    fn set_startup_enabled(&self, enabled: bool) -> Result<(), PlatformError> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (run, _) = hkcu
            .create_subkey(RUN_KEY)
            .map_err(|e| PlatformError::Startup(e.to_string()))?;

        if enabled {
            let exe = std::env::current_exe()?;
            run.set_value(APP_STARTUP_NAME, &format!("\"{}\"", exe.display()))
                .map_err(|e| PlatformError::Startup(e.to_string()))?;
        } else if run.get_value::<String, _>(APP_STARTUP_NAME).is_ok() {
            run.delete_value(APP_STARTUP_NAME)
                .map_err(|e| PlatformError::Startup(e.to_string()))?;
        }
        Ok(())
    }
}

impl PlatformShell for WindowsShell {
    fn launch(&self, path: &Path, arguments: Option<&str>) -> Result<(), PlatformError> {
        let operation = str_to_wide("open");
        let path_wide = to_wide(path);
        let args_wide = arguments.map(str_to_wide);

        let code = unsafe {
            ShellExecuteW(
                HWND(std::ptr::null_mut()),
                PCWSTR(operation.as_ptr()),
                PCWSTR(path_wide.as_ptr()),
                args_wide
                    .as_ref()
                    .map(|w| PCWSTR(w.as_ptr()))
                    .unwrap_or(PCWSTR(std::ptr::null())),
                PCWSTR(std::ptr::null()),
                SHOW_WINDOW_CMD(1),
            )
        };

        // ShellExecuteW reports success with values above 32
        if code.0 as isize > 32 {
            Ok(())
        } else {
            Err(PlatformError::Launch {
                path: path.display().to_string(),
                reason: format!("ShellExecute error {}", code.0 as isize),
            })
        }
    }

    fn reveal(&self, path: &Path) -> Result<(), PlatformError> {
        Command::new("explorer.exe")
            .raw_arg(format!("/select,\"{}\"", path.display()))
            .spawn()
            .map_err(|e| PlatformError::Launch {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn resolve_link(&self, path: &Path) -> Option<Resolution> {
        let is_lnk = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case("lnk"));
        if !is_lnk {
            return None;
        }

        unsafe {
            let com_initialized = CoInitializeEx(None, COINIT_APARTMENTTHREADED).is_ok();

            let result = (|| {
                let shell_link: IShellLinkW =
                    CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER).ok()?;
                let persist_file: IPersistFile = shell_link.cast().ok()?;

                let shortcut_wide = to_wide(path);
                persist_file
                    .Load(PCWSTR(shortcut_wide.as_ptr()), STGM_READ)
                    .ok()?;

                let _ = shell_link.Resolve(
                    HWND(std::ptr::null_mut()),
                    (SLR_NO_UI | SLR_ANY_MATCH).0 as u32,
                );

                let mut target_buf = vec![0u16; 4096];
                let mut find_data = WIN32_FIND_DATAW::default();
                let _ = shell_link.GetPath(&mut target_buf, &mut find_data, SLGP_RAWPATH.0 as u32);
                let mut target = utf16z_to_string(&target_buf);
                if target.trim().is_empty() {
                    shell_link
                        .GetPath(&mut target_buf, &mut find_data, 0)
                        .ok()?;
                    target = utf16z_to_string(&target_buf);
                }
                if target.trim().is_empty() {
                    return None;
                }

                let mut args_buf = vec![0u16; 2048];
                let _ = shell_link.GetArguments(&mut args_buf);

                Some(Resolution {
                    target_path: target.trim().to_string(),
                    arguments: normalize_arguments(&utf16z_to_string(&args_buf)),
                })
            })();

            if com_initialized {
                CoUninitialize();
            }
            result
        }
    }

    fn shell_icon(&self, path: &Path, size: u32) -> Option<IconImage> {
        let path_wide = to_wide(path);
        unsafe {
            let mut info = SHFILEINFOW::default();
            let indexed = SHGetFileInfoW(
                PCWSTR(path_wide.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&mut info),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                SHGFI_SYSICONINDEX,
            );
            if indexed != 0 {
                for list in image_list_order(size) {
                    let Ok(image_list) = SHGetImageList::<IImageList>(list) else {
                        continue;
                    };
                    let Ok(hicon) = image_list.GetIcon(info.iIcon, ILD_TRANSPARENT.0) else {
                        continue;
                    };
                    if hicon.is_invalid() {
                        continue;
                    }
                    if let Some(image) = hicon_to_image(hicon) {
                        return Some(image);
                    }
                }
            }
            log::debug!("No image list icon for {:?}, using large shell icon", path);

            let mut info = SHFILEINFOW::default();
            let result = SHGetFileInfoW(
                PCWSTR(path_wide.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&mut info),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                SHGFI_ICON | SHGFI_LARGEICON,
            );
            if result == 0 || info.hIcon.is_invalid() {
                return None;
            }
            hicon_to_image(info.hIcon)
        }
    }

    fn init_worker_thread(&self) -> bool {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED).is_ok() }
    }

    fn exit_worker_thread(&self) {
        unsafe { CoUninitialize() };
    }

    fn file_icon(&self, path: &Path) -> Option<IconImage> {
        let path_wide = to_wide(path);
        unsafe {
            let mut large = HICON::default();
            let extracted = ExtractIconExW(
                PCWSTR(path_wide.as_ptr()),
                0,
                Some(&mut large as *mut HICON),
                None,
                1,
            );
            if extracted == 0 || large.is_invalid() {
                return None;
            }
            hicon_to_image(large)
        }
    }
}

/// Image lists to try for a requested side: those covering it, smallest
/// first, then the smaller ones, largest first
fn image_list_order(size: u32) -> Vec<i32> {
    let covering = IMAGE_LISTS
        .iter()
        .filter(|(_, side)| *side >= size)
        .map(|(list, _)| *list);
    let smaller = IMAGE_LISTS
        .iter()
        .rev()
        .filter(|(_, side)| *side < size)
        .map(|(list, _)| *list);
    covering.chain(smaller).collect()
}

/// Copies the colour bitmap of an icon into RGBA and destroys the icon
unsafe fn hicon_to_image(hicon: HICON) -> Option<IconImage> {
    let mut icon_info = ICONINFO::default();
    if GetIconInfo(hicon, &mut icon_info).is_err() {
        let _ = DestroyIcon(hicon);
        return None;
    }

    let mut bitmap: BITMAP = std::mem::zeroed();
    if GetObjectW(
        HGDIOBJ(icon_info.hbmColor.0),
        std::mem::size_of::<BITMAP>() as i32,
        Some(&mut bitmap as *mut _ as *mut _),
    ) == 0
    {
        let _ = DeleteObject(icon_info.hbmColor);
        let _ = DeleteObject(icon_info.hbmMask);
        let _ = DestroyIcon(hicon);
        return None;
    }

    let width = bitmap.bmWidth as usize;
    let height = bitmap.bmHeight as usize;

    let hdc = CreateCompatibleDC(None);
    let mut bmi = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width as i32,
            biHeight: -(height as i32),
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut pixels: Vec<u8> = vec![0; width * height * 4];
    let copied = GetDIBits(
        hdc,
        icon_info.hbmColor,
        0,
        height as u32,
        Some(pixels.as_mut_ptr() as *mut _),
        &mut bmi,
        DIB_RGB_COLORS,
    );

    let _ = DeleteDC(hdc);
    let _ = DeleteObject(icon_info.hbmColor);
    let _ = DeleteObject(icon_info.hbmMask);
    let _ = DestroyIcon(hicon);

    if copied == 0 {
        return None;
    }

    // BGRA -> RGBA
    for chunk in pixels.chunks_exact_mut(4) {
        chunk.swap(0, 2);
    }

    IconImage::from_rgba(width as u32, height as u32, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_list_order_prefers_smallest_covering_list() {
        assert_eq!(
            image_list_order(32),
            vec![SHIL_LARGE, SHIL_EXTRALARGE, SHIL_JUMBO, SHIL_SMALL]
        );
        assert_eq!(
            image_list_order(64),
            vec![SHIL_JUMBO, SHIL_EXTRALARGE, SHIL_LARGE, SHIL_SMALL]
        );
        assert_eq!(
            image_list_order(16),
            vec![SHIL_SMALL, SHIL_LARGE, SHIL_EXTRALARGE, SHIL_JUMBO]
        );
    }
}
