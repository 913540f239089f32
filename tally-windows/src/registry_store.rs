//! CapabilityAccessManager consent ledger backed by the Win32 registry.
//!
//! Windows records every app that touches the microphone or webcam under
//! `HKCU\...\CapabilityAccessManager\ConsentStore\<category>`, with
//! `LastUsedTimeStart`/`LastUsedTimeStop` QWORD FILETIMEs per app. A stop
//! time of zero means the app is using the device right now.

use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, WIN32_ERROR};
use windows::Win32::System::Registry::{
    RegCloseKey, RegEnumKeyExW, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_CURRENT_USER, KEY_READ, REG_QWORD,
    REG_VALUE_TYPE,
};

use tally_core::models::category::DeviceCategory;
use tally_core::models::error::DetectionError;
use tally_core::models::usage::CONSENT_STORE_ROOT;
use tally_core::traits::consent_store::{ConsentStore, LedgerKey};

/// Registry key names are limited to 255 characters.
const MAX_KEY_NAME_LEN: usize = 255;

/// Consent ledger of the current user.
pub struct RegistryConsentStore {
    root: HKEY,
    base_path: String,
}

impl RegistryConsentStore {
    pub fn current_user() -> Self {
        Self {
            root: HKEY_CURRENT_USER,
            base_path: CONSENT_STORE_ROOT.to_string(),
        }
    }

    fn category_path(&self, category: DeviceCategory) -> String {
        format!(r"{}\{}", self.base_path, category.ledger_name())
    }
}

impl ConsentStore for RegistryConsentStore {
    type Key = RegistryKey;

    fn open_category(&self, category: DeviceCategory) -> Result<RegistryKey, DetectionError> {
        let path = self.category_path(category);
        RegistryKey::open(self.root, &path).map_err(|status| open_error(&path, status))
    }
}

/// An open registry key, closed on drop.
pub struct RegistryKey(HKEY);

impl RegistryKey {
    fn open(parent: HKEY, path: &str) -> Result<Self, WIN32_ERROR> {
        let wide_path = to_wide(path);
        let mut handle = HKEY::default();
        let status = unsafe { RegOpenKeyExW(parent, PCWSTR(wide_path.as_ptr()), Some(0), KEY_READ, &mut handle) };
        if status == ERROR_SUCCESS {
            Ok(Self(handle))
        } else {
            Err(status)
        }
    }
}

impl Drop for RegistryKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

impl LedgerKey for RegistryKey {
    fn subkey_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut buffer = [0u16; MAX_KEY_NAME_LEN + 1];

        for index in 0u32.. {
            let mut len = buffer.len() as u32;
            let status = unsafe {
                RegEnumKeyExW(self.0, index, PWSTR(buffer.as_mut_ptr()), &mut len, None, None, None, None)
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            if status != ERROR_SUCCESS {
                log::debug!("Subkey enumeration stopped at index {} (error {})", index, status.0);
                break;
            }
            names.push(key_name(&buffer[..len as usize]));
        }

        names
    }

    fn open_subkey(&self, name: &str) -> Result<Self, DetectionError> {
        Self::open(self.0, name).map_err(|status| open_error(name, status))
    }

    fn read_u64(&self, value_name: &str) -> Result<u64, DetectionError> {
        let wide_name = to_wide(value_name);
        let mut value_type = REG_VALUE_TYPE::default();
        let mut data = 0u64;
        let mut size = std::mem::size_of::<u64>() as u32;

        let status = unsafe {
            RegQueryValueExW(
                self.0,
                PCWSTR(wide_name.as_ptr()),
                None,
                Some(&mut value_type),
                Some(&mut data as *mut u64 as *mut u8),
                Some(&mut size),
            )
        };

        if status == ERROR_FILE_NOT_FOUND {
            return Err(DetectionError::MalformedEntry(format!("{} missing", value_name)));
        }
        if status != ERROR_SUCCESS {
            return Err(DetectionError::MalformedEntry(format!(
                "{} unreadable (error {})",
                value_name, status.0
            )));
        }
        check_qword(value_name, value_type, size)?;
        Ok(data)
    }
}

fn check_qword(value_name: &str, value_type: REG_VALUE_TYPE, size: u32) -> Result<(), DetectionError> {
    if value_type != REG_QWORD || size as usize != std::mem::size_of::<u64>() {
        return Err(DetectionError::MalformedEntry(format!(
            "{} is not a QWORD (type {}, {} bytes)",
            value_name, value_type.0, size
        )));
    }
    Ok(())
}

fn open_error(path: &str, status: WIN32_ERROR) -> DetectionError {
    if status == ERROR_FILE_NOT_FOUND {
        DetectionError::AbsentOrInaccessible(path.to_string())
    } else {
        DetectionError::MalformedEntry(format!("cannot open {} (error {})", path, status.0))
    }
}

/// Decode an enumerated key name. Unpaired surrogates cannot round-trip
/// through `&str`, so such a key will not reopen and gets skipped.
fn key_name(wide: &[u16]) -> String {
    match String::from_utf16(wide) {
        Ok(name) => name,
        Err(_) => {
            let name = String::from_utf16_lossy(wide);
            log::debug!("Subkey name {:?} is not valid UTF-16; it will not reopen", name);
            name
        }
    }
}

/// NUL-terminated UTF-16 copy of `s`.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
