//! Scoped COM initialization.

use std::marker::PhantomData;

use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

use tally_core::models::error::DetectionError;
use tally_core::traits::audio_subsystem::Acquisition;

/// COM initialized on the current thread by this process, uninitialized on drop.
///
/// Only ever constructed when `CoInitializeEx` succeeded (`S_OK` or `S_FALSE`),
/// so every instance balances exactly one successful initialization.
pub struct ComApartment {
    // Apartment membership is per thread.
    _not_send: PhantomData<*const ()>,
}

impl ComApartment {
    /// Join the multithreaded apartment.
    ///
    /// Returns `NotOwned` when the thread already belongs to a single-threaded
    /// apartment: that initialization belongs to the caller's environment and
    /// must not be torn down here.
    pub fn enter() -> Result<Acquisition<Self>, DetectionError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            return Ok(Acquisition::NotOwned);
        }
        hr.ok()
            .map_err(|e| DetectionError::SubsystemUnavailable(format!("CoInitializeEx failed: {}", e)))?;

        Ok(Acquisition::Owned(Self { _not_send: PhantomData }))
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}
