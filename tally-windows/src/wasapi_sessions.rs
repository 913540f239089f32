//! Live capture-session enumeration via the MMDevice and WASAPI session APIs.
//!
//! Each wrapper owns one COM interface pointer; the `windows` crate calls
//! `Release` when it is dropped. The wrappers exist so the core traits can be
//! implemented for them.
//!
//! Call chain per probe:
//! 1. CoInitializeEx (MTA), see `ComApartment`
//! 2. CoCreateInstance(MMDeviceEnumerator) → EnumAudioEndpoints(eCapture, ACTIVE)
//! 3. Per endpoint: Activate IAudioSessionManager2 → GetSessionEnumerator
//! 4. Per session: IAudioSessionControl → cast IAudioSessionControl2
//!    → IsSystemSoundsSession, GetState, GetProcessId

use windows::core::Interface;
use windows::Win32::Foundation::S_OK;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::{CoCreateInstance, CoTaskMemFree, CLSCTX_ALL};

use tally_core::models::error::DetectionError;
use tally_core::models::session::ActivityState;
use tally_core::traits::audio_subsystem::{
    Acquisition, AudioContext, AudioSubsystem, CaptureEndpoint, ExtendedSessionControl, HandleList, SessionControl,
    SessionManager,
};

use crate::com::ComApartment;

/// The Windows audio subsystem, reached through COM.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasapiSubsystem;

impl AudioSubsystem for WasapiSubsystem {
    type Context = WasapiContext;

    fn acquire(&self) -> Result<Acquisition<WasapiContext>, DetectionError> {
        Ok(match ComApartment::enter()? {
            Acquisition::Owned(apartment) => Acquisition::Owned(WasapiContext { _apartment: apartment }),
            Acquisition::NotOwned => Acquisition::NotOwned,
        })
    }
}

/// COM-initialized context. Uninitializes COM when dropped.
pub struct WasapiContext {
    _apartment: ComApartment,
}

impl AudioContext for WasapiContext {
    type Endpoint = Endpoint;
    type Endpoints = EndpointCollection;

    fn active_capture_endpoints(&self) -> Result<EndpointCollection, DetectionError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator = CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                .map_err(|e| DetectionError::SubsystemUnavailable(format!("failed to create enumerator: {}", e)))?;

            let collection = enumerator
                .EnumAudioEndpoints(eCapture, DEVICE_STATE_ACTIVE)
                .map_err(|e| DetectionError::AbsentOrInaccessible(format!("EnumAudioEndpoints failed: {}", e)))?;

            Ok(EndpointCollection(collection))
        }
    }
}

pub struct EndpointCollection(IMMDeviceCollection);

impl HandleList for EndpointCollection {
    type Item = Endpoint;

    fn count(&self) -> Result<usize, DetectionError> {
        let count = unsafe { self.0.GetCount() }.map_err(|e| call_failed("IMMDeviceCollection::GetCount", e))?;
        Ok(count as usize)
    }

    fn get(&self, index: usize) -> Result<Endpoint, DetectionError> {
        let device = unsafe { self.0.Item(index as u32) }.map_err(|e| call_failed("IMMDeviceCollection::Item", e))?;
        Ok(Endpoint(device))
    }
}

pub struct Endpoint(IMMDevice);

impl CaptureEndpoint for Endpoint {
    type Manager = Manager;

    fn id(&self) -> Option<String> {
        unsafe {
            let raw = self.0.GetId().ok()?;
            let id = raw.to_string().ok();
            CoTaskMemFree(Some(raw.as_ptr() as *const _));
            id
        }
    }

    fn activate_session_manager(&self) -> Result<Manager, DetectionError> {
        let manager: IAudioSessionManager2 =
            unsafe { self.0.Activate(CLSCTX_ALL, None) }.map_err(|e| call_failed("IMMDevice::Activate", e))?;
        Ok(Manager(manager))
    }
}

pub struct Manager(IAudioSessionManager2);

impl SessionManager for Manager {
    type Session = Session;
    type Sessions = SessionList;

    fn sessions(&self) -> Result<SessionList, DetectionError> {
        let sessions = unsafe { self.0.GetSessionEnumerator() }
            .map_err(|e| call_failed("IAudioSessionManager2::GetSessionEnumerator", e))?;
        Ok(SessionList(sessions))
    }
}

pub struct SessionList(IAudioSessionEnumerator);

impl HandleList for SessionList {
    type Item = Session;

    fn count(&self) -> Result<usize, DetectionError> {
        let count = unsafe { self.0.GetCount() }.map_err(|e| call_failed("IAudioSessionEnumerator::GetCount", e))?;
        Ok(count.max(0) as usize)
    }

    fn get(&self, index: usize) -> Result<Session, DetectionError> {
        let control = unsafe { self.0.GetSession(index as i32) }
            .map_err(|e| call_failed("IAudioSessionEnumerator::GetSession", e))?;
        Ok(Session(control))
    }
}

pub struct Session(IAudioSessionControl);

impl SessionControl for Session {
    type Extended = SessionDetails;

    fn state(&self) -> Result<ActivityState, DetectionError> {
        let state = unsafe { self.0.GetState() }.map_err(|e| call_failed("IAudioSessionControl::GetState", e))?;
        Ok(activity_state(state))
    }

    fn extended(&self) -> Result<SessionDetails, DetectionError> {
        let control2 = self
            .0
            .cast::<IAudioSessionControl2>()
            .map_err(|e| call_failed("QueryInterface(IAudioSessionControl2)", e))?;
        Ok(SessionDetails(control2))
    }
}

pub struct SessionDetails(IAudioSessionControl2);

impl ExtendedSessionControl for SessionDetails {
    fn is_system_sounds_session(&self) -> bool {
        // S_OK for the system-sounds session, S_FALSE otherwise.
        unsafe { self.0.IsSystemSoundsSession() == S_OK }
    }

    fn process_id(&self) -> Option<u32> {
        unsafe { self.0.GetProcessId() }.ok()
    }
}

fn activity_state(state: AudioSessionState) -> ActivityState {
    if state == AudioSessionStateActive {
        ActivityState::Active
    } else if state == AudioSessionStateExpired {
        ActivityState::Expired
    } else {
        ActivityState::Inactive
    }
}

fn call_failed(call: &str, error: windows::core::Error) -> DetectionError {
    DetectionError::SubsystemUnavailable(format!("{} failed: {}", call, error))
}
