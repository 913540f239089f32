pub mod audio_subsystem;
pub mod consent_store;
