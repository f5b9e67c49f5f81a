//! C-callable control surface over one process-wide session.
//!
//! ```c
//! int  midijuke_init(const char *driver, const char *soundfont);
//! void midijuke_cleanup(void);
//! int  midijuke_load_soundfont(const char *path);
//! bool midijuke_add_midi(const char *path);
//! void midijuke_play(void);
//! void midijuke_pause(void);
//! void midijuke_stop(void);
//! void midijuke_wait(void);
//! ```
//!
//! Integer returns are 0 on success and 1 on failure. Failures are logged.
//! Every call other than `init` is a no-op (or a failure) before `init`.

use crate::session::Session;
use crate::settings::Settings;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

fn session() -> MutexGuard<'static, Option<Session>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Borrows a C string as UTF-8. Null and invalid strings yield `None`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Creates the session. `driver` may be null for the default backend;
/// `soundfont` may be null for the default SoundFont path.
///
/// Fails if a session already exists; call `midijuke_cleanup` first.
///
/// # Safety
///
/// Both arguments must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn midijuke_init(driver: *const c_char, soundfont: *const c_char) -> c_int {
    let mut slot = session();
    if slot.is_some() {
        tracing::warn!("midijuke_init called twice without cleanup");
        return 1;
    }

    let mut settings = Settings::default();
    if let Some(name) = str_arg(driver) {
        match name.parse() {
            Ok(backend) => settings.driver = backend,
            Err(e) => {
                tracing::error!("midijuke_init: {}", e);
                return 1;
            }
        }
    }
    if let Some(path) = str_arg(soundfont) {
        settings.default_soundfont = Some(path.into());
    }

    match Session::init(settings) {
        Ok(created) => {
            *slot = Some(created);
            0
        }
        Err(e) => {
            tracing::error!("midijuke_init: {}", e);
            1
        }
    }
}

/// Tears the session down. Safe to call when not initialized.
#[no_mangle]
pub extern "C" fn midijuke_cleanup() {
    let taken = session().take();
    if let Some(current) = taken {
        current.cleanup();
    }
}

/// Loads a SoundFont. Returns 0 on success, 1 if the file is not a
/// SoundFont, fails to parse, or no session exists.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn midijuke_load_soundfont(path: *const c_char) -> c_int {
    let Some(path) = str_arg(path) else {
        return 1;
    };
    match session().as_ref() {
        Some(current) => match current.load_soundfont(Path::new(path)) {
            Ok(_) => 0,
            Err(e) => {
                tracing::warn!("midijuke_load_soundfont: {}", e);
                1
            }
        },
        None => 1,
    }
}

/// Attaches a MIDI file to a fresh player. Returns false if the file is
/// not MIDI, the player is busy, or no session exists.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn midijuke_add_midi(path: *const c_char) -> bool {
    let Some(path) = str_arg(path) else {
        return false;
    };
    match session().as_mut() {
        Some(current) => match current.add_midi(Path::new(path)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("midijuke_add_midi: {}", e);
                false
            }
        },
        None => false,
    }
}

#[no_mangle]
pub extern "C" fn midijuke_play() {
    if let Some(current) = session().as_ref() {
        current.play();
    }
}

#[no_mangle]
pub extern "C" fn midijuke_pause() {
    if let Some(current) = session().as_ref() {
        current.pause();
    }
}

#[no_mangle]
pub extern "C" fn midijuke_stop() {
    if let Some(current) = session().as_ref() {
        current.stop();
    }
}

/// Blocks until playback stops. Other calls stay usable meanwhile.
#[no_mangle]
pub extern "C" fn midijuke_wait() {
    let waiter = session().as_ref().map(Session::waiter);
    if let Some(waiter) = waiter {
        waiter.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::fixture::{single_note, write_file};
    use std::ffi::CString;
    use std::ptr;

    // The session is process-wide, so the whole lifecycle lives in one test.
    #[test]
    fn test_c_lifecycle() {
        let dir = tempfile::TempDir::new().unwrap();
        let midi = dir.path().join("song.mid");
        write_file(&midi, &single_note(240));
        let midi = CString::new(midi.to_str().unwrap()).unwrap();
        let not_sf = CString::new("/nonexistent/none.sf2").unwrap();
        let null_driver = CString::new("null").unwrap();
        let bad_driver = CString::new("phonograph").unwrap();

        unsafe {
            // Nothing works before init
            assert!(!midijuke_add_midi(midi.as_ptr()));
            assert_eq!(midijuke_load_soundfont(not_sf.as_ptr()), 1);
            midijuke_play();
            midijuke_wait();

            assert_eq!(midijuke_init(bad_driver.as_ptr(), not_sf.as_ptr()), 1);
            assert_eq!(midijuke_init(null_driver.as_ptr(), not_sf.as_ptr()), 0);
            assert_eq!(midijuke_init(null_driver.as_ptr(), not_sf.as_ptr()), 1);

            assert_eq!(midijuke_load_soundfont(midi.as_ptr()), 1);
            assert_eq!(midijuke_load_soundfont(ptr::null()), 1);
            assert!(!midijuke_add_midi(not_sf.as_ptr()));
            assert!(!midijuke_add_midi(ptr::null()));

            assert!(midijuke_add_midi(midi.as_ptr()));
            midijuke_play();
            assert!(!midijuke_add_midi(midi.as_ptr()));
            midijuke_wait();
            assert!(midijuke_add_midi(midi.as_ptr()));

            midijuke_pause();
            midijuke_stop();
            midijuke_cleanup();
            midijuke_cleanup();

            // Re-init after cleanup
            assert_eq!(midijuke_init(null_driver.as_ptr(), ptr::null()), 0);
            midijuke_cleanup();
        }
    }
}
