//! Advisory lock on a device, so two sessions never interleave packets on it.
//!
//! The lock file is named after the USB ids and left in place between runs;
//! only the OS level lock on the open handle matters.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::Path;

use directories::ProjectDirs;
use tracing::debug;

fn lock_name(vendor_id: u16, product_id: u16) -> String {
    format!("{vendor_id:04x}-{product_id:04x}.lock")
}

/// Held for as long as a session talks to the device
#[derive(Debug)]
pub struct DeviceLock {
    _file: File,
}

impl DeviceLock {
    /// Claim the device identified by its USB ids
    pub fn acquire(vendor_id: u16, product_id: u16) -> io::Result<Self> {
        let dirs = ProjectDirs::from("", "", "dock-sync").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not determine lock directory")
        })?;
        let dir = dirs.runtime_dir().unwrap_or(dirs.cache_dir());
        Self::acquire_in(dir, vendor_id, product_id)
    }

    fn acquire_in(dir: &Path, vendor_id: u16, product_id: u16) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(lock_name(vendor_id, product_id));
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => {},
            Err(TryLockError::WouldBlock) => {
                let holder = fs::read_to_string(&path).unwrap_or_default();
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "device {vendor_id:04x}:{product_id:04x} is in use by another session (pid {})",
                        holder.trim()
                    ),
                ));
            },
            Err(TryLockError::Error(e)) => return Err(e),
        }

        // record the holder for the error above
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        debug!("claimed device {vendor_id:04x}:{product_id:04x} via {}", path.display());
        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dock-sync-{name}-{}", std::process::id()))
    }

    #[test]
    fn name_is_derived_from_usb_ids() {
        assert_eq!(lock_name(0x5500, 0x1001), "5500-1001.lock");
    }

    #[test]
    fn second_session_is_refused_until_first_ends() {
        let dir = scratch_dir("exclusive");
        let first = DeviceLock::acquire_in(&dir, 0x5500, 0x1001).unwrap();

        let err = DeviceLock::acquire_in(&dir, 0x5500, 0x1001).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("5500:1001"), "{err}");
        #[cfg(unix)]
        assert!(err.to_string().contains(&std::process::id().to_string()), "{err}");

        drop(first);
        DeviceLock::acquire_in(&dir, 0x5500, 0x1001).unwrap();
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn other_devices_are_independent() {
        let dir = scratch_dir("independent");
        let _a = DeviceLock::acquire_in(&dir, 0x5500, 0x1001).unwrap();
        let _b = DeviceLock::acquire_in(&dir, 0x5500, 0x1002).unwrap();
        let _ = fs::remove_dir_all(&dir);
    }
}
