//! Windows raw-volume block device implementation.
//!
//! This is the platform the original tool this system is modeled on
//! actually targeted: live NTFS volumes are opened as `\\.\C:` or
//! `\\.\PhysicalDriveN` and read with `ReadFile`, bypassing the normal
//! sharing-violation checks the filesystem driver would otherwise
//! apply to a locked file. Not exercised by the Linux-hosted test
//! suite; compiled only under `cfg(windows)`.

#![cfg(windows)]

use crate::domain::repositories::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::RawHandle;
use std::sync::Mutex;
use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadFile, SetFilePointerEx, FILE_BEGIN, FILE_SHARE_READ, FILE_SHARE_WRITE,
    OPEN_EXISTING,
};
use windows_sys::Win32::System::Ioctl::{
    IOCTL_DISK_GET_LENGTH_INFO, GET_LENGTH_INFORMATION,
};
use windows_sys::Win32::System::IO::DeviceIoControl;

fn to_wide(path: &str) -> Vec<u16> {
    OsStr::new(path)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

struct RawFileHandle(RawHandle);
unsafe impl Send for RawFileHandle {}

pub struct WindowsBlockDevice {
    handle: Mutex<RawFileHandle>,
    path: String,
    size: u64,
}

impl WindowsBlockDevice {
    fn query_length(handle: RawHandle) -> Result<u64, BlockDeviceError> {
        let mut info = GET_LENGTH_INFORMATION { Length: 0 };
        let mut bytes_returned: u32 = 0;
        let ok = unsafe {
            DeviceIoControl(
                handle as isize,
                IOCTL_DISK_GET_LENGTH_INFO,
                std::ptr::null(),
                0,
                &mut info as *mut _ as *mut _,
                std::mem::size_of::<GET_LENGTH_INFORMATION>() as u32,
                &mut bytes_returned,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(BlockDeviceError::Other(
                "IOCTL_DISK_GET_LENGTH_INFO failed".to_string(),
            ));
        }
        Ok(info.Length as u64)
    }
}

impl BlockDeviceReader for WindowsBlockDevice {
    fn open(path: &str) -> Result<Self, BlockDeviceError> {
        let wide = to_wide(path);
        let raw = unsafe {
            CreateFileW(
                wide.as_ptr(),
                0x8000_0000, // GENERIC_READ
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                std::ptr::null(),
                OPEN_EXISTING,
                0,
                0,
            )
        };

        if raw == INVALID_HANDLE_VALUE {
            let code = unsafe { GetLastError() };
            return Err(match code {
                5 => BlockDeviceError::PermissionDenied(path.to_string()),
                2 | 3 => BlockDeviceError::DeviceNotFound(path.to_string()),
                _ => BlockDeviceError::Other(format!("CreateFileW failed ({code})")),
            });
        }

        let handle = raw as RawHandle;
        let size = Self::query_length(handle).unwrap_or(0);

        Ok(Self {
            handle: Mutex::new(RawFileHandle(handle)),
            path: path.to_string(),
            size,
        })
    }

    fn device_info(&self) -> Result<DeviceInfo, BlockDeviceError> {
        Ok(DeviceInfo {
            path: self.path.clone(),
            size: self.size,
            block_size: 512,
            read_only: true,
            model: None,
            serial: None,
        })
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, BlockDeviceError> {
        if offset >= self.size {
            return Err(BlockDeviceError::InvalidOffset {
                offset,
                device_size: self.size,
            });
        }

        let guard = self
            .handle
            .lock()
            .map_err(|_| BlockDeviceError::Other("failed to acquire lock".to_string()))?;
        let handle = guard.0 as isize;

        let mut new_pos: i64 = 0;
        let ok = unsafe {
            SetFilePointerEx(handle, offset as i64, &mut new_pos, FILE_BEGIN)
        };
        if ok == 0 {
            return Err(BlockDeviceError::ReadError {
                offset,
                message: "SetFilePointerEx failed".to_string(),
            });
        }

        let available = (self.size - offset) as usize;
        let to_read = length.min(available);
        let mut buffer = vec![0u8; to_read];
        let mut bytes_read: u32 = 0;
        let ok = unsafe {
            ReadFile(
                handle,
                buffer.as_mut_ptr(),
                to_read as u32,
                &mut bytes_read,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(BlockDeviceError::ReadError {
                offset,
                message: "ReadFile failed".to_string(),
            });
        }
        buffer.truncate(bytes_read as usize);
        Ok(buffer)
    }

    fn read_chunks<F>(
        &self,
        start_offset: u64,
        chunk_size: usize,
        mut callback: F,
    ) -> Result<u64, BlockDeviceError>
    where
        F: FnMut(u64, &[u8]) -> bool,
    {
        let mut offset = start_offset;
        let mut total_read = 0u64;
        while offset < self.size {
            let data = self.read_at(offset, chunk_size)?;
            if data.is_empty() {
                break;
            }
            let bytes_read = data.len() as u64;
            if !callback(offset, &data) {
                break;
            }
            total_read += bytes_read;
            offset += bytes_read;
        }
        Ok(total_read)
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for WindowsBlockDevice {
    fn drop(&mut self) {
        if let Ok(guard) = self.handle.lock() {
            unsafe {
                CloseHandle(guard.0 as isize);
            }
        }
    }
}

// SAFETY: access to the handle is serialized by the mutex.
unsafe impl Sync for WindowsBlockDevice {}
