//! Output device discovery.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// One row of `wavescrub list-devices`.
#[derive(Debug, Clone)]
pub struct OutputDeviceInfo {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
    /// `(sample_rate, channels)` of the default output config, if queryable.
    pub config: Option<(u32, u16)>,
}

/// Enumerates output devices, skipping any whose name cannot be read.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn list_output_devices() -> Result<Vec<OutputDeviceInfo>> {
    suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let default_name = host.default_output_device().and_then(|d| d.name().ok());

        let devices = host
            .output_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter_map(|device| device.name().ok().map(|name| (device, name)))
            .enumerate()
            .map(|(index, (device, name))| OutputDeviceInfo {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                config: device
                    .default_output_config()
                    .ok()
                    .map(|c| (c.sample_rate().0, c.channels())),
                name,
            })
            .collect();
        Ok(devices)
    })
}

/// Resolves a device spec: "default", a numeric index or a device name.
///
/// # Errors
/// - If no device matches the spec
pub fn find_output_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if device_spec.trim().is_empty() || device_spec == "default" {
        return host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device available"));
    }

    let devices: Vec<cpal::Device> = host
        .output_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .filter(|d| d.name().is_ok())
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    devices
        .into_iter()
        .find(|d| d.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| {
            anyhow!(
                "Audio output device '{device_spec}' not found. Use 'wavescrub list-devices' to see available devices."
            )
        })
}

/// Runs `f` with stderr redirected to /dev/null, hiding ALSA's chatter.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// No ALSA off Linux.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
