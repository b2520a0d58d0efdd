//! List available audio output devices.

use crate::audio::{list_output_devices, OutputDeviceInfo};

fn format_device(device: &OutputDeviceInfo) -> String {
    let default_indicator = if device.is_default { " [DEFAULT]" } else { "" };
    let config_info = match device.config {
        Some((sample_rate, channels)) => format!(" ({sample_rate}Hz, {channels} channels)"),
        None => " (configuration unavailable)".to_string(),
    };
    format!(
        "  ID: {}\n    Name: {}{}\n    Config:{}",
        device.index, device.name, default_indicator, config_info
    )
}

/// Lists all audio output devices on the system.
///
/// # Errors
/// - If the audio host cannot be initialized
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let devices = list_output_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found on this system.");
        return Ok(());
    }

    println!();
    println!("Available audio output devices:");
    println!();
    for device in &devices {
        println!("{}", format_device(device));
        println!();
    }
    println!("Set `device` under [audio] in the config file to an ID or name.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_default_device() {
        let device = OutputDeviceInfo {
            index: 0,
            name: "pipewire".to_string(),
            is_default: true,
            config: Some((48000, 2)),
        };
        let text = format_device(&device);
        assert!(text.contains("Name: pipewire [DEFAULT]"));
        assert!(text.contains("(48000Hz, 2 channels)"));
    }

    #[test]
    fn test_format_unqueryable_device() {
        let device = OutputDeviceInfo {
            index: 3,
            name: "hdmi".to_string(),
            is_default: false,
            config: None,
        };
        let text = format_device(&device);
        assert!(text.starts_with("  ID: 3"));
        assert!(text.contains("configuration unavailable"));
        assert!(!text.contains("DEFAULT"));
    }
}
