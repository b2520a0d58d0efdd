//! List the built-in visual profiles.

use crate::player::{BarStyle, ProfileName, ScrollPolicy, VisualProfile};

fn describe(profile: &VisualProfile) -> String {
    let scroll = match profile.scroll {
        None => "fits viewport",
        Some(ScrollPolicy::StartAligned) => "scrolls, start aligned",
        Some(ScrollPolicy::CenterAligned) => "scrolls, centered",
    };
    let style = match profile.bar_style {
        BarStyle::Bottom => "bottom",
        BarStyle::Symmetric => "symmetric",
    };
    let mut traits = vec![format!("{} bars", profile.bar_count), style.to_string(), scroll.to_string()];
    if profile.animation.is_some() {
        traits.push("animated".to_string());
    }
    if profile.volume_controls {
        traits.push("volume controls".to_string());
    }
    format!(
        "  {:<18}{}\n  {:<18}({})",
        profile.name.to_string(),
        profile.description,
        "",
        traits.join(", ")
    )
}

/// Prints every profile name with a short summary.
pub fn handle_profiles() {
    println!("Available profiles:");
    println!();
    for name in ProfileName::ALL {
        println!("{}", describe(&name.profile()));
        println!();
    }
    println!("Select one with `wavescrub play --profile <NAME>` or set `profile` in the config file.");
}
