//! Host-stock launch entries used by the reset operation.

use std::fmt;
use std::str::FromStr;

use serde_json::json;

use crate::config::ConfiguredApp;

/// Which streaming host owns the configuration.
///
/// The two hosts share the document format; Apollo additionally ships a
/// virtual-display stock entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostVariant {
    #[default]
    Sunshine,
    Apollo,
}

impl HostVariant {
    pub fn label(&self) -> &'static str {
        match self {
            HostVariant::Sunshine => "Sunshine",
            HostVariant::Apollo => "Apollo",
        }
    }
}

impl fmt::Display for HostVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HostVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sunshine" => Ok(HostVariant::Sunshine),
            "apollo" => Ok(HostVariant::Apollo),
            other => Err(format!("unknown host variant '{other}' (expected sunshine or apollo)")),
        }
    }
}

/// The fixed stock set a reset installs for the given host.
pub fn stock_apps(variant: HostVariant) -> Vec<ConfiguredApp> {
    let mut desktop = ConfiguredApp::new("Desktop", "", "desktop.png");
    desktop.elevated = String::new();
    desktop.hidden = String::new();
    desktop.wait_all = String::new();
    desktop.exit_timeout = String::new();

    let mut big_picture = ConfiguredApp::new("Steam Big Picture", "", "steam.png");
    big_picture.prep_cmd = Some(json!([
        {
            "do": bigpicture_open_cmd(),
            "undo": bigpicture_close_cmd(),
            "elevated": "false",
        }
    ]));

    let mut apps = vec![desktop, big_picture];

    if variant == HostVariant::Apollo {
        let mut vdisplay = ConfiguredApp::new("Virtual Display", "", "vdisplay.png");
        vdisplay.elevated = String::new();
        vdisplay.hidden = String::new();
        vdisplay.wait_all = String::new();
        vdisplay.exit_timeout = String::new();
        apps.push(vdisplay);
    }

    apps
}

#[cfg(target_os = "windows")]
fn bigpicture_open_cmd() -> String {
    "cmd /C start steam://open/bigpicture".into()
}

#[cfg(target_os = "windows")]
fn bigpicture_close_cmd() -> String {
    "cmd /C start steam://close/bigpicture".into()
}

#[cfg(not(target_os = "windows"))]
fn bigpicture_open_cmd() -> String {
    "steam steam://open/bigpicture".into()
}

#[cfg(not(target_os = "windows"))]
fn bigpicture_close_cmd() -> String {
    "steam steam://close/bigpicture".into()
}
