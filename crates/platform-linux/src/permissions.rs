//! Capability detection and guidance for Linux.
//!
//! The supervisor shells out to a topology query tool and a capture tool and
//! records an X11 display; this module reports which of those are usable.

use screencaster_platform_core::DisplayServer;

use crate::display::detect_display_server;

/// A system capability that Screencaster may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check all capabilities for the given capture tool and report status.
pub fn check_capabilities(capture_program: &str) -> Vec<Capability> {
    vec![
        check_display_session(),
        check_topology_tool(),
        check_capture_tool(capture_program),
        check_nice(),
        check_audio_server(),
    ]
}

/// Whether every required capability is available.
pub fn all_required_available(capabilities: &[Capability]) -> bool {
    capabilities
        .iter()
        .filter(|c| c.required)
        .all(|c| c.available)
}

/// Whether `program` resolves to an executable, on `$PATH` or as a path.
fn tool_available(program: &str) -> bool {
    which::which(program).is_ok()
}

fn check_display_session() -> Capability {
    let server = detect_display_server();
    let available = server != DisplayServer::Unknown;

    Capability {
        name: "X11 Display".to_string(),
        description: "X display that region capture can grab from".to_string(),
        available,
        required: true,
        fix_instructions: match server {
            DisplayServer::X11 => None,
            DisplayServer::Wayland => Some(
                "Wayland session detected: region capture needs XWayland or an Xorg session"
                    .to_string(),
            ),
            DisplayServer::Unknown => {
                Some("Run inside a graphical session or export DISPLAY=:0.0".to_string())
            }
        },
    }
}

fn check_topology_tool() -> Capability {
    let available = tool_available("xrandr");

    Capability {
        name: "xrandr".to_string(),
        description: "Monitor layout discovery".to_string(),
        available,
        required: true,
        fix_instructions: if available {
            None
        } else {
            Some("Install xrandr: sudo apt install x11-xserver-utils".to_string())
        },
    }
}

fn check_capture_tool(program: &str) -> Capability {
    let available = tool_available(program);

    Capability {
        name: program.to_string(),
        description: "Capture tool spawned once per region".to_string(),
        available,
        required: true,
        fix_instructions: if available {
            None
        } else {
            Some(format!(
                "Install {program} or point capture.program at a compatible tool"
            ))
        },
    }
}

fn check_nice() -> Capability {
    let available = tool_available("nice");

    Capability {
        name: "nice".to_string(),
        description: "Lowers capture priority so the presentation stays responsive".to_string(),
        available,
        required: false,
        fix_instructions: if available {
            None
        } else {
            Some("Install coreutils or set capture.niceness to null".to_string())
        },
    }
}

fn check_audio_server() -> Capability {
    let available = tool_available("pactl") || tool_available("pw-cli");

    Capability {
        name: "Audio Server".to_string(),
        description: "PulseAudio/PipeWire source shared by every capture".to_string(),
        available,
        required: false,
        fix_instructions: if available {
            None
        } else {
            Some("Install pulseaudio-utils, or set capture.audio to null".to_string())
        },
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Screencaster System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}
