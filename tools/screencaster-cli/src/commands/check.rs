//! Check system capabilities.

use screencaster_common::config::AppConfig;
use screencaster_platform_core::DisplayServer;
use screencaster_platform_linux::display::{
    default_display_target, detect_display_server, read_topology, XrandrTopology,
};
use screencaster_platform_linux::permissions::{
    all_required_available, check_capabilities, print_capability_report,
};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Screencaster System Check");
    println!("{}", "=".repeat(50));

    // Display server
    match detect_display_server() {
        DisplayServer::X11 => println!("[OK] Display server: X11 ({})", default_display_target()),
        DisplayServer::Wayland => {
            println!("[WARN] Display server: Wayland (x11grab needs XWayland)")
        }
        DisplayServer::Unknown => println!("[WARN] Display server: Unknown"),
    }

    // Regions
    let topology = read_topology(&XrandrTopology::new(config.supervisor.topology_timeout()));
    if topology.is_empty() {
        println!("[WARN] No display regions detected");
    } else {
        println!("[OK] Display regions detected: {}", topology.len());
        for region in topology.iter() {
            println!("     {}", region.id);
        }
    }

    // Tools
    let capabilities = check_capabilities(&config.capture.program);
    println!();
    print_capability_report(&capabilities);

    println!();
    if all_required_available(&capabilities) {
        println!("All required capabilities are available. Screencaster is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}
