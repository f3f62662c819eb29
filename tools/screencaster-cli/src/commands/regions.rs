//! Show the regions the next tick would record.

use screencaster_common::config::AppConfig;
use screencaster_platform_core::virtual_desktop_bounds;
use screencaster_platform_linux::display::{read_topology, XrandrTopology};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let source = XrandrTopology::new(config.supervisor.topology_timeout());
    let topology = read_topology(&source);

    if topology.is_empty() {
        println!("No display regions detected.");
        return Ok(());
    }

    println!("Display regions: {}", topology.len());
    for region in topology.iter() {
        let g = region.geometry;
        println!(
            "  {:<22} {}x{} at ({}, {})",
            region.id, g.width, g.height, g.x, g.y
        );
    }

    if let Some(bounds) = virtual_desktop_bounds(&topology) {
        println!(
            "Virtual desktop: {}x{} at ({}, {})",
            bounds.width, bounds.height, bounds.x, bounds.y
        );
    }

    Ok(())
}
