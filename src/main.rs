// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser as _;
use leddar_clouds::{
    EchoMetadata, EchoPackage, HardwareVariant, ProjectionSession, formats::format_cloud,
};
use tracing::{debug, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.rust_log)
        .with_target(false)
        .init();

    let specs = args.sensor_specs()?;
    let session = ProjectionSession::new(specs, args.angle_mode()?)?;

    let data = std::fs::read(&args.input)?;
    let package = EchoPackage::from_bytes(&data, EchoMetadata::new(specs))?;
    debug!(
        "read {} echoes from {}",
        package.len(),
        args.input.display()
    );

    let mut cloud = session.point_cloud(&package)?;
    cloud.rotate_for(HardwareVariant::from(args.variant));
    std::fs::write(&args.output, format_cloud(&cloud)?)?;
    info!(
        "wrote {} points to {}",
        cloud.len(),
        args.output.display()
    );

    if let Some(path) = &args.mesh_output {
        let mesh = session.quad_mesh(&package)?;
        let mut triangles = mesh.triangle_list();
        triangles.rotate_for(HardwareVariant::from(args.variant));
        std::fs::write(path, format_cloud(&triangles)?)?;
        info!(
            "wrote {} triangles to {}",
            mesh.n_triangles(),
            path.display()
        );
    }

    Ok(())
}
