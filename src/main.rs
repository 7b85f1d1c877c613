use orbit_stage::{app, demo};

fn main() -> anyhow::Result<()> {
    app::run(demo::stage_setup())
}
