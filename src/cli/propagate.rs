use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::eyre;
use map::Map;

use linkmap::{
    edit::propagate_link_set,
    utils::map_stuffs::{scene_from_map, scene_to_map},
};

use super::{find_by_persistent_id, group_label, load_config, output_path, Cli, CliRes};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct PropagateCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Propagate {
        /// Sets path to .map
        #[arg(short, long)]
        map: PathBuf,
        /// `_tb_id` of the group whose contents are copied to its link set
        #[arg(short, long)]
        group: u64,
        /// Sets output path. Overwrites the input if not given
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sets path to config.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub struct Propagate;
impl Cli for Propagate {
    fn name(&self) -> &'static str {
        "propagate"
    }

    fn cli(&self) -> CliRes {
        let cli = PropagateCli::parse();

        let Commands::Propagate {
            map,
            group,
            output,
            config,
        } = cli.command;

        if let Err(err) = propagate(map, group, output, config) {
            println!("{:?}", err);
            return CliRes::Err;
        }

        CliRes::Ok
    }

    fn cli_help(&self) {
        println!(
            "\
Copies the contents of a linked group over every other group of its link set.

propagate --map <.map> --group <_tb_id> [--output <.map>] [--config <config.toml>]
"
        )
    }
}

fn propagate(
    map_path: PathBuf,
    group: u64,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> eyre::Result<()> {
    let config = load_config(config.as_deref())?;

    let map = Map::from_file(&map_path)?;
    let mut scene = scene_from_map(&map)?;

    let source = find_by_persistent_id(&scene, group)
        .ok_or_else(|| eyre!("Cannot find group with _tb_id {}", group))?;

    let changes = propagate_link_set(&mut scene, source, &config.world_bounds())?;

    for (target, _) in &changes {
        println!("Updated {}", group_label(&scene, *target));
    }

    let mut res = scene_to_map(&scene);
    if !map.tb_header.is_empty() {
        res.tb_header = map.tb_header;
    }

    let output = output_path(&map_path, output);
    res.write(&output)?;

    println!(
        "Propagated {} to {} groups. Written to {}",
        group_label(&scene, source),
        changes.len(),
        output.display()
    );

    Ok(())
}
