use std::path::{Path, PathBuf};

use map::Map;

use linkmap::{
    config::{parse_config, parse_config_from_file, Config},
    model::{NodeId, NodeKind, Scene, Walk},
    utils::map_stuffs::scene_from_map,
};

use self::{links::Links, propagate::Propagate, select::Select};

mod links;
mod propagate;
mod select;

pub enum CliRes {
    Ok,
    Err,
    NoCli,
}

pub trait Cli {
    fn name(&self) -> &'static str;
    /// Each module has to handle the arguments by itself.
    fn cli(&self) -> CliRes;
    fn cli_help(&self);
}

/// Runs command-line options
pub fn cli() -> CliRes {
    let args: Vec<String> = std::env::args().collect();

    // Add new modules here.
    let modules: &[&dyn Cli] = &[&Propagate, &Links, &Select];

    let help = || {
        println!(
            "\
linkmap

Available modules:"
        );
        for module in modules {
            println!("\n{}", module.name());
            module.cli_help();
        }
    };

    if args.len() < 2 {
        help();
        return CliRes::NoCli;
    }

    for module in modules {
        if args[1] == module.name() {
            return module.cli();
        }
    }

    // In case nothing fits then prints this again.
    help();

    CliRes::Err
}

/// `--config` wins over `config.toml` next to the binary.
fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    match path {
        Some(path) => parse_config_from_file(path),
        None => parse_config(),
    }
}

fn load_scene(path: &Path) -> eyre::Result<Scene> {
    let map = Map::from_file(path)?;

    Ok(scene_from_map(&map)?)
}

/// Finds a layer or group by the `_tb_id` written in the map.
fn find_by_persistent_id(scene: &Scene, persistent_id: u64) -> Option<NodeId> {
    let mut res = None;

    scene.walk(&[scene.world()], |node| {
        let id = match node.kind() {
            NodeKind::Layer(layer) => layer.persistent_id,
            NodeKind::Group(group) => group.persistent_id,
            NodeKind::World(_) => None,
            _ => return Walk::SkipChildren,
        };

        if res.is_none() && id == Some(persistent_id) {
            res = Some(node.id());
        }

        Walk::Continue
    });

    res
}

fn group_label(scene: &Scene, id: NodeId) -> String {
    match scene.group(id) {
        Some(group) => match group.persistent_id {
            Some(persistent_id) => format!("{} ({})", persistent_id, group.name),
            None => format!("{} ({})", id, group.name),
        },
        None => id.to_string(),
    }
}

fn output_path(map: &Path, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| map.to_path_buf())
}
