use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::eyre;
use linkmap::model::{node_selection_with_linked_group_constraints, NodeId};

use super::{find_by_persistent_id, group_label, load_scene, Cli, CliRes};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct SelectCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Select {
        /// Sets path to .map
        #[arg(short, long)]
        map: PathBuf,
        /// `_tb_id` of a group whose contents are selected
        ///
        /// Could be reused mutiple times. Earlier groups win.
        #[arg(id = "group", short, long, action = clap::ArgAction::Append)]
        groups: Vec<u64>,
    },
}

pub struct Select;
impl Cli for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn cli(&self) -> CliRes {
        let cli = SelectCli::parse();
        let Commands::Select { map, groups } = cli.command;

        if let Err(err) = select(map, &groups) {
            println!("{:?}", err);
            return CliRes::Err;
        }

        CliRes::Ok
    }

    fn cli_help(&self) {
        println!(
            "\
Selects the contents of the given groups and shows which of them can be edited
together. Only one copy of a link set can be edited at a time.

select --map <.map> --group <_tb_id> [--group <_tb_id>]...
"
        )
    }
}

fn select(map: PathBuf, groups: &[u64]) -> eyre::Result<()> {
    let scene = load_scene(&map)?;

    let groups = groups
        .iter()
        .map(|group| {
            find_by_persistent_id(&scene, *group)
                .ok_or_else(|| eyre!("Cannot find group with _tb_id {}", group))
        })
        .collect::<eyre::Result<Vec<NodeId>>>()?;

    let nodes = groups
        .iter()
        .flat_map(|group| scene.children(*group).iter().copied())
        .collect::<Vec<NodeId>>();

    let res = node_selection_with_linked_group_constraints(&scene, &nodes);

    println!("Selected {} of {} objects", res.nodes_to_select.len(), nodes.len());

    for group in &groups {
        let selected = scene
            .children(*group)
            .iter()
            .any(|child| res.nodes_to_select.contains(child));

        println!(
            "    {} {}",
            group_label(&scene, *group),
            if selected { "editable" } else { "skipped" }
        );
    }

    println!("Locked:");
    for group in &res.groups_to_lock {
        println!("    {}", group_label(&scene, *group));
    }

    Ok(())
}
