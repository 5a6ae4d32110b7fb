use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use linkmap::model::{LinkSetIndex, Scene};

use super::{group_label, load_scene, Cli, CliRes};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct LinksCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Links {
        /// Sets path to .map
        #[arg(short, long)]
        map: PathBuf,
        /// Prints JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct LinkSetReport {
    linked_group_id: String,
    members: Vec<MemberReport>,
}

#[derive(Debug, Serialize)]
struct MemberReport {
    id: Option<u64>,
    name: String,
}

fn link_set_reports(scene: &Scene) -> Vec<LinkSetReport> {
    LinkSetIndex::build(scene)
        .link_sets()
        .map(|(linked_group_id, members)| LinkSetReport {
            linked_group_id: linked_group_id.to_string(),
            members: members
                .iter()
                .filter_map(|member| scene.group(*member))
                .map(|group| MemberReport {
                    id: group.persistent_id,
                    name: group.name.clone(),
                })
                .collect(),
        })
        .collect()
}

pub struct Links;
impl Cli for Links {
    fn name(&self) -> &'static str {
        "links"
    }

    fn cli(&self) -> CliRes {
        let cli = LinksCli::parse();
        let Commands::Links { map, json } = cli.command;

        let scene = match load_scene(&map) {
            Ok(scene) => scene,
            Err(err) => {
                println!("{:?}", err);
                return CliRes::Err;
            }
        };

        if json {
            match serde_json::to_string_pretty(&link_set_reports(&scene)) {
                Ok(s) => println!("{}", s),
                Err(err) => {
                    println!("{:?}", err);
                    return CliRes::Err;
                }
            }

            return CliRes::Ok;
        }

        let index = LinkSetIndex::build(&scene);

        if index.is_empty() {
            println!("There are no linked groups.");
            return CliRes::Ok;
        }

        for (linked_group_id, members) in index.link_sets() {
            println!("{} ({} members)", linked_group_id, members.len());

            for member in members {
                println!("    {}", group_label(&scene, *member));
            }
        }

        CliRes::Ok
    }

    fn cli_help(&self) {
        println!(
            "\
Lists link sets and the groups in them.

links --map <.map> [--json]
"
        )
    }
}
