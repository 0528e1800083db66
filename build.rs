// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("fxresolve")
        .version(env!("CARGO_PKG_VERSION"))
        .author("fxresolve Contributors")
        .about("Resolve an application's framework references to installed versions")
        .arg(
            Arg::new("app_config")
                .value_name("APP_RUNTIMECONFIG")
                .required(true)
                .help("Path to the application's runtimeconfig.json"),
        )
        .arg(
            Arg::new("roots")
                .long("dotnet-root")
                .value_name("DIR")
                .action(ArgAction::Append)
                .help("Install root containing shared/<framework>/<version> (repeatable, searched in order)"),
        )
        .arg(
            Arg::new("fx_version")
                .long("fx-version")
                .value_name("VERSION")
                .help("Exact version for the first framework reference"),
        )
        .arg(
            Arg::new("roll_forward")
                .long("roll-forward")
                .value_name("SETTING")
                .help("Roll-forward policy: Disable, LatestPatch, Minor, LatestMinor, Major, LatestMajor"),
        )
        .arg(
            Arg::new("roll_forward_on_no_candidate_fx")
                .long("roll-forward-on-no-candidate-fx")
                .value_name("N")
                .allow_negative_numbers(true)
                .help("Legacy roll-forward level: 0, 1 or 2 (-1 leaves it unset)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the resolution as JSON"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("fxresolve.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
