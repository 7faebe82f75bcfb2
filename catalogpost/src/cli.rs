use crate::asset_host::DEFAULT_UPLOAD_URL;
use crate::config::{ENV_API_KEY, ENV_BUILD_HOOK_URL, ENV_DB_URL, ENV_EVENT_LOG, ENV_UPLOAD_URL};
use clap::{Arg, Command};

fn env_arg(id: &'static str, env: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name(env)
        .env(env)
        .hide_env_values(true)
        .global(true)
        .help(help)
}

pub fn catalog_cli() -> Command {
    Command::new("catalogpost")
        .about("Submit catalog items with a hosted photo")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(env_arg("api-key", ENV_API_KEY, "Asset host API key"))
        .arg(
            env_arg("upload-url", ENV_UPLOAD_URL, "Asset host upload endpoint")
                .default_value(DEFAULT_UPLOAD_URL),
        )
        .arg(env_arg("db-url", ENV_DB_URL, "Catalog persistence endpoint"))
        .arg(env_arg("build-hook-url", ENV_BUILD_HOOK_URL, "Site rebuild webhook"))
        .arg(env_arg("event-log", ENV_EVENT_LOG, "Append submission events to this file"))
        .subcommand(
            Command::new("submit")
                .about("Upload the photo and store one item")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(
                    Arg::new("notes")
                        .long("notes")
                        .value_name("NOTES")
                        .default_value(""),
                )
                .arg(
                    Arg::new("price")
                        .short('p')
                        .long("price")
                        .value_name("THOUSANDS")
                        .help("Price in thousands, stored multiplied by 1000")
                        .required(true),
                )
                .arg(
                    Arg::new("photo")
                        .long("photo")
                        .value_name("PATH")
                        .required(true),
                ),
        )
        .subcommand(Command::new("rebuild").about("Trigger a site rebuild"))
        .subcommand(Command::new("console").about("Interactive operator session"))
}
