//! Builds the dynamic `clap` command tree from a parsed spec: one group per
//! `command_path` prefix, one leaf command per operation, one flag per
//! parameter (plus a single `--body` flag for operations that accept a
//! request body), and the global flags shared by every leaf.

use crate::invocation::OperationCall;
use crate::spec::model::{Operation, ParamLocation, ParamSchema, RuntimeSpec};
use crate::utils::to_kebab_case;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;

enum Node<'a> {
    Group(BTreeMap<String, Node<'a>>),
    Leaf(&'a Operation),
}

/// Builds the full command tree for `spec`, including the static `auth` and
/// `config` subcommands that sit outside the generated operation tree.
#[must_use]
pub fn build_cli(spec: &RuntimeSpec, cli_name: &str) -> Command {
    let mut root = Command::new(cli_name.to_string())
        .version(spec.version.clone())
        .about(spec.title.clone())
        .subcommand_required(true)
        .arg_required_else_help(true);

    root = attach_global_flags(root);
    root = root.subcommand(auth_subcommand());
    root = root.subcommand(config_subcommand());

    let mut tree: BTreeMap<String, Node> = BTreeMap::new();
    for operation in &spec.operations {
        insert_operation(&mut tree, &operation.command_path, operation);
    }
    for (name, node) in tree {
        root = root.subcommand(build_node(&name, node));
    }
    root
}

fn insert_operation<'a>(tree: &mut BTreeMap<String, Node<'a>>, path: &[String], operation: &'a Operation) {
    match path.split_first() {
        None => {}
        Some((head, rest)) if rest.is_empty() => {
            tree.insert(head.clone(), Node::Leaf(operation));
        }
        Some((head, rest)) => {
            let entry = tree.entry(head.clone()).or_insert_with(|| Node::Group(BTreeMap::new()));
            if let Node::Group(children) = entry {
                insert_operation(children, rest, operation);
            }
        }
    }
}

fn build_node(name: &str, node: Node) -> Command {
    match node {
        Node::Leaf(operation) => build_operation_command(name, operation),
        Node::Group(children) => {
            let mut command = Command::new(name.to_string()).subcommand_required(true);
            for (child_name, child_node) in children {
                command = command.subcommand(build_node(&child_name, child_node));
            }
            command
        }
    }
}

fn build_operation_command(name: &str, operation: &Operation) -> Command {
    let mut command = Command::new(name.to_string());
    if let Some(summary) = &operation.summary {
        command = command.about(summary.clone());
    }
    for parameter in &operation.parameters {
        command = command.arg(build_arg(parameter));
    }
    if let Some(request_body) = &operation.request_body {
        command = command.arg(
            Arg::new("body")
                .long("body")
                .value_name("JSON")
                .required(request_body.required)
                .help("Request body as a raw JSON document"),
        );
    }
    command
}

fn build_arg(parameter: &crate::spec::model::Parameter) -> Arg {
    let flag_name = to_kebab_case(&parameter.name);
    let mut arg = Arg::new(parameter.name.clone()).required(parameter.required);

    arg = match parameter.location {
        ParamLocation::Path => arg.value_name(flag_name.to_uppercase()),
        ParamLocation::Query | ParamLocation::Header | ParamLocation::Cookie => {
            arg.long(flag_name.clone()).value_name(flag_name.to_uppercase())
        }
    };

    if let Some(description) = &parameter.description {
        arg = arg.help(description.clone());
    }
    if is_boolean_flag(&parameter.schema) {
        arg = arg.action(ArgAction::SetTrue);
    } else {
        arg = arg.action(ArgAction::Set);
        if is_array_schema(&parameter.schema) {
            arg = arg.action(ArgAction::Append);
        }
        if let Some(default) = &parameter.schema.default {
            arg = arg.default_value(default.clone());
        }
        if !parameter.schema.enum_values.is_empty() {
            arg = arg.value_parser(parameter.schema.enum_values.clone());
        }
    }
    arg
}

fn is_boolean_flag(schema: &ParamSchema) -> bool {
    schema.type_name == "boolean"
}

fn is_array_schema(schema: &ParamSchema) -> bool {
    schema.type_name == "array"
}

fn attach_global_flags(command: Command) -> Command {
    command
        .arg(
            Arg::new("output")
                .long("output")
                .global(true)
                .value_parser(clap::value_parser!(crate::cli::OutputFormat))
                .help("Output format"),
        )
        .arg(Arg::new("no-color").long("no-color").global(true).action(ArgAction::SetTrue))
        .arg(
            Arg::new("no-deprecation-warnings")
                .long("no-deprecation-warnings")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Bypass confirmation gates and critical-deprecation blocks"),
        )
        .arg(Arg::new("quiet").long("quiet").global(true).action(ArgAction::SetTrue))
        .arg(Arg::new("debug").long("debug").global(true).action(ArgAction::SetTrue))
        .arg(
            Arg::new("json-errors")
                .long("json-errors")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("token").long("token").global(true).value_name("TOKEN"))
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .global(true)
                .value_name("DURATION")
                .help("Per-request timeout, e.g. 500ms, 30s, 5m"),
        )
        .arg(
            Arg::new("server-var")
                .long("server-var")
                .global(true)
                .action(ArgAction::Append)
                .value_name("KEY=VALUE"),
        )
}

fn auth_subcommand() -> Command {
    Command::new("auth")
        .about("Manage authentication")
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Log in via browser or device code")
                .arg(Arg::new("device").long("device").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("logout").about("Delete stored credentials"))
        .subcommand(Command::new("status").about("Show resolved identity and token expiry"))
}

fn config_subcommand() -> Command {
    Command::new("config")
        .about("Manage runtime settings")
        .subcommand_required(true)
        .subcommand(Command::new("get").about("Print a setting's value").arg(Arg::new("key").required(true)))
        .subcommand(
            Command::new("set")
                .about("Set a setting's value")
                .arg(Arg::new("key").required(true))
                .arg(Arg::new("value").required(true)),
        )
        .subcommand(Command::new("list").about("List all known settings"))
}

/// Walks `matches`' subcommand chain under the operation tree's root
/// (skipping the binary name) and finds the operation whose `command_path`
/// matches exactly.
#[must_use]
pub fn resolve_operation<'a>(spec: &'a RuntimeSpec, matches: &ArgMatches) -> Option<&'a Operation> {
    let mut path = Vec::new();
    let mut current = matches;
    while let Some((name, sub_matches)) = current.subcommand() {
        path.push(name.to_string());
        current = sub_matches;
    }
    spec.operations.iter().find(|op| op.command_path == path)
}

/// Returns the leaf `ArgMatches` for the resolved operation, i.e. the
/// innermost subcommand match, so flag values can be read off it directly.
#[must_use]
pub fn leaf_matches<'a>(matches: &'a ArgMatches) -> &'a ArgMatches {
    let mut current = matches;
    while let Some((_, sub_matches)) = current.subcommand() {
        current = sub_matches;
    }
    current
}

/// Extracts an [`OperationCall`] from the leaf matches for `operation`.
#[must_use]
pub fn build_operation_call(operation: &Operation, matches: &ArgMatches) -> OperationCall {
    let mut call = OperationCall {
        operation_id: operation.operation_id.clone(),
        ..OperationCall::default()
    };

    for parameter in &operation.parameters {
        let Some(value) = matches.get_one::<String>(&parameter.name) else {
            continue;
        };
        match parameter.location {
            ParamLocation::Path => {
                call.path_params.insert(parameter.name.clone(), value.clone());
            }
            ParamLocation::Query => {
                call.query_params.insert(parameter.name.clone(), value.clone());
            }
            ParamLocation::Header | ParamLocation::Cookie => {
                call.header_params.insert(parameter.name.clone(), value.clone());
            }
        }
    }
    call.body = matches.get_one::<String>("body").cloned();
    call
}
