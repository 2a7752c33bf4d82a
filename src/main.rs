use cliforge::auth;
use cliforge::cli::errors::print_error_with_json;
use cliforge::cli::{tracing_init, GlobalFlags};
use cliforge::config::settings::{SettingKey, SettingValue};
use cliforge::config::{BaseUrlResolver, ConfigManager, ServerVariableResolver};
use cliforge::engine::executor::{self, ExecutorDeps};
use cliforge::engine::generator::{self, build_cli};
use cliforge::error::Error;
use cliforge::fs::OsFileSystem;
use cliforge::invocation::ExecutionContext;
use cliforge::output::Output;
use cliforge::secret::{SecretDetector, SecretDetectorConfig};
use cliforge::spec::{parser, RuntimeSpec, SpecParser, SpecValidator};
use std::path::PathBuf;
use std::str::FromStr;

const CLI_NAME: &str = env!("CARGO_PKG_NAME");

#[tokio::main]
async fn main() {
    let json_errors = std::env::args().any(|a| a == "--json-errors");
    if let Err(e) = run().await {
        print_error_with_json(&e, json_errors);
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<(), Error> {
    let config_manager = ConfigManager::<OsFileSystem>::new()?;
    let global_config = config_manager.load_global_config()?;

    let spec_path = resolve_spec_path()?;
    let content = std::fs::read_to_string(&spec_path)?;

    let openapi = parser::parse_openapi(&content)?;
    let validation = SpecValidator::new().validate_with_mode(&openapi, global_config.strict_mode);
    for warning in &validation.warnings {
        eprintln!("{}: {warning}", cliforge::constants::MSG_WARNING_PREFIX);
    }
    validation.into_result()?;

    let spec = SpecParser::new().parse(&content)?;

    let mut cli = build_cli(&spec, CLI_NAME);
    cli = cli.arg(
        clap::Arg::new("spec")
            .long("spec")
            .global(true)
            .value_name("PATH")
            .help("Path to the OpenAPI document (or set CLIFORGE_SPEC)"),
    );

    let matches = match cli.try_get_matches() {
        Ok(m) => m,
        Err(e) => e.exit(),
    };

    let flags = GlobalFlags::from_matches(&matches)?;
    tracing_init::init_tracing(u8::from(flags.debug));

    let secrets = if cliforge::secret::no_mask_secrets_override(CLI_NAME, flags.quiet) {
        SecretDetector::disabled()
    } else {
        SecretDetector::new(SecretDetectorConfig::default())
    };
    let output = Output::new(flags.quiet, flags.json_errors);

    let storage = auth::storage::default_storage(config_manager.config_dir());

    if let Some(("auth", auth_matches)) = matches.subcommand() {
        return run_auth_command(auth_matches, storage.as_ref(), &output).await;
    }
    if let Some(("config", config_matches)) = matches.subcommand() {
        return run_config_command(config_matches, &config_manager);
    }

    let Some(operation) = generator::resolve_operation(&spec, &matches) else {
        return Err(Error::usage("no matching command; run with --help to see available commands"));
    };
    let leaf = generator::leaf_matches(&matches);
    let call = generator::build_operation_call(operation, leaf);

    let base_url = resolve_base_url(&spec, &global_config, &flags)?;
    let timeout_config = cliforge::resilience::TimeoutConfig {
        request_timeout_ms: flags.timeout.map_or(global_config.default_timeout_ms, |d| {
            u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
        }),
        ..cliforge::resilience::TimeoutConfig::default()
    };
    let client = cliforge::resilience::create_resilient_client(&timeout_config)?;

    let token_url = std::env::var(cliforge::constants::ENV_OAUTH_TOKEN_URL).ok();
    let oauth_client_id = std::env::var(cliforge::constants::ENV_OAUTH_CLIENT_ID).ok();
    let tracking_path = config_manager.config_dir().join(cliforge::constants::DEPRECATION_TRACKING_FILENAME);

    let deps = ExecutorDeps {
        client: &client,
        base_url: &base_url,
        storage: storage.as_ref(),
        flags: &flags,
        secrets: &secrets,
        token_url: token_url.as_deref(),
        oauth_client_id: oauth_client_id.as_deref(),
        deprecation_tracking_path: Some(tracking_path.as_path()),
    };

    let context = ExecutionContext {
        token_override: flags.token.clone(),
        force: flags.force,
        ..ExecutionContext::default()
    };

    let output_spec = operation.output.clone();
    let result = executor::execute(&spec, operation, call, &context, &deps).await?;
    executor::render_with_output_spec(&result, flags.output, &secrets, &output_spec)
}

fn resolve_spec_path() -> Result<PathBuf, Error> {
    let from_args = std::env::args()
        .collect::<Vec<_>>()
        .windows(2)
        .find(|w| w[0] == "--spec")
        .map(|w| w[1].clone());
    let from_env = std::env::var(cliforge::constants::ENV_CLIFORGE_SPEC).ok();
    from_args
        .or(from_env)
        .map(PathBuf::from)
        .ok_or_else(|| Error::usage("no spec provided: pass --spec <path> or set CLIFORGE_SPEC"))
}

fn resolve_base_url(
    spec: &RuntimeSpec,
    global_config: &cliforge::config::GlobalConfig,
    flags: &GlobalFlags,
) -> Result<String, Error> {
    let resolver = BaseUrlResolver::new(spec.base_url.as_deref())
        .with_environment(std::env::var(cliforge::constants::ENV_CLIFORGE_ENV).ok())
        .with_global_config(global_config);
    let base_url = resolver.resolve();

    if spec.server_variables.is_empty() {
        return Ok(base_url);
    }
    let variable_resolver = ServerVariableResolver::new(&spec.server_variables);
    let resolved_vars = variable_resolver.resolve_variables(&flags.server_var)?;
    variable_resolver.substitute_url(&base_url, &resolved_vars)
}

async fn run_auth_command(
    matches: &clap::ArgMatches,
    storage: &dyn auth::storage::AuthStorage,
    output: &Output,
) -> Result<(), Error> {
    match matches.subcommand() {
        Some(("login", login_matches)) => {
            let authorize_url = std::env::var(cliforge::constants::ENV_OAUTH_AUTHORIZE_URL)
                .map_err(|_| Error::auth("CLIFORGE_OAUTH_AUTHORIZE_URL is not set"))?;
            let token_url = std::env::var(cliforge::constants::ENV_OAUTH_TOKEN_URL)
                .map_err(|_| Error::auth("CLIFORGE_OAUTH_TOKEN_URL is not set"))?;
            let client_id = std::env::var(cliforge::constants::ENV_OAUTH_CLIENT_ID)
                .map_err(|_| Error::auth("CLIFORGE_OAUTH_CLIENT_ID is not set"))?;
            let client = reqwest::Client::new();

            let tokens = if login_matches.get_flag("device") {
                let device_url = std::env::var(cliforge::constants::ENV_OAUTH_DEVICE_AUTHORIZATION_URL)
                    .map_err(|_| Error::auth("CLIFORGE_OAUTH_DEVICE_AUTHORIZATION_URL is not set"))?;
                auth::oauth::run_device_code_login(&client, &device_url, &token_url, &client_id).await?
            } else {
                let pkce = auth::oauth::generate_pkce();
                let redirect_uri = format!("http://127.0.0.1:{}/callback", auth::oauth::DEFAULT_REDIRECT_PORT);
                auth::oauth::run_browser_login(
                    &client,
                    &authorize_url,
                    &token_url,
                    &client_id,
                    &redirect_uri,
                    &pkce,
                    auth::oauth::DEFAULT_REDIRECT_PORT,
                )
                .await?
            };
            auth::persist_login(storage, &tokens)?;
            output.success("Logged in successfully.");
            Ok(())
        }
        Some(("logout", _)) => {
            auth::logout(storage)?;
            output.success("Logged out.");
            Ok(())
        }
        Some(("status", _)) => {
            let status = auth::status(storage)?;
            if status.logged_in {
                println!("Logged in as {}", status.username.as_deref().unwrap_or("unknown"));
                if let Some(expires_at) = status.expires_at {
                    println!("Token expires at {expires_at}");
                }
            } else {
                println!("Not logged in.");
            }
            Ok(())
        }
        _ => Err(Error::usage("unknown auth subcommand")),
    }
}

fn run_config_command(matches: &clap::ArgMatches, manager: &ConfigManager<OsFileSystem>) -> Result<(), Error> {
    match matches.subcommand() {
        Some(("get", get_matches)) => {
            let key_str = get_matches.get_one::<String>("key").expect("required");
            let key = SettingKey::from_str(key_str)?;
            println!("{}", manager.get_setting(key)?);
            Ok(())
        }
        Some(("set", set_matches)) => {
            let key_str = set_matches.get_one::<String>("key").expect("required");
            let value_str = set_matches.get_one::<String>("value").expect("required");
            let key = SettingKey::from_str(key_str)?;
            let value = SettingValue::parse_for_key(key, value_str)?;
            manager.set_setting(key, &value)?;
            println!("Set {key} = {value}");
            Ok(())
        }
        Some(("list", _)) => {
            for setting in manager.list_settings()? {
                println!("{} = {} ({})", setting.key, setting.value, setting.description);
            }
            Ok(())
        }
        _ => Err(Error::usage("unknown config subcommand")),
    }
}
