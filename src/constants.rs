//! Centralized string constants for the CliForge runtime.

// HTTP Headers
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_SUNSET: &str = "Sunset";
pub const HEADER_DEPRECATION: &str = "Deprecation";
pub const HEADER_LINK: &str = "Link";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

// Content Types
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_YAML: &str = "application/yaml";

// OpenAPI / x-cli-* extension keys
pub const EXT_CLI_COMMAND: &str = "x-cli-command";
pub const EXT_CLI_FLAGS: &str = "x-cli-flags";
pub const EXT_CLI_PREFLIGHT: &str = "x-cli-preflight";
pub const EXT_CLI_CONFIRMATION: &str = "x-cli-confirmation";
pub const EXT_CLI_INTERACTIVE: &str = "x-cli-interactive";
pub const EXT_CLI_ASYNC: &str = "x-cli-async";
pub const EXT_CLI_OUTPUT: &str = "x-cli-output";
pub const EXT_CLI_DEPRECATION: &str = "x-cli-deprecation";
pub const EXT_CLI_CHANGELOG: &str = "x-cli-changelog";
pub const EXT_CLI_CONFIG: &str = "x-cli-config";
pub const EXT_AUTH_CONFIG: &str = "x-auth-config";
/// All extension keys CliForge recognizes; anything else starting with
/// `x-cli-` is unrecognized and governed by strict-mode (warn or reject).
pub const KNOWN_CLI_EXTENSIONS: &[&str] = &[
    EXT_CLI_COMMAND,
    EXT_CLI_FLAGS,
    EXT_CLI_PREFLIGHT,
    EXT_CLI_CONFIRMATION,
    EXT_CLI_INTERACTIVE,
    EXT_CLI_ASYNC,
    EXT_CLI_OUTPUT,
    EXT_CLI_DEPRECATION,
    EXT_CLI_CHANGELOG,
    EXT_CLI_CONFIG,
    EXT_AUTH_CONFIG,
];

// Environment variables
pub const ENV_ROSA_TOKEN: &str = "ROSA_TOKEN";
pub const ENV_OCM_TOKEN: &str = "OCM_TOKEN";
pub const ENV_ROSA_API_URL: &str = "ROSA_API_URL";
pub const ENV_CLIFORGE_SPEC: &str = "CLIFORGE_SPEC";
pub const ENV_CLIFORGE_ENV: &str = "CLIFORGE_ENV";
pub const ENV_NO_COLOR: &str = "NO_COLOR";
pub const ENV_ROSA_DISABLE_KEYRING: &str = "ROSA_DISABLE_KEYRING";
pub const ENV_NO_MASK_SECRETS_SUFFIX: &str = "_NO_MASK_SECRETS";
pub const ENV_OAUTH_AUTHORIZE_URL: &str = "CLIFORGE_OAUTH_AUTHORIZE_URL";
pub const ENV_OAUTH_TOKEN_URL: &str = "CLIFORGE_OAUTH_TOKEN_URL";
pub const ENV_OAUTH_DEVICE_AUTHORIZATION_URL: &str = "CLIFORGE_OAUTH_DEVICE_AUTHORIZATION_URL";
pub const ENV_OAUTH_CLIENT_ID: &str = "CLIFORGE_OAUTH_CLIENT_ID";

// Error suggestion text
pub const ERR_API_CREDENTIALS: &str = "Check your API credentials and authentication configuration.";
pub const ERR_PERMISSION_DENIED: &str = "Your credentials may be valid but lack permission for this operation.";
pub const ERR_ENDPOINT_NOT_FOUND: &str = "Check that the API endpoint and parameters are correct.";
pub const ERR_RATE_LIMITED: &str = "You're making requests too quickly. Wait before trying again.";
pub const ERR_SERVER_ERROR: &str = "The API server is experiencing issues. Try again later.";
pub const ERR_CONNECTION: &str = "Check that the API server is running and accessible.";
pub const ERR_TIMEOUT: &str = "The API server may be slow or unresponsive. Try again later.";
pub const ERR_FILE_NOT_FOUND: &str = "Check that the file path is correct and the file exists.";
pub const ERR_PERMISSION: &str = "Check file permissions or run with appropriate privileges.";
pub const ERR_YAML_SYNTAX: &str = "Check that your OpenAPI specification is valid YAML syntax.";
pub const ERR_JSON_SYNTAX: &str = "Check that your request body or response contains valid JSON.";
pub const ERR_TOML_SYNTAX: &str = "Check that your configuration file is valid TOML syntax.";

pub const MSG_USE_HELP: &str = "Use --help to see available commands.";
pub const MSG_WARNING_PREFIX: &str = "Warning:";

// Files
pub const CONFIG_FILENAME: &str = "config.toml";
pub const AUTH_FILENAME: &str = "auth.json";
pub const DEPRECATION_TRACKING_FILENAME: &str = "deprecation-tracking.yaml";
pub const ACKNOWLEDGMENTS_FILENAME: &str = "acknowledgments.yaml";
pub const LAST_VERSION_FILENAME: &str = "last-version.txt";

// Schema type names
pub const SCHEMA_TYPE_STRING: &str = "string";
pub const SCHEMA_TYPE_NUMBER: &str = "number";
pub const SCHEMA_TYPE_INTEGER: &str = "integer";
pub const SCHEMA_TYPE_BOOLEAN: &str = "boolean";
pub const SCHEMA_TYPE_ARRAY: &str = "array";
pub const SCHEMA_TYPE_OBJECT: &str = "object";

// HTTP methods
pub const HTTP_METHOD_GET: &str = "GET";
pub const HTTP_METHOD_POST: &str = "POST";
pub const HTTP_METHOD_PUT: &str = "PUT";
pub const HTTP_METHOD_DELETE: &str = "DELETE";
pub const HTTP_METHOD_PATCH: &str = "PATCH";

// Parameter locations
pub const PARAM_LOCATION_PATH: &str = "path";
pub const PARAM_LOCATION_QUERY: &str = "query";
pub const PARAM_LOCATION_HEADER: &str = "header";
pub const PARAM_LOCATION_COOKIE: &str = "cookie";

// Response-shape wrapper keys tried, in order, when extracting dynamic
// select options or list-like responses.
pub const RESPONSE_WRAPPER_KEYS: &[&str] = &["items", "data", "results"];

/// Checks whether a content type should be treated as JSON.
#[must_use]
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type.contains("json")
}
