//! Stencil CLI
//!
//! Line-delimited JSON over stdio: one request per line on stdin, one
//! response per line on stdout. Logs go to stderr.
//!
//! Ops:
//! - is_true: truthiness of `value`
//! - value_path: data path of `expression`
//! - create: compile `expression` and report what came back
//! - resolve: compile `expression` and evaluate it against `data`
//! - test: resolve, then truthiness of the result
//! - info: installed providers
//!
//! Configuration:
//! - STENCIL_EXPR_VERSIONS: comma-separated versions the standard provider
//!   accepts (all when unset)
//! - STENCIL_DEFAULT_VERSION: version used when a request names none

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::env;
use std::io::{self, BufRead, Write};
use stencil::Stencil;
use stencil_core::{ExprError, Severity, Value};
use stencil_plugin::{DataContext, ExtensionRegistry};
use stencil_std::StandardProvider;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const SERVER_NAME: &str = "stencil";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request line is not valid JSON or lacks `op`
const INVALID_REQUEST: &str = "INVALID_REQUEST";
const UNKNOWN_OP: &str = "UNKNOWN_OP";

#[derive(Debug, Deserialize)]
struct Request {
    /// Missing means notification; an explicit `null` is an id like any other
    #[serde(default, deserialize_with = "present")]
    id: Option<JsonValue>,
    op: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    expression: Option<JsonValue>,
    #[serde(default)]
    value: Option<JsonValue>,
    #[serde(default)]
    data: Option<JsonValue>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
struct Response {
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ResponseError>,
}

#[derive(Debug, Serialize)]
struct ResponseError {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
}

impl ResponseError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            suggestion: None,
            severity: None,
        }
    }
}

impl From<ExprError> for ResponseError {
    fn from(e: ExprError) -> Self {
        Self {
            code: e.code,
            message: e.message,
            suggestion: e.suggestion,
            severity: Some(e.severity),
        }
    }
}

/// Split a comma-separated version list, dropping blanks
fn parse_versions(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Create Stencil with the standard provider, configured from the environment
fn create_stencil() -> Stencil {
    let mut provider = StandardProvider::new();
    if let Ok(list) = env::var("STENCIL_EXPR_VERSIONS") {
        provider = provider.with_versions(parse_versions(&list));
    }

    let stencil = Stencil::new(ExtensionRegistry::new().with_provider(provider));
    match env::var("STENCIL_DEFAULT_VERSION") {
        Ok(version) if !version.trim().is_empty() => {
            stencil.with_default_version(version.trim())
        }
        _ => stencil,
    }
}

fn write_response(response: &Response) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let stencil = create_stencil();

    info!(version = SERVER_VERSION, "{} started", SERVER_NAME);
    info!(
        default_version = ?stencil.default_version(),
        providers = %stencil.describe(),
        "configuration"
    );

    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("end of input");
                break;
            }
            Ok(_) => {
                if let Some(response) = process_line(&stencil, &line) {
                    if let Err(e) = write_response(&response) {
                        error!(error = %e, "failed to write response");
                        break;
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        }
    }

    info!("{} shutting down", SERVER_NAME);
}

/// Handle one input line. `None` when nothing is to be written back: blank
/// lines and requests without an id.
fn process_line(stencil: &Stencil, line: &str) -> Option<Response> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "invalid request");
            return Some(Response {
                id: None,
                result: None,
                error: Some(ResponseError::new(
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                )),
            });
        }
    };

    debug!(op = %request.op, "processing");
    let response = handle_request(stencil, &request);

    // Requests without an id get no response
    if request.id.is_none() {
        debug!(op = %request.op, "notification processed");
        return None;
    }
    Some(response)
}

fn handle_request(stencil: &Stencil, request: &Request) -> Response {
    match dispatch(stencil, request) {
        Ok(r) => Response {
            id: request.id.clone(),
            result: Some(r),
            error: None,
        },
        Err(e) => Response {
            id: request.id.clone(),
            result: None,
            error: Some(e),
        },
    }
}

fn dispatch(stencil: &Stencil, request: &Request) -> Result<JsonValue, ResponseError> {
    let version = request.version.as_deref();
    let expression = to_value(&request.expression);

    match request.op.as_str() {
        "is_true" => Ok(json!(stencil.is_true(version, &to_value(&request.value)))),
        "value_path" => Ok(json!(stencil.value_path(&expression))),
        "create" => {
            let result = match stencil.create(version, &expression)? {
                Some(compiled) => json!({
                    "compiled": true,
                    "source": compiled.source().to_json(),
                    "version": compiled.version(),
                }),
                None => json!({
                    "compiled": false,
                    "source": expression.to_json(),
                    "version": version.or(stencil.default_version()),
                }),
            };
            Ok(result)
        }
        "resolve" => {
            let data = data_context(&request.data)?;
            Ok(stencil.resolve(version, &expression, &data)?.to_json())
        }
        "test" => {
            let data = data_context(&request.data)?;
            Ok(json!(stencil.test(version, &expression, &data)?))
        }
        "info" => Ok(json!({
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "default_version": stencil.default_version(),
            "providers": stencil.describe().to_json(),
        })),
        other => Err(ResponseError::new(
            UNKNOWN_OP,
            format!("Unknown op: {}", other),
        )),
    }
}

fn to_value(json: &Option<JsonValue>) -> Value {
    json.clone().map(Value::from).unwrap_or_default()
}

/// Template data must be an object or a list; missing data is `Null`.
fn data_context(json: &Option<JsonValue>) -> Result<DataContext, ExprError> {
    let data = to_value(json);
    if !data.is_null() && !data.is_structured() {
        return Err(ExprError::type_error("object or list for data", data.type_name()));
    }
    Ok(DataContext::from(data))
}
