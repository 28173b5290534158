//! Credentials for MCP servers.

use secrecy::SecretString;

use afm_types::agent::ClientAuthentication;
use afm_types::error::ToolError;

/// Bearer token for an MCP server, if its transport declares one.
///
/// The streamable HTTP transport only carries bearer credentials, so `basic`
/// and `api-key` blocks are rejected rather than silently dropped.
pub fn bearer_token(
    server: &str,
    authentication: Option<&ClientAuthentication>,
) -> Result<Option<SecretString>, ToolError> {
    let Some(auth) = authentication else {
        return Ok(None);
    };
    let reject = |message: String| ToolError::Authentication {
        server: server.to_string(),
        message,
    };
    auth.validate().map_err(&reject)?;

    match auth.kind.to_lowercase().as_str() {
        "bearer" => Ok(auth.token.clone().map(SecretString::from)),
        kind @ ("basic" | "api-key") => Err(reject(format!(
            "type '{kind}' is not supported for MCP servers, use 'bearer'"
        ))),
        kind @ ("oauth2" | "jwt") => Err(reject(format!("type '{kind}' is not yet supported"))),
        kind => Err(reject(format!("unsupported authentication type '{kind}'"))),
    }
}
