use http::StatusCode;

/// Translates an internal error into the wire error shape every endpoint returns.
///
/// Implementors own the single mapping from a typed internal error to the
/// Anthropic-shaped `{"type":"error","error":{"type":..,"message":..}}` body.
pub trait HttpError {
    fn status_code(&self) -> StatusCode;
    fn error_type(&self) -> &'static str;
    fn client_message(&self) -> String;
}
