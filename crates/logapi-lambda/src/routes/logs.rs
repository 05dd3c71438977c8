use lambda_http::Error;
use lambda_http::lambda_runtime::LambdaEvent;
use logapi_core::envelope::Envelope;
use logapi_core::models::event::InvocationEvent;
use logapi_store::{Lookup, filter_records};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET` audit-log query: the query string is the filter mapping.
pub async fn query_logs(
    state: AppState,
    event: LambdaEvent<InvocationEvent>,
) -> Result<Envelope, Error> {
    let params = event.payload.query_string_parameters.as_ref();

    let envelope = match filter_records(&state.sessions, params).await {
        Ok(Lookup::Found(records)) => Envelope::success(serde_json::to_value(records)?),
        Ok(Lookup::NotFound) => Envelope::not_found(),
        Err(e) => ApiError::from(e).into_envelope(),
    };
    Ok(envelope)
}
