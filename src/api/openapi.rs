//! OpenAPI document for the auth surface, served through Swagger UI.

#[allow(unused_imports)]
use crate::api::handlers::{
    auth::{
        change::__path_change,
        forgot::__path_forgot,
        reset::__path_reset,
        session::__path_session,
        sign_in::__path_sign_in,
        sign_out::__path_sign_out,
        sign_up::__path_sign_up,
        types::{
            AccountResponse, ChangeRequest, ForgotRequest, ResetRequest, SignInRequest,
            SignUpRequest,
        },
    },
    health,
    health::__path_health,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(sign_up, sign_in, sign_out, change, forgot, reset, session, health),
    components(schemas(
        SignUpRequest,
        SignInRequest,
        ChangeRequest,
        ForgotRequest,
        ResetRequest,
        AccountResponse,
        health::Health
    )),
    tags(
        (name = "auth", description = "Account identity and credential recovery"),
        (name = "health", description = "Service health"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
