use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Sign-up payload: a candidate account keyed by access level.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignUpRequest {
    #[schema(value_type = Object)]
    pub account: Value,
}

/// Sign-in payload: identity fields plus at least one password field.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignInRequest {
    #[schema(value_type = Object)]
    pub account: Value,
}

/// Partial account update, keyed by access level.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChangeRequest {
    #[schema(value_type = Object)]
    pub account: Value,
}

/// Recovery request: identity fields plus the identity key to deliver
/// the token through.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ForgotRequest {
    #[schema(value_type = Object)]
    pub account: Value,
    pub method: String,
}

/// Recovery completion: the delivered token plus replacement fields.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ResetRequest {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub token: String,
    #[schema(value_type = Object)]
    pub account: Value,
}

/// Every successful auth operation answers with the account id and its
/// registration state.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AccountResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub registered: bool,
}
