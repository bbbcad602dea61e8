//! Users API handlers.
//!
//! ```text
//! GET  /api/users
//! POST /api/users {"name":"Ann","email":"ann@example.com"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{EmailAddress, NewUser, User, UserName};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, require_string, user_validation_error};

const NAME: FieldName = FieldName::new("name");
const EMAIL: FieldName = FieldName::new("email");

/// Request body for `POST /api/users`.
///
/// Fields are loosely typed so missing or non-string values are reported per
/// field instead of as a generic JSON error.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    /// User name, 1 to 100 characters once trimmed.
    #[serde(default)]
    #[schema(value_type = String, example = "Ann")]
    pub name: Option<Value>,
    /// E-mail address, 1 to 254 characters once trimmed.
    #[serde(default)]
    #[schema(value_type = String, example = "ann@example.com")]
    pub email: Option<Value>,
}

impl CreateUserRequest {
    /// Validate into a domain draft, checking `name` before `email`.
    pub fn into_draft(self) -> ApiResult<NewUser> {
        let name = require_string(self.name, NAME)?;
        let name = UserName::new(name).map_err(|err| user_validation_error(&err))?;
        let email = require_string(self.email, EMAIL)?;
        let email = EmailAddress::new(email).map_err(|err| user_validation_error(&err))?;
        Ok(NewUser::new(name, email))
    }
}

/// Users list wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    /// Every user, oldest first.
    pub users: Vec<User>,
}

/// List every user, oldest first.
#[utoipa::path(
    get,
    path = "/api/users",
    tags = ["users"],
    responses(
        (status = 200, description = "Users", body = UsersResponse),
        (status = 500, description = "The user store failed", body = ErrorBody)
    ),
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<UsersResponse>> {
    let users = state.users.list_users().await?;
    Ok(web::Json(UsersResponse { users }))
}

/// Register a user.
#[utoipa::path(
    post,
    path = "/api/users",
    tags = ["users"],
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid or duplicate user", body = ErrorBody),
        (status = 500, description = "The user store failed", body = ErrorBody)
    ),
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner().into_draft()?;
    let user = state.users.create_user(draft).await?;
    Ok(HttpResponse::Created().json(user))
}
