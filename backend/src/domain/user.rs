//! User data model.
//!
//! Users are created once and never mutated. Names and e-mail addresses are
//! validated on construction so persistence adapters only ever see values
//! that satisfy the invariants below.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum number of characters accepted for a user name.
pub const USER_NAME_MAX: usize = 100;
/// Maximum number of characters accepted for an e-mail address.
pub const EMAIL_MAX: usize = 254;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Identifier is not a UUID.
    InvalidId,
    /// Name is empty once trimmed.
    EmptyName,
    /// Name exceeds [`USER_NAME_MAX`] characters.
    NameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// E-mail is empty once trimmed.
    EmptyEmail,
    /// E-mail exceeds [`EMAIL_MAX`] characters.
    EmailTooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

impl UserValidationError {
    /// Request field the failure refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyName | Self::NameTooLong { .. } => "name",
            Self::EmptyEmail | Self::EmailTooLong { .. } => "email",
        }
    }

    /// Stable machine-readable code for the failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_uuid",
            Self::EmptyName | Self::EmptyEmail => "empty_field",
            Self::NameTooLong { .. } | Self::EmailTooLong { .. } => "too_long",
        }
    }
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-empty, trimmed user name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate and construct a [`UserName`]. Surrounding whitespace is removed.
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if trimmed.chars().count() > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                max: USER_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Non-empty, trimmed e-mail address.
///
/// Uniqueness is compared case-insensitively via [`EmailAddress::normalized`];
/// the address itself is stored as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`]. Surrounding whitespace is removed.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = email.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Lower-cased form used for uniqueness checks.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validated input for creating a user. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: UserName,
    email: EmailAddress,
}

impl NewUser {
    /// Build a draft from validated parts.
    #[must_use]
    pub fn new(name: UserName, email: EmailAddress) -> Self {
        Self { name, email }
    }

    /// Validate raw strings into a draft, reporting the first failing field.
    ///
    /// # Examples
    /// ```
    /// use stats_api::domain::{NewUser, UserValidationError};
    ///
    /// let draft = NewUser::try_from_strings("Ann", "ann@x.com").expect("valid draft");
    /// assert_eq!(draft.name().as_ref(), "Ann");
    ///
    /// let err = NewUser::try_from_strings("", "a@b.com").expect_err("blank name");
    /// assert_eq!(err, UserValidationError::EmptyName);
    /// ```
    pub fn try_from_strings(
        name: impl AsRef<str>,
        email: impl AsRef<str>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self::new(UserName::new(name)?, EmailAddress::new(email)?))
    }

    /// Requested name.
    #[must_use]
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Requested e-mail address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }
}

/// Registered user.
///
/// ## Invariants
/// - `id` is assigned once by the entity store.
/// - `name` and `email` are non-empty once trimmed.
/// - `created_at` is set at insert and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(value_type = String, example = "Ann")]
    name: UserName,
    #[schema(value_type = String, example = "ann@example.com")]
    email: EmailAddress,
    #[schema(value_type = String, format = DateTime, example = "2025-01-01T09:30:00Z")]
    created_at: DateTime<Utc>,
}

impl User {
    /// Assemble a stored user from validated parts.
    #[must_use]
    pub fn new(
        id: UserId,
        name: UserName,
        email: EmailAddress,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            created_at,
        }
    }

    /// Assemble a stored user from a draft plus store-assigned fields.
    #[must_use]
    pub fn from_draft(id: UserId, draft: NewUser, created_at: DateTime<Utc>) -> Self {
        let NewUser { name, email } = draft;
        Self::new(id, name, email, created_at)
    }

    /// Stable user identifier.
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// User name.
    #[must_use]
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// E-mail address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
