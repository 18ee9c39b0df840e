//! User accounts.

mod email;

pub use email::Email;

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::identity::{Identity, Role};

pub const MAX_NAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const DEFAULT_AVATAR: &str = "https://via.placeholder.com/150";

/// Postal address kept on a user profile. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// A user account.
///
/// Secrets never serialize: the password hash and reset token are skipped,
/// so any `User` handed to a response is safe to expose.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_id: Option<String>,
    pub is_email_verified: bool,
    pub role: Role,
    pub wishlist: Vec<ProductId>,
    pub avatar: String,
    pub phone: String,
    pub address: Option<Address>,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

/// Checks password strength before hashing.
pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Please enter your name"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation("Name cannot exceed 50 characters"));
    }
    Ok(name.to_string())
}

impl User {
    /// Creates a password-based account. `password_hash` must already be hashed.
    pub fn register(
        name: &str,
        email: Email,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let user = Self::blank(validate_name(name)?, email, now);
        let user = Self {
            password_hash: Some(password_hash),
            ..user
        };
        user.validate()?;
        Ok(user)
    }

    /// Creates an account from a Google profile. The email is considered
    /// verified by the provider and no password is set.
    pub fn from_google(
        google_id: String,
        name: &str,
        email: Email,
        avatar: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = validate_name(name).unwrap_or_else(|_| email.as_str().to_string());
        let mut user = Self::blank(name, email, now);
        user.google_id = Some(google_id);
        user.is_email_verified = true;
        if let Some(avatar) = avatar.filter(|a| !a.is_empty()) {
            user.avatar = avatar;
        }
        user.validate()?;
        Ok(user)
    }

    fn blank(name: String, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            password_hash: None,
            google_id: None,
            facebook_id: None,
            is_email_verified: false,
            role: Role::User,
            wishlist: Vec::new(),
            avatar: DEFAULT_AVATAR.to_string(),
            phone: String::new(),
            address: None,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A password is required unless a federated identity is linked.
    /// Empty federated ids count as absent.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.password_hash.is_none() && !self.has_federated_identity() {
            return Err(DomainError::validation("Please enter a password"));
        }
        if matches!(self.google_id.as_deref(), Some(""))
            || matches!(self.facebook_id.as_deref(), Some(""))
        {
            return Err(DomainError::validation("External identity id cannot be empty"));
        }
        Ok(())
    }

    pub fn has_federated_identity(&self) -> bool {
        self.google_id.is_some() || self.facebook_id.is_some()
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }

    /// Links a Google identity to an existing account.
    pub fn link_google(&mut self, google_id: String, now: DateTime<Utc>) {
        if self.google_id.is_none() {
            self.google_id = Some(google_id);
            self.is_email_verified = true;
            self.updated_at = now;
        }
    }

    /// Applies profile changes. The email is parsed and normalized.
    pub fn apply_profile(
        &mut self,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(name) = update.name.filter(|n| !n.is_empty()) {
            self.name = validate_name(&name)?;
        }
        if let Some(email) = update.email.filter(|e| !e.is_empty()) {
            self.email = Email::parse(&email)?;
        }
        if let Some(phone) = update.phone.filter(|p| !p.is_empty()) {
            self.phone = phone;
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn set_password_hash(&mut self, hash: String, now: DateTime<Utc>) {
        self.password_hash = Some(hash);
        self.reset_password_token = None;
        self.reset_password_expire = None;
        self.updated_at = now;
    }

    pub fn set_role(&mut self, role: Role, now: DateTime<Utc>) {
        self.role = role;
        self.updated_at = now;
    }

    /// Adds a product to the wishlist. Membership is unique.
    pub fn add_to_wishlist(
        &mut self,
        product: ProductId,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.wishlist.contains(&product) {
            return Err(DomainError::AlreadyInWishlist);
        }
        self.wishlist.push(product);
        self.updated_at = now;
        Ok(())
    }

    /// Removes a product from the wishlist. Removing an absent product is a no-op.
    pub fn remove_from_wishlist(&mut self, product: ProductId, now: DateTime<Utc>) {
        self.wishlist.retain(|p| *p != product);
        self.updated_at = now;
    }
}
