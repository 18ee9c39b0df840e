//! Registration, sign-in, profiles, wishlists and admin user management.

use auth::{GoogleProfile, TokenService, hash_password, verify_password};
use chrono::Utc;
use domain::{
    Email, Identity, Product, ProductId, ProfileUpdate, Role, User, UserId, validate_password,
};
use store::Store;

use crate::error::{Result, WorkflowError};

/// A signed-in user and the bearer token issued for them.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AccountService<S: Store> {
    store: S,
    tokens: TokenService,
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_off_thread(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| WorkflowError::Internal(e.to_string()))?
        .map_err(Into::into)
}

async fn verify_off_thread(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| WorkflowError::Internal(e.to_string()))
}

impl<S: Store> AccountService<S> {
    pub fn new(store: S, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn session(&self, user: User) -> Result<AuthSession> {
        let token = self.tokens.issue(user.id, user.role)?;
        Ok(AuthSession { token, user })
    }

    async fn load(&self, id: UserId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("User"))
    }

    #[tracing::instrument(skip(self, name, email, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(WorkflowError::Conflict("Email already registered".to_string()));
        }

        let hash = hash_off_thread(password.to_string()).await?;
        let user = User::register(name, email, hash, Utc::now())?;
        self.store.insert_user(user.clone()).await?;

        metrics::counter!("users_registered_total").increment(1);
        tracing::info!(user_id = %user.id, "user registered");
        self.session(user)
    }

    /// Password sign-in. Unknown email, password-less account and wrong
    /// password all fail the same way.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "Please provide email and password".to_string(),
            ));
        }
        let email = Email::parse(email).map_err(|_| WorkflowError::invalid_credentials())?;

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(WorkflowError::invalid_credentials)?;
        let hash = user
            .password_hash
            .clone()
            .ok_or_else(WorkflowError::invalid_credentials)?;

        if !verify_off_thread(password.to_string(), hash).await? {
            metrics::counter!("login_failures_total").increment(1);
            return Err(WorkflowError::invalid_credentials());
        }

        tracing::info!(user_id = %user.id, "user logged in");
        self.session(user)
    }

    /// Signs in with a Google profile: by linked Google id first, then by
    /// matching email (linking the account), otherwise a new verified
    /// account without a password.
    #[tracing::instrument(skip(self, profile), fields(google_id = %profile.id))]
    pub async fn federated_login(&self, profile: GoogleProfile) -> Result<AuthSession> {
        if let Some(user) = self.store.find_user_by_google_id(&profile.id).await? {
            return self.session(user);
        }

        let email = Email::parse(&profile.email)?;
        let now = Utc::now();

        if let Some(existing) = self.store.find_user_by_email(&email).await? {
            let google_id = profile.id;
            let user = self
                .store
                .update_user(existing.id, |user| {
                    user.link_google(google_id, now);
                    Ok(())
                })
                .await?;
            tracing::info!(user_id = %user.id, "linked Google account");
            return self.session(user);
        }

        let user = User::from_google(profile.id, &profile.name, email, profile.avatar, now)?;
        self.store.insert_user(user.clone()).await?;
        metrics::counter!("users_registered_total").increment(1);
        tracing::info!(user_id = %user.id, "user created from Google profile");
        self.session(user)
    }

    /// Maps a bearer token to the live account behind it. The role comes
    /// from the stored account, not the token.
    pub async fn resolve(&self, token: &str) -> Result<Identity> {
        let claims = self.tokens.verify(token)?;
        let user = self
            .store
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| WorkflowError::Unauthorized("User no longer exists".to_string()))?;
        Ok(user.identity())
    }

    #[tracing::instrument(skip(self))]
    pub async fn profile(&self, identity: Identity) -> Result<User> {
        self.load(identity.user_id).await
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, identity: Identity, update: ProfileUpdate) -> Result<User> {
        let now = Utc::now();
        Ok(self
            .store
            .update_user(identity.user_id, |user| user.apply_profile(update, now))
            .await?)
    }

    /// Changes the password. Accounts without a password (Google-only) may
    /// set a first one without supplying a current password.
    #[tracing::instrument(skip(self, current, new))]
    pub async fn change_password(
        &self,
        identity: Identity,
        current: Option<&str>,
        new: &str,
    ) -> Result<()> {
        if new.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "Please provide current and new password".to_string(),
            ));
        }
        validate_password(new)?;

        let user = self.load(identity.user_id).await?;
        if let Some(hash) = user.password_hash {
            let current = current.filter(|c| !c.is_empty()).ok_or_else(|| {
                WorkflowError::InvalidInput("Please provide current and new password".to_string())
            })?;
            if !verify_off_thread(current.to_string(), hash).await? {
                return Err(WorkflowError::Unauthorized(
                    "Current password is incorrect".to_string(),
                ));
            }
        }

        let hash = hash_off_thread(new.to_string()).await?;
        let now = Utc::now();
        self.store
            .update_user(identity.user_id, |user| {
                user.set_password_hash(hash, now);
                Ok(())
            })
            .await?;
        tracing::info!(user_id = %identity.user_id, "password changed");
        Ok(())
    }

    /// Wishlisted products that still exist, in insertion order.
    #[tracing::instrument(skip(self))]
    pub async fn wishlist(&self, identity: Identity) -> Result<Vec<Product>> {
        let user = self.load(identity.user_id).await?;
        Ok(self.store.get_products(&user.wishlist).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_to_wishlist(
        &self,
        identity: Identity,
        product: ProductId,
    ) -> Result<Vec<Product>> {
        if self.store.get_product(product).await?.is_none() {
            return Err(WorkflowError::not_found("Product"));
        }
        let now = Utc::now();
        let user = self
            .store
            .update_user(identity.user_id, |user| user.add_to_wishlist(product, now))
            .await?;
        Ok(self.store.get_products(&user.wishlist).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_from_wishlist(
        &self,
        identity: Identity,
        product: ProductId,
    ) -> Result<Vec<Product>> {
        let now = Utc::now();
        let user = self
            .store
            .update_user(identity.user_id, |user| {
                user.remove_from_wishlist(product, now);
                Ok(())
            })
            .await?;
        Ok(self.store.get_products(&user.wishlist).await?)
    }

    /// All accounts, newest first. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self, identity: Identity) -> Result<Vec<User>> {
        identity.require_admin()?;
        Ok(self.store.list_users().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_role(&self, identity: Identity, id: UserId, role: Role) -> Result<User> {
        identity.require_admin()?;
        let now = Utc::now();
        let user = self
            .store
            .update_user(id, |user| {
                user.set_role(role, now);
                Ok(())
            })
            .await?;
        tracing::info!(user_id = %id, role = %role, "role changed");
        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, identity: Identity, id: UserId) -> Result<()> {
        identity.require_admin()?;
        if !self.store.delete_user(id).await? {
            return Err(WorkflowError::not_found("User"));
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}
