//! Authentication service implementation.

use crate::dto::{AssignRolesRequest, AuthResponse, AuthUserInfo, LoginRequest, RefreshTokenRequest, RegisterRequest};
use async_trait::async_trait;
use catalog_config::SecurityConfig;
use catalog_core::domain::{Email, User};
use catalog_core::{CatalogError, CatalogResult, UserId, ValidateExt};
use catalog_repository::{RoleRepository, UserRepository};
use catalog_security::{Claims, PasswordHasherInterface, PasswordPolicy, TokenProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Authentication service trait.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Registers a new user holding the default role.
    async fn register(&self, request: RegisterRequest) -> CatalogResult<AuthResponse>;

    /// Logs in with a username or email.
    async fn login(&self, request: LoginRequest) -> CatalogResult<AuthResponse>;

    /// Exchanges a refresh token for a new token pair.
    async fn refresh(&self, request: RefreshTokenRequest) -> CatalogResult<AuthResponse>;

    /// Validates an access token and returns claims.
    async fn validate_token(&self, token: &str) -> CatalogResult<Claims>;

    /// Profile of the authenticated user.
    async fn me(&self, user_id: UserId) -> CatalogResult<AuthUserInfo>;

    /// Replaces the roles of a user.
    async fn assign_roles(&self, user_id: UserId, request: AssignRolesRequest) -> CatalogResult<AuthUserInfo>;
}

/// Authentication service implementation.
pub struct AuthServiceImpl {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    password_hasher: Arc<dyn PasswordHasherInterface>,
    password_policy: PasswordPolicy,
    token_provider: Arc<TokenProvider>,
}

impl AuthServiceImpl {
    /// Creates a new authentication service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        password_hasher: Arc<dyn PasswordHasherInterface>,
        security_config: Arc<SecurityConfig>,
    ) -> Self {
        let password_policy = PasswordPolicy::new(security_config.password_policy.clone());
        let token_provider = Arc::new(TokenProvider::new(security_config));
        Self {
            users,
            roles,
            password_hasher,
            password_policy,
            token_provider,
        }
    }

    /// Creates an auth response for a user.
    async fn create_auth_response(&self, user: &User) -> CatalogResult<AuthResponse> {
        let permissions = self.users.permissions_for(user.id).await?;
        let tokens = self.token_provider.generate_tokens(user, &permissions)?;
        Ok(AuthResponse::new(tokens, AuthUserInfo::new(user, permissions)))
    }

    async fn find_active(&self, user_id: UserId) -> CatalogResult<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CatalogError::InvalidToken("User no longer exists".to_string()))?;
        if !user.is_active {
            return Err(CatalogError::forbidden("Account is disabled"));
        }
        Ok(user)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, request: RegisterRequest) -> CatalogResult<AuthResponse> {
        debug!("Registering user: {}", request.username);
        request.validate_request()?;

        if self.users.exists_by_username(&request.username).await? {
            return Err(CatalogError::conflict(format!(
                "Username '{}' already exists",
                request.username
            )));
        }
        if self.users.exists_by_email(&request.email).await? {
            return Err(CatalogError::conflict(format!("Email '{}' already exists", request.email)));
        }

        let email = Email::new(&request.email).map_err(|e| CatalogError::validation(e.to_string()))?;
        self.password_policy
            .check(&request.password)
            .map_err(|errors| CatalogError::validation(format!("password: {}", errors.join("; "))))?;
        let password_hash = self.password_hasher.hash(&request.password)?;

        let user = User::new(
            request.username,
            email,
            password_hash,
            request.first_name,
            request.last_name,
        );
        let saved = self.users.save(&user).await?;

        info!("User registered: {}", saved.id);
        self.create_auth_response(&saved).await
    }

    async fn login(&self, request: LoginRequest) -> CatalogResult<AuthResponse> {
        debug!("Login attempt for: {}", request.username_or_email);
        request.validate_request()?;

        let mut user = self
            .users
            .find_by_username_or_email(&request.username_or_email)
            .await?
            .ok_or_else(|| {
                warn!("Login failed: user not found - {}", request.username_or_email);
                CatalogError::InvalidCredentials
            })?;

        if !self.password_hasher.verify(&request.password, &user.password_hash)? {
            warn!("Login failed: invalid password - {}", user.id);
            return Err(CatalogError::InvalidCredentials);
        }
        if !user.is_active {
            warn!("Login failed: account disabled - {}", user.id);
            return Err(CatalogError::forbidden("Account is disabled"));
        }

        if self.password_hasher.needs_rehash(&user.password_hash) {
            match self.password_hasher.hash(&request.password) {
                Ok(hash) => {
                    debug!("Upgrading password hash for {}", user.id);
                    user.password_hash = hash;
                }
                Err(e) => warn!("Failed to rehash password for {}: {}", user.id, e),
            }
        }

        user.record_login();
        if let Err(e) = self.users.update(&user).await {
            warn!("Failed to record login for {}: {}", user.id, e);
        }

        info!("User logged in: {}", user.id);
        self.create_auth_response(&user).await
    }

    async fn refresh(&self, request: RefreshTokenRequest) -> CatalogResult<AuthResponse> {
        debug!("Refreshing token");

        let claims = self.token_provider.validate_refresh_token(&request.refresh_token)?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| CatalogError::InvalidToken("Invalid refresh token: missing user ID".to_string()))?;
        let user = self.find_active(user_id).await?;

        info!("Token refreshed for user: {}", user.id);
        self.create_auth_response(&user).await
    }

    async fn validate_token(&self, token: &str) -> CatalogResult<Claims> {
        self.token_provider.validate_access_token(token)
    }

    async fn me(&self, user_id: UserId) -> CatalogResult<AuthUserInfo> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", user_id))?;
        let permissions = self.users.permissions_for(user_id).await?;
        Ok(AuthUserInfo::new(&user, permissions))
    }

    async fn assign_roles(&self, user_id: UserId, request: AssignRolesRequest) -> CatalogResult<AuthUserInfo> {
        request.validate_request()?;

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("User", user_id))?;

        let mut names: Vec<String> = Vec::with_capacity(request.roles.len());
        for requested in &request.roles {
            let name = requested.trim().to_uppercase();
            if self.roles.find_by_name(&name).await?.is_none() {
                return Err(CatalogError::validation(format!("Unknown role '{requested}'")));
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }

        self.users.assign_roles(user_id, &names).await?;
        user.roles = names;
        let permissions = self.users.permissions_for(user_id).await?;

        info!("Roles of user {} set to {:?}", user_id, user.roles);
        Ok(AuthUserInfo::new(&user, permissions))
    }
}

impl std::fmt::Debug for AuthServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryRoleRepository, InMemoryUserRepository};
    use catalog_core::domain::permissions;
    use catalog_security::PasswordHasher;

    const PASSWORD: &str = "Password123!";

    fn create_test_config() -> Arc<SecurityConfig> {
        Arc::new(SecurityConfig {
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            ..SecurityConfig::default()
        })
    }

    fn hasher() -> Arc<PasswordHasher> {
        Arc::new(PasswordHasher::with_cost(1))
    }

    fn create_user_with_password(password: &str) -> User {
        User::new(
            "testuser".to_string(),
            Email::new_unchecked("test@example.com".to_string()),
            hasher().hash(password).unwrap(),
            Some("Test".to_string()),
            Some("User".to_string()),
        )
    }

    fn create_auth_service(users: Arc<InMemoryUserRepository>) -> AuthServiceImpl {
        AuthServiceImpl::new(
            users,
            Arc::new(InMemoryRoleRepository::default()),
            hasher(),
            create_test_config(),
        )
    }

    async fn service_with_user(user: User) -> (Arc<InMemoryUserRepository>, AuthServiceImpl) {
        let users = Arc::new(InMemoryUserRepository::default());
        users.save(&user).await.unwrap();
        (users.clone(), create_auth_service(users))
    }

    fn login(username_or_email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username_or_email: username_or_email.to_string(),
            password: password.to_string(),
        }
    }

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            first_name: Some("New".to_string()),
            last_name: Some("User".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let service = create_auth_service(Arc::new(InMemoryUserRepository::default()));

        let response = service.register(register("newuser", "new@example.com", PASSWORD)).await.unwrap();
        assert!(!response.access_token.is_empty());
        assert!(!response.refresh_token.is_empty());
        assert_eq!(response.user.username, "newuser");
        assert_eq!(response.user.roles, vec!["USER".to_string()]);
        assert!(response.user.permissions.contains(&permissions::PRODUCTS_READ.to_string()));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (_, service) = service_with_user(create_user_with_password(PASSWORD)).await;

        let result = service.register(register("testuser", "other@example.com", PASSWORD)).await;
        match result.unwrap_err() {
            CatalogError::Conflict(msg) => assert!(msg.contains("Username")),
            other => panic!("Expected Conflict error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (_, service) = service_with_user(create_user_with_password(PASSWORD)).await;

        let result = service.register(register("otheruser", "TEST@example.com", PASSWORD)).await;
        match result.unwrap_err() {
            CatalogError::Conflict(msg) => assert!(msg.contains("Email")),
            other => panic!("Expected Conflict error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let service = create_auth_service(Arc::new(InMemoryUserRepository::default()));

        let result = service.register(register("newuser", "new@example.com", "weak")).await;
        match result.unwrap_err() {
            CatalogError::Validation(msg) => assert!(msg.contains("password")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_success_records_login() {
        let user = create_user_with_password(PASSWORD);
        let user_id = user.id;
        let (users, service) = service_with_user(user).await;

        let response = service.login(login("testuser", PASSWORD)).await.unwrap();
        assert!(!response.access_token.is_empty());
        assert_eq!(response.token_type, "Bearer");
        assert!(response.expires_in > 0);
        assert!(users.get(user_id).unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_upgrades_outdated_hash() {
        let mut user = create_user_with_password(PASSWORD);
        user.password_hash = PasswordHasher::with_cost(2).hash(PASSWORD).unwrap();
        let outdated = user.password_hash.clone();
        let user_id = user.id;
        let (users, service) = service_with_user(user).await;

        service.login(login("testuser", PASSWORD)).await.unwrap();

        let stored = users.get(user_id).unwrap().password_hash;
        assert_ne!(stored, outdated);
        assert!(!hasher().needs_rehash(&stored));
        assert!(hasher().verify(PASSWORD, &stored).unwrap());
        assert!(service.login(login("testuser", PASSWORD)).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_keeps_current_hash() {
        let user = create_user_with_password(PASSWORD);
        let current = user.password_hash.clone();
        let user_id = user.id;
        let (users, service) = service_with_user(user).await;

        service.login(login("testuser", PASSWORD)).await.unwrap();
        assert_eq!(users.get(user_id).unwrap().password_hash, current);
    }

    #[tokio::test]
    async fn test_login_with_email() {
        let (_, service) = service_with_user(create_user_with_password(PASSWORD)).await;
        assert!(service.login(login("test@example.com", PASSWORD)).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_invalid_password() {
        let (_, service) = service_with_user(create_user_with_password(PASSWORD)).await;

        let result = service.login(login("testuser", "WrongPassword1!")).await;
        assert!(matches!(result, Err(CatalogError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_user_not_found() {
        let service = create_auth_service(Arc::new(InMemoryUserRepository::default()));

        let result = service.login(login("nonexistent", PASSWORD)).await;
        assert!(matches!(result, Err(CatalogError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_inactive_user() {
        let mut user = create_user_with_password(PASSWORD);
        user.deactivate();
        let (_, service) = service_with_user(user).await;

        let result = service.login(login("testuser", PASSWORD)).await;
        assert!(matches!(result, Err(CatalogError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_refresh_token_success() {
        let (_, service) = service_with_user(create_user_with_password(PASSWORD)).await;
        let tokens = service.login(login("testuser", PASSWORD)).await.unwrap();

        let refreshed = service
            .refresh(RefreshTokenRequest {
                refresh_token: tokens.refresh_token,
            })
            .await
            .unwrap();
        assert!(!refreshed.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (_, service) = service_with_user(create_user_with_password(PASSWORD)).await;
        let tokens = service.login(login("testuser", PASSWORD)).await.unwrap();

        let result = service
            .refresh(RefreshTokenRequest {
                refresh_token: tokens.access_token,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_refresh_token_invalid() {
        let service = create_auth_service(Arc::new(InMemoryUserRepository::default()));

        let result = service
            .refresh(RefreshTokenRequest {
                refresh_token: "invalid-token".to_string(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_validate_token_and_me() {
        let (_, service) = service_with_user(create_user_with_password(PASSWORD)).await;
        let tokens = service.login(login("testuser", PASSWORD)).await.unwrap();

        let claims = service.validate_token(&tokens.access_token).await.unwrap();
        assert_eq!(claims.username, "testuser");

        let me = service.me(claims.user_id().unwrap()).await.unwrap();
        assert_eq!(me.email, "test@example.com");
        assert_eq!(me.full_name.as_deref(), Some("Test User"));
    }

    #[tokio::test]
    async fn test_validate_token_invalid() {
        let service = create_auth_service(Arc::new(InMemoryUserRepository::default()));
        assert!(service.validate_token("invalid-token").await.is_err());
    }

    #[tokio::test]
    async fn test_assign_roles() {
        let user = create_user_with_password(PASSWORD);
        let user_id = user.id;
        let (users, service) = service_with_user(user).await;

        let info = service
            .assign_roles(
                user_id,
                AssignRolesRequest {
                    roles: vec!["manager".to_string(), "USER".to_string(), "MANAGER".to_string()],
                },
            )
            .await
            .unwrap();

        assert_eq!(info.roles, vec!["MANAGER".to_string(), "USER".to_string()]);
        assert!(info.permissions.contains(&permissions::PRODUCTS_CREATE.to_string()));
        assert_eq!(users.get(user_id).unwrap().roles.len(), 2);
    }

    #[tokio::test]
    async fn test_assign_unknown_role() {
        let user = create_user_with_password(PASSWORD);
        let user_id = user.id;
        let (_, service) = service_with_user(user).await;

        let result = service
            .assign_roles(
                user_id,
                AssignRolesRequest {
                    roles: vec!["OVERLORD".to_string()],
                },
            )
            .await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));

        let missing = service
            .assign_roles(
                UserId::new(),
                AssignRolesRequest {
                    roles: vec!["USER".to_string()],
                },
            )
            .await;
        assert!(matches!(missing, Err(CatalogError::NotFound { .. })));
    }
}
