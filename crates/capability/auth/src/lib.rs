//! 认证能力：单账号口令校验、JWT 签发与校验。

mod jwt;
mod password;

use subtle::ConstantTimeEq;

pub use jwt::JwtManager;
pub use password::{hash_password, verify_password};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

/// 登录返回的 token 结构。
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// 认证服务：校验配置中的唯一账号并签发 access token。
pub struct AuthService {
    username: String,
    password: String,
    jwt: JwtManager,
}

impl AuthService {
    /// `password` 可为明文或 argon2 PHC 哈希。
    pub fn new(username: impl Into<String>, password: impl Into<String>, jwt: JwtManager) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            jwt,
        }
    }

    /// 登录校验并签发 token。
    pub fn login(&self, username: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let username_ok: bool = self.username.as_bytes().ct_eq(username.as_bytes()).into();
        let password_ok = verify_password(&self.password, password)?;
        if !(username_ok && password_ok) {
            return Err(AuthError::InvalidCredentials);
        }
        self.jwt.issue_access(username)
    }

    /// 校验 access token，返回用户名。
    pub fn verify_access_token(&self, token: &str) -> Result<String, AuthError> {
        self.jwt.decode_access(token)
    }
}
