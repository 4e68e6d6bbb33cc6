use iot_auth::{AuthError, AuthService, JwtManager};

#[test]
fn jwt_issue_and_decode() {
    let jwt = JwtManager::new("secret".to_string(), 3600);
    let tokens = jwt.issue_access("admin").expect("tokens");
    assert_eq!(tokens.token_type, "bearer");
    assert_eq!(tokens.expires_in, 3600);
    let subject = jwt.decode_access(&tokens.access_token).expect("access");
    assert_eq!(subject, "admin");
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let issuer = JwtManager::new("secret-a".to_string(), 3600);
    let verifier = JwtManager::new("secret-b".to_string(), 3600);
    let tokens = issuer.issue_access("admin").expect("tokens");
    assert!(matches!(
        verifier.decode_access(&tokens.access_token),
        Err(AuthError::TokenInvalid)
    ));
}

#[test]
fn service_login_checks_configured_account() {
    let service = AuthService::new("admin", "admin", JwtManager::new("secret".to_string(), 60));
    let tokens = service.login("admin", "admin").expect("login");
    assert_eq!(
        service
            .verify_access_token(&tokens.access_token)
            .expect("verify"),
        "admin"
    );
    assert!(matches!(
        service.login("admin", "wrong"),
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        service.login("root", "admin"),
        Err(AuthError::InvalidCredentials)
    ));
}
