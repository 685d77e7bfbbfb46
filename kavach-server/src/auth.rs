//! Authentication collaborator. Hard-coded per §9 Open Question (c): the
//! real deployment fronts this service with a separate identity provider,
//! so the login check here is a stand-in, not part of the decode core.

const VALID_USERNAME: &str = "admin";
const VALID_PASSWORD: &str = "admin123";

#[derive(Debug, serde::Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub fn check_credentials(req: &LoginRequest) -> bool {
    req.username == VALID_USERNAME && req.password == VALID_PASSWORD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_credentials_accepted() {
        let req = LoginRequest { username: "admin".into(), password: "admin123".into() };
        assert!(check_credentials(&req));
    }

    #[test]
    fn test_invalid_credentials_rejected() {
        let req = LoginRequest { username: "admin".into(), password: "wrong".into() };
        assert!(!check_credentials(&req));
    }
}
