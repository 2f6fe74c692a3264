/// Supplies the table session id and the staff token to the API layer.
pub trait CredentialProvider: Send + Sync + 'static {
    fn session_id(&self) -> Option<String>;
    fn admin_token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    session_id: Option<String>,
    admin_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(session_id: Option<String>, admin_token: Option<String>) -> Self {
        Self {
            session_id,
            admin_token,
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn admin_token(&self) -> Option<String> {
        self.admin_token.clone()
    }
}
