//! Login form

use phrasebank_lib::commands;
use phrasebank_lib::domain::Session;

use crate::context::AppContext;
use crate::store::Notice;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub identifier: String,
    pub secret: String,
    /// Shown under the form
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submit(&mut self, ctx: &AppContext) -> Result<Session, Notice> {
        match commands::sign_in(&ctx.state, self.identifier.clone(), self.secret.clone()).await {
            Ok(session) => {
                self.secret.clear();
                self.error = None;
                Ok(session)
            }
            Err(e) => {
                let notice = Notice::from(&e);
                self.error = Some(notice.text().to_string());
                Err(notice)
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = vec![
            "Sign in".to_string(),
            format!("  email: {}", self.identifier),
            format!("  password: {}", "*".repeat(self.secret.chars().count())),
        ];
        if let Some(error) = &self.error {
            out.push(format!("  {}", error));
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrasebank_lib::AppState;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failed_sign_in_shows_inline_error() {
        let ctx = AppContext::new(Arc::new(AppState::in_memory().await.unwrap()));
        commands::register_user(&ctx.state, "editor@example.com".into(), "pw".into())
            .await
            .unwrap();

        let mut form = LoginForm {
            identifier: "editor@example.com".into(),
            secret: "nope".into(),
            ..LoginForm::default()
        };
        let err = form.submit(&ctx).await.unwrap_err();
        assert!(matches!(err, Notice::Inline(_)));
        assert!(form.render().contains("Invalid email or password"));

        form.secret = "pw".into();
        let session = form.submit(&ctx).await.unwrap();
        assert_eq!(session.identifier, "editor@example.com");
        assert!(form.error.is_none());
        assert!(form.secret.is_empty());
    }
}
