//! Email service for registration codes and password reset links.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::services::auth::codes::{OTP_TTL_MINUTES, RESET_TOKEN_TTL_MINUTES};

/// HTML template for the registration OTP email.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    code: &'a str,
    minutes: i64,
}

/// Plain text template for the registration OTP email.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    code: &'a str,
    minutes: i64,
}

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    reset_url: &'a str,
    minutes: i64,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    reset_url: &'a str,
    minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the registration OTP.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let minutes = OTP_TTL_MINUTES;
        let html = VerificationCodeEmailHtml { code, minutes }.render()?;
        let text = VerificationCodeEmailText { code, minutes }.render()?;

        self.send_multipart_email(to, "Kode Verifikasi SelempangKu", &text, &html)
            .await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), EmailError> {
        let minutes = RESET_TOKEN_TTL_MINUTES;
        let html = PasswordResetEmailHtml { reset_url, minutes }.render()?;
        let text = PasswordResetEmailText { reset_url, minutes }.render()?;

        self.send_multipart_email(to, "Reset Password SelempangKu", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Build the browser link for a password reset.
#[must_use]
pub fn reset_link(frontend_url: &str, email: &str, token: &str) -> String {
    let base = frontend_url.trim_end_matches('/');
    match url::Url::parse(&format!("{base}/reset-password")) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("token", token)
                .append_pair("email", email);
            url.into()
        }
        Err(_) => format!("{base}/reset-password?token={token}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_templates_render_code() {
        let html = VerificationCodeEmailHtml {
            code: "482913",
            minutes: 10,
        }
        .render()
        .unwrap();
        let text = VerificationCodeEmailText {
            code: "482913",
            minutes: 10,
        }
        .render()
        .unwrap();
        assert!(html.contains("482913"));
        assert!(text.contains("482913"));
        assert!(text.contains("10"));
    }

    #[test]
    fn test_reset_template_escapes_url() {
        let html = PasswordResetEmailHtml {
            reset_url: "https://selempangku.id/reset-password?token=abc&email=a%40b.co",
            minutes: 60,
        }
        .render()
        .unwrap();
        assert!(html.contains("token=abc"));
        assert!(!html.contains("token=abc&email"));
    }

    #[test]
    fn test_reset_link_encodes_query() {
        let link = reset_link("https://selempangku.id/", "user+1@example.com", "abc123");
        assert_eq!(
            link,
            "https://selempangku.id/reset-password?token=abc123&email=user%2B1%40example.com"
        );
    }
}
