use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{ContactMessage, MailError, Mailer};
use crate::config::MailConfig;

/// SMTP-backed mailer forwarding contact submissions to the configured
/// recipient, with the visitor's address set as Reply-To.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(cfg: &MailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map_err(|e| MailError(e.to_string()))?
            .credentials(Credentials::new(
                cfg.smtp_username.clone(),
                cfg.smtp_password.clone(),
            ))
            .build();

        let from = format!("\"LearnLogix Contact\" <{}>", cfg.smtp_username)
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError(e.to_string()))?;
        let to = cfg
            .contact_recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError(e.to_string()))?;

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_contact(&self, msg: &ContactMessage) -> Result<(), MailError> {
        let reply_to: Mailbox = msg
            .email
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .reply_to(reply_to)
            .subject("New Contact Form Submission")
            .header(ContentType::TEXT_HTML)
            .body(render_contact_html(msg))
            .map_err(|e| MailError(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError(e.to_string()))?;
        Ok(())
    }
}

fn render_contact_html(msg: &ContactMessage) -> String {
    let program = msg.program.as_deref().unwrap_or("Not specified");
    format!(
        "<h2>New Contact Message</h2>\
         <hr />\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Program:</strong> {}</p>\
         <p><strong>Message:</strong></p>\
         <p>{}</p>",
        html_escape(&msg.name),
        html_escape(&msg.email),
        html_escape(program),
        html_escape(&msg.message),
    )
}

/// Minimal escaping for the interpolated form fields.
fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_html_escapes_fields() {
        let msg = ContactMessage {
            name: "A <script>".into(),
            email: "a@example.com".into(),
            program: None,
            message: "hello & goodbye".into(),
        };
        let html = render_contact_html(&msg);
        assert!(html.contains("A &lt;script&gt;"));
        assert!(html.contains("hello &amp; goodbye"));
        assert!(html.contains("Not specified"));
    }
}
