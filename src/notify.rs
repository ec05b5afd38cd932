use lettre::{
    Message, SmtpTransport, Transport,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{error, info, instrument};

use crate::config::SmtpSettings;
use crate::error::NotificationError;

/// A quotation email with its PDF attached.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

pub trait Mailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError>;
}

pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    /// The transport is built per send, so bad settings surface as a send
    /// error instead of keeping the application from starting.
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn transport(&self) -> Result<SmtpTransport, NotificationError> {
        self.settings
            .validate()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let builder = if self.settings.implicit_tls {
            SmtpTransport::relay(&self.settings.host)
        } else {
            SmtpTransport::starttls_relay(&self.settings.host)
        }
        .map_err(|e| NotificationError::Transport(format!("TLS configuration error: {}", e)))?;

        let mut builder = builder.port(self.settings.port);
        if !self.settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            ));
        }
        Ok(builder.build())
    }

    pub fn build_message(&self, mail: &OutgoingMail) -> Result<Message, NotificationError> {
        build_message(&self.settings, mail)
    }
}

impl Mailer for SmtpMailer {
    #[instrument(skip(self, mail), fields(to = %mail.to, subject = %mail.subject))]
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        info!("Sending quotation email");
        let message = self.build_message(mail)?;
        let transport = self.transport()?;

        transport.send(&message).map_err(|e| {
            error!("Failed to send email: {}", e);
            NotificationError::Transport(e.to_string())
        })?;

        info!("Email sent successfully");
        Ok(())
    }
}

pub fn build_message(settings: &SmtpSettings, mail: &OutgoingMail) -> Result<Message, NotificationError> {
    let from = if settings.from_name.trim().is_empty() {
        settings.from_email.clone()
    } else {
        format!("{} <{}>", settings.from_name, settings.from_email)
    };
    let from_mailbox: Mailbox = from
        .parse()
        .map_err(|e| NotificationError::Address(format!("Invalid from address: {}", e)))?;

    let to_mailbox: Mailbox = mail
        .to
        .trim()
        .parse()
        .map_err(|e| NotificationError::Address(format!("Invalid to address: {}", e)))?;

    let pdf_type = ContentType::parse("application/pdf")
        .map_err(|e| NotificationError::Message(format!("Invalid content type: {}", e)))?;

    Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(&mail.subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(mail.body.clone()),
                )
                .singlepart(
                    Attachment::new(mail.attachment_name.clone())
                        .body(mail.attachment.clone(), pdf_type),
                ),
        )
        .map_err(|e| NotificationError::Message(format!("Failed to build message: {}", e)))
}
