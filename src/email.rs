use std::path::Path;

use lettre::{
    Message, Transport,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{self, SmtpTransport, authentication::Credentials},
};
use tracing::{info, instrument, warn};

use crate::{Result, SchedulerError};

/// Everything needed to compose one outgoing message
#[derive(Debug, Clone, Default)]
pub struct EmailDraft {
    pub from: String,
    /// Comma separated addresses
    pub recipients: String,
    pub subject: String,
    /// Message body, or a path to a file holding it
    pub text: String,
    pub image: Option<String>,
}

/// SMTP connection settings for one send
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e| SchedulerError::email(format!("Invalid address '{}': {e}", address.trim())))
}

fn body_text(text: &str) -> Result<String> {
    let path = Path::new(text);
    if path.is_file() {
        Ok(std::fs::read_to_string(path)?)
    } else {
        Ok(text.to_string())
    }
}

fn image_content_type(path: &Path) -> Result<ContentType> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    };
    ContentType::parse(mime).map_err(|e| SchedulerError::email(e.to_string()))
}

fn image_part(path: &Path) -> Result<SinglePart> {
    let content = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(Attachment::new(filename).body(content, image_content_type(path)?))
}

/// Compose a multipart message: the text part first, then the image when
/// `draft.image` names an existing file.
pub fn build_message(draft: &EmailDraft) -> Result<Message> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&draft.from)?)
        .subject(draft.subject.as_str());

    let mut recipient_count = 0;
    for recipient in draft.recipients.split(',').filter(|r| !r.trim().is_empty()) {
        builder = builder.to(parse_mailbox(recipient)?);
        recipient_count += 1;
    }
    if recipient_count == 0 {
        return Err(SchedulerError::email("No recipients given"));
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(body_text(&draft.text)?));

    match draft.image.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(image) if Path::new(image).is_file() => {
            body = body.singlepart(image_part(Path::new(image))?);
        }
        Some(image) => warn!("Image {} is not a file, sending without it", image),
        None => {}
    }

    builder
        .multipart(body)
        .map_err(|e| SchedulerError::email(e.to_string()))
}

// 530, 534, 535: authentication required / too weak / credentials rejected
fn is_auth_code(code: &str) -> bool {
    matches!(code, "530" | "534" | "535")
}

fn classify_smtp_error(error: smtp::Error) -> SchedulerError {
    let auth_failure = error
        .status()
        .is_some_and(|code| is_auth_code(&code.to_string()));
    if auth_failure {
        SchedulerError::SmtpAuth {
            message: error.to_string(),
        }
    } else {
        SchedulerError::SmtpSend {
            message: error.to_string(),
        }
    }
}

/// Send `message` over a STARTTLS-upgraded connection, logging in first when
/// both username and password are present. Nothing is retried.
#[instrument(skip(settings, message), fields(server = %settings.server, port = settings.port))]
pub fn send_tls_message(settings: &SmtpSettings, message: &Message) -> Result<()> {
    let mut transport = SmtpTransport::starttls_relay(&settings.server)
        .map_err(classify_smtp_error)?
        .port(settings.port);

    match (settings.username.as_deref(), settings.password.as_deref()) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            transport = transport.credentials(Credentials::new(
                username.to_string(),
                password.to_string(),
            ));
        }
        _ => warn!("No SMTP credentials, sending unauthenticated"),
    }

    transport
        .build()
        .send(message)
        .map_err(classify_smtp_error)?;

    info!("Message sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> EmailDraft {
        EmailDraft {
            from: "organizer@example.com".to_string(),
            recipients: "alice@example.com, bob@example.com".to_string(),
            subject: "Wednesday ride".to_string(),
            text: "Ride starts at the shelter.".to_string(),
            image: None,
        }
    }

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn test_headers_and_text_body() {
        let message = build_message(&draft()).unwrap();
        let raw = formatted(&message);
        assert!(raw.contains("Subject: Wednesday ride"));
        assert!(raw.contains("alice@example.com"));
        assert!(raw.contains("bob@example.com"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("Ride starts at the shelter."));
    }

    #[test]
    fn test_text_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.txt");
        std::fs::write(&path, "Bring a spare tube.").unwrap();

        let message = build_message(&EmailDraft {
            text: path.display().to_string(),
            ..draft()
        })
        .unwrap();
        assert!(formatted(&message).contains("Bring a spare tube."));
    }

    #[test]
    fn test_image_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let message = build_message(&EmailDraft {
            image: Some(path.display().to_string()),
            ..draft()
        })
        .unwrap();
        let raw = formatted(&message);
        assert!(raw.contains("image/png"));
        assert!(raw.contains("route.png"));
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let message = build_message(&EmailDraft {
            image: Some("/nonexistent/route.png".to_string()),
            ..draft()
        })
        .unwrap();
        assert!(!formatted(&message).contains("image/png"));
    }

    #[rstest]
    #[case("not an address", "alice@example.com")]
    #[case("organizer@example.com", "")]
    #[case("organizer@example.com", "alice@example.com, nope")]
    fn test_bad_addresses(#[case] from: &str, #[case] recipients: &str) {
        let err = build_message(&EmailDraft {
            from: from.to_string(),
            recipients: recipients.to_string(),
            ..draft()
        })
        .unwrap_err();
        assert!(matches!(err, SchedulerError::Email { .. }));
    }

    #[rstest]
    #[case("535", true)]
    #[case("530", true)]
    #[case("550", false)]
    #[case("421", false)]
    fn test_auth_codes(#[case] code: &str, #[case] auth: bool) {
        assert_eq!(is_auth_code(code), auth);
    }
}
