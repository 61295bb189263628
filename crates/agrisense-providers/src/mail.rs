//! Weather-alert e-mail over SMTP with STARTTLS.

use std::time::Duration;

use agrisense_core::{ProviderError, provider::AlertMailer};
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};

const PROVIDER: &str = "smtp";

#[derive(Debug, Clone)]
pub struct MailConfig {
  pub server:    String,
  pub port:      u16,
  /// Sender address, also the SMTP login.
  pub sender:    String,
  pub password:  String,
  pub recipient: String,
  pub timeout:   Duration,
}

#[derive(Clone)]
pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
  to:        Mailbox,
}

impl SmtpMailer {
  /// Validate both addresses and prepare the relay. No connection is made
  /// until the first alert is sent.
  pub fn new(config: MailConfig) -> Result<Self, ProviderError> {
    let from = mailbox("sender", &config.sender)?;
    let to = mailbox("recipient", &config.recipient)?;

    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
      .map_err(|e| ProviderError::Malformed {
        provider: PROVIDER,
        message:  format!("invalid SMTP server {:?}: {e}", config.server),
      })?
      .port(config.port)
      .credentials(Credentials::new(config.sender, config.password))
      .timeout(Some(config.timeout))
      .build();

    Ok(Self { transport, from, to })
  }
}

fn mailbox(field: &str, raw: &str) -> Result<Mailbox, ProviderError> {
  raw.trim().parse().map_err(|e| ProviderError::Malformed {
    provider: PROVIDER,
    message:  format!("invalid {field} address {raw:?}: {e}"),
  })
}

impl AlertMailer for SmtpMailer {
  async fn send_alert(&self, subject: &str, body: &str) -> Result<(), ProviderError> {
    let message = Message::builder()
      .from(self.from.clone())
      .to(self.to.clone())
      .subject(subject)
      .header(ContentType::TEXT_PLAIN)
      .body(body.to_owned())
      .map_err(|e| ProviderError::Malformed { provider: PROVIDER, message: e.to_string() })?;

    self
      .transport
      .send(message)
      .await
      .map_err(|e| ProviderError::Transport { provider: PROVIDER, message: e.to_string() })?;
    tracing::info!(to = %self.to, "weather alert e-mailed");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(port: u16) -> MailConfig {
    MailConfig {
      server: "localhost".into(),
      port,
      sender: "alerts@farm.example".into(),
      password: "secret".into(),
      recipient: "grower@farm.example".into(),
      timeout: Duration::from_secs(5),
    }
  }

  #[test]
  fn bad_addresses_are_rejected_up_front() {
    let err = SmtpMailer::new(MailConfig { sender: "not an address".into(), ..config(587) })
      .err()
      .unwrap();
    assert!(matches!(err, ProviderError::Malformed { .. }));
    assert!(err.to_string().contains("sender"));

    let err = SmtpMailer::new(MailConfig { recipient: String::new(), ..config(587) })
      .err()
      .unwrap();
    assert!(err.to_string().contains("recipient"));
  }

  #[tokio::test]
  async fn unreachable_relay_is_a_transport_error() {
    let port = {
      let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
      l.local_addr().unwrap().port()
    };
    let mailer = SmtpMailer::new(config(port)).unwrap();
    let err = mailer.send_alert("Weather Alert", "Weather in Mumbai: haze").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport { provider: "smtp", .. }));
  }
}
