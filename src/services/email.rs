use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use crate::config::Config;

const APP_NAME: &str = "Fabulette";

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Returns None if SMTP is not fully configured.
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self { transport, from })
    }

    // ─── Private helpers ─────────────────────────────────────────────────────

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }

    /// Wraps inner HTML content in a consistent branded email layout.
    fn wrap_html(content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <title>{APP_NAME}</title>
</head>
<body style="margin:0;padding:0;background-color:#fdf6ee;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Helvetica,Arial,sans-serif">
  <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="background-color:#fdf6ee;padding:40px 16px">
    <tr>
      <td align="center">
        <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="max-width:520px">
          <tr>
            <td align="center" style="padding-bottom:28px">
              <p style="margin:0;font-size:22px;font-weight:700;color:#7c3aed;text-align:center">{APP_NAME}</p>
            </td>
          </tr>
          <tr>
            <td style="background:#ffffff;border-radius:12px;padding:40px;box-shadow:0 1px 3px rgba(0,0,0,0.08),0 8px 24px rgba(0,0,0,0.04)">
              {content}
            </td>
          </tr>
          <tr>
            <td align="center" style="padding-top:20px">
              <p style="margin:0;font-size:12px;color:#94a3b8">{APP_NAME} — des histoires dont votre enfant est le héros</p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#
        )
    }

    async fn send_email(
        &self,
        to: Mailbox,
        subject: &str,
        text: &str,
        html: &str,
    ) -> anyhow::Result<()> {
        let from = Mailbox::new(Some(APP_NAME.to_string()), self.from.email.clone());
        let email = Message::builder()
            .message_id(Some(self.new_message_id()))
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )
            .context("Failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("Failed to send email")?;

        Ok(())
    }

    // ─── Public methods ───────────────────────────────────────────────────────

    pub async fn send_welcome(&self, to_email: &str, first_name: &str) -> anyhow::Result<()> {
        let to: Mailbox = to_email.parse()?;
        let subject = format!("Bienvenue sur {APP_NAME} !");

        let text = format!(
            "Bonjour {first_name},\n\n\
            Bienvenue sur {APP_NAME} ! Créez le profil de votre enfant et \
            recevez chaque mois une histoire dont il est le héros.\n\n\
            {APP_NAME}"
        );

        let content = format!(
            r#"<h1 style="margin:0 0 8px 0;font-size:22px;font-weight:700;color:#0f172a">Bienvenue, {first_name} !</h1>
<p style="margin:0;font-size:15px;color:#64748b;line-height:1.6">Votre compte est prêt. Créez le profil de votre enfant en quelques étapes et recevez chaque mois une histoire dont il est le héros.</p>"#
        );

        let html = Self::wrap_html(&content);
        self.send_email(to, &subject, &text, &html).await
    }

    pub async fn send_family_invitation(
        &self,
        to_email: &str,
        inviter_name: &str,
        invite_url: &str,
    ) -> anyhow::Result<()> {
        let to: Mailbox = to_email.parse()?;
        let subject = format!("{inviter_name} vous invite sur {APP_NAME}");

        let text = format!(
            "Bonjour,\n\n\
            {inviter_name} vous invite à rejoindre son espace famille sur {APP_NAME}.\n\n\
            Cliquez sur ce lien pour accepter l'invitation (valide 7 jours) :\n\
            {invite_url}\n\n\
            Si vous ne connaissez pas cette personne, ignorez cet email.\n\n\
            {APP_NAME}"
        );

        let content = format!(
            r#"<h1 style="margin:0 0 8px 0;font-size:22px;font-weight:700;color:#0f172a">Invitation famille</h1>
<p style="margin:0 0 28px 0;font-size:15px;color:#64748b;line-height:1.6"><strong style="color:#334155">{inviter_name}</strong> vous invite à rejoindre son espace famille sur {APP_NAME} pour suivre les aventures des enfants.</p>
<table role="presentation" cellpadding="0" cellspacing="0" style="margin-bottom:28px">
  <tr>
    <td style="border-radius:8px;background:#7c3aed">
      <a href="{invite_url}" style="display:inline-block;padding:13px 28px;color:#ffffff;text-decoration:none;font-weight:600;font-size:15px;border-radius:8px">Rejoindre la famille</a>
    </td>
  </tr>
</table>
<p style="margin:0;font-size:13px;color:#94a3b8;border-top:1px solid #f1f5f9;padding-top:20px;line-height:1.5">Cette invitation expire dans <strong style="color:#64748b">7 jours</strong>. Si vous ne connaissez pas cette personne, ignorez cet email.</p>"#
        );

        let html = Self::wrap_html(&content);
        self.send_email(to, &subject, &text, &html).await
    }

    pub async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> anyhow::Result<()> {
        let to: Mailbox = format!("{to_name} <{to_email}>")
            .parse()
            .unwrap_or(to_email.parse()?);

        let subject = format!("Réinitialisation de mot de passe — {APP_NAME}");

        let text = format!(
            "Bonjour {to_name},\n\n\
            Vous avez demandé une réinitialisation de mot de passe pour {APP_NAME}.\n\n\
            Cliquez sur ce lien pour créer un nouveau mot de passe (valide 1 heure) :\n\
            {reset_url}\n\n\
            Si vous n'avez pas fait cette demande, ignorez cet email.\n\n\
            {APP_NAME}"
        );

        let content = format!(
            r#"<h1 style="margin:0 0 8px 0;font-size:22px;font-weight:700;color:#0f172a">Réinitialisation de mot de passe</h1>
<p style="margin:0 0 28px 0;font-size:15px;color:#64748b;line-height:1.6">Bonjour <strong style="color:#334155">{to_name}</strong>,<br><br>Vous avez demandé une réinitialisation de votre mot de passe. Cliquez sur le bouton ci-dessous pour en créer un nouveau.</p>
<table role="presentation" cellpadding="0" cellspacing="0" style="margin-bottom:28px">
  <tr>
    <td style="border-radius:8px;background:#7c3aed">
      <a href="{reset_url}" style="display:inline-block;padding:13px 28px;color:#ffffff;text-decoration:none;font-weight:600;font-size:15px;border-radius:8px">Réinitialiser mon mot de passe</a>
    </td>
  </tr>
</table>
<p style="margin:0;font-size:13px;color:#94a3b8;border-top:1px solid #f1f5f9;padding-top:20px;line-height:1.5">Ce lien expire dans <strong style="color:#64748b">1 heure</strong>. Si vous n'avez pas fait cette demande, ignorez cet email.</p>"#
        );

        let html = Self::wrap_html(&content);
        self.send_email(to, &subject, &text, &html).await
    }
}
