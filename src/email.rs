use anyhow::{Context, Result};
use lettre::{
    Message, Transport, transport::smtp::SmtpTransport,
    transport::smtp::authentication::Credentials,
};
use serde::{Deserialize, Serialize};
use std::env;

/// One facility the user picked for their shortlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistItem {
    pub name: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub distance_km: f64,
    pub subsidy: bool,
    pub cwelcc: bool,
}

fn create_mailer() -> Result<SmtpTransport> {
    let gmail_address = env::var("GMAIL_ADDRESS").context("Missing GMAIL_ADDRESS env var")?;
    let gmail_app_password =
        env::var("GMAIL_APP_PASSWORD").context("Missing GMAIL_APP_PASSWORD env var")?;

    let credentials = Credentials::new(gmail_address, gmail_app_password);

    let mailer = SmtpTransport::relay("smtp.gmail.com")?
        .credentials(credentials)
        .build();

    Ok(mailer)
}

/// Mail the user their shortlist of facilities
pub async fn send_shortlist(
    to_email: &str,
    search_address: &str,
    items: &[ShortlistItem],
) -> Result<()> {
    let gmail_address = env::var("GMAIL_ADDRESS").context("Missing GMAIL_ADDRESS env var")?;

    let email = Message::builder()
        .from(
            format!("Find My Daycare <{}>", gmail_address)
                .parse()
                .context("Failed to parse from address")?,
        )
        .to(to_email.parse().context("Failed to parse to address")?)
        .subject("Your Find My Daycare Shortlist")
        .body(build_body(search_address, items))?;

    let mailer = create_mailer()?;

    mailer.send(&email).context("Failed to send email")?;

    tracing::info!(
        "Sent shortlist of {} daycares to {}",
        items.len(),
        to_email
    );

    Ok(())
}

fn build_body(search_address: &str, items: &[ShortlistItem]) -> String {
    let mut lines = vec![
        "Your Daycare Shortlist".to_string(),
        format!("{} daycares near {}", items.len(), search_address),
        String::new(),
        "=".repeat(40),
        String::new(),
    ];

    for item in items {
        lines.push(item.name.clone());
        let postal = item.postal_code.as_deref().unwrap_or("");
        lines.push(format!("  {}, {}", item.address, postal));
        lines.push(format!("  {:.2} km away", item.distance_km));

        if let Some(phone) = &item.phone {
            lines.push(format!("  Phone: {phone}"));
        }

        let mut badges = Vec::new();
        if item.cwelcc {
            badges.push("CWELCC");
        }
        if item.subsidy {
            badges.push("Subsidy");
        }
        if !badges.is_empty() {
            lines.push(format!("  {}", badges.join(", ")));
        }

        lines.push(String::new());
    }

    lines.push("=".repeat(40));
    lines.push("Sent from Find My Daycare".to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> ShortlistItem {
        ShortlistItem {
            name: name.to_string(),
            address: "100 Queen St W".to_string(),
            postal_code: Some("M5H 2N2".to_string()),
            phone: Some("416-555-0100".to_string()),
            distance_km: 1.234,
            subsidy: true,
            cwelcc: false,
        }
    }

    #[test]
    fn test_body_lists_each_facility() {
        let body = build_body("10 Dundas St E", &[item("Happy Kids"), item("Sunny Days")]);

        assert!(body.contains("2 daycares near 10 Dundas St E"));
        assert!(body.contains("Happy Kids"));
        assert!(body.contains("Sunny Days"));
        assert!(body.contains("1.23 km away"));
        assert!(body.contains("Phone: 416-555-0100"));
        assert!(body.contains("Subsidy"));
        assert!(!body.contains("CWELCC"));
    }

    #[test]
    fn test_body_omits_missing_contact_info() {
        let mut sparse = item("Quiet Corner");
        sparse.phone = None;
        sparse.subsidy = false;

        let body = build_body("1 Main St", &[sparse]);
        assert!(!body.contains("Phone:"));
        assert!(!body.contains("Subsidy"));
    }
}
