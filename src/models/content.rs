//! Typed payload content and its canonical text form
//!
//! The encoder only ever sees bytes; these variants serialize to the
//! conventional URI-ish forms that phone scanners recognise.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wi-Fi authentication type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiSecurity {
    /// WPA/WPA2/WPA3 personal
    Wpa,
    /// Legacy WEP
    Wep,
    /// Open network
    Open,
}

impl WifiSecurity {
    fn tag(&self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::Open => "nopass",
        }
    }
}

/// Structured payloads with a canonical serialization each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Free text, used verbatim
    Text(String),
    /// Web address, used verbatim
    Url(String),
    /// Wi-Fi network credentials
    Wifi {
        /// Network name
        ssid: String,
        /// Authentication type
        security: WifiSecurity,
        /// Passphrase (ignored for open networks)
        password: String,
        /// Hidden SSID
        hidden: bool,
    },
    /// Contact card (vCard 3.0)
    VCard {
        /// Full name
        name: String,
        /// Organization
        organization: String,
        /// Job title
        title: String,
        /// Phone number
        phone: String,
        /// Email address
        email: String,
        /// Homepage
        url: String,
    },
    /// Email draft
    Email {
        /// Recipient
        to: String,
        /// Subject line
        subject: String,
        /// Body text
        body: String,
    },
    /// Text message draft
    Sms {
        /// Recipient number
        number: String,
        /// Message body
        message: String,
    },
    /// Phone number
    Phone(String),
    /// Geographic location
    Geo {
        /// Latitude in degrees
        lat: f64,
        /// Longitude in degrees
        lon: f64,
    },
}

impl Payload {
    /// Kind of content this payload serializes to
    pub fn kind(&self) -> ContentKind {
        match self {
            Payload::Text(_) => ContentKind::Text,
            Payload::Url(_) => ContentKind::Url,
            Payload::Wifi { .. } => ContentKind::Wifi,
            Payload::VCard { .. } => ContentKind::VCard,
            Payload::Email { .. } => ContentKind::Email,
            Payload::Sms { .. } => ContentKind::Sms,
            Payload::Phone(_) => ContentKind::Phone,
            Payload::Geo { .. } => ContentKind::Geo,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) | Payload::Url(text) => f.write_str(text),
            Payload::Wifi {
                ssid,
                security,
                password,
                hidden,
            } => {
                write!(f, "WIFI:S:{};T:{};", escape_wifi(ssid), security.tag())?;
                if *security != WifiSecurity::Open {
                    write!(f, "P:{};", escape_wifi(password))?;
                }
                if *hidden {
                    f.write_str("H:true;")?;
                }
                f.write_str(";")
            }
            Payload::VCard {
                name,
                organization,
                title,
                phone,
                email,
                url,
            } => {
                f.write_str("BEGIN:VCARD\nVERSION:3.0\n")?;
                for (key, value) in [
                    ("FN", name),
                    ("ORG", organization),
                    ("TITLE", title),
                    ("TEL", phone),
                    ("EMAIL", email),
                    ("URL", url),
                ] {
                    if !value.is_empty() {
                        writeln!(f, "{}:{}", key, value)?;
                    }
                }
                f.write_str("END:VCARD")
            }
            Payload::Email { to, subject, body } => {
                write!(f, "mailto:{}", to)?;
                let mut sep = '?';
                if !subject.is_empty() {
                    write!(f, "{}subject={}", sep, percent_encode(subject))?;
                    sep = '&';
                }
                if !body.is_empty() {
                    write!(f, "{}body={}", sep, percent_encode(body))?;
                }
                Ok(())
            }
            Payload::Sms { number, message } => write!(f, "SMSTO:{}:{}", number, message),
            Payload::Phone(number) => write!(f, "tel:{}", number),
            Payload::Geo { lat, lon } => write!(f, "geo:{},{}", lat, lon),
        }
    }
}

fn escape_wifi(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Content type inferred from decoded text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    /// http/https/www address
    Url,
    /// WIFI: credentials
    Wifi,
    /// vCard contact
    VCard,
    /// mailto: link
    Email,
    /// SMS/SMSTO draft
    Sms,
    /// tel: number
    Phone,
    /// geo: location
    Geo,
    /// Anything else that is valid text
    Text,
    /// Bytes that are not valid UTF-8
    Binary,
}

impl ContentKind {
    /// Classify decoded text by its prefix
    pub fn infer(text: &str) -> Self {
        let lower: String = text
            .trim_start()
            .chars()
            .take(12)
            .collect::<String>()
            .to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.")
        {
            ContentKind::Url
        } else if lower.starts_with("wifi:") {
            ContentKind::Wifi
        } else if lower.starts_with("begin:vcard") {
            ContentKind::VCard
        } else if lower.starts_with("mailto:") {
            ContentKind::Email
        } else if lower.starts_with("smsto:") || lower.starts_with("sms:") {
            ContentKind::Sms
        } else if lower.starts_with("tel:") {
            ContentKind::Phone
        } else if lower.starts_with("geo:") {
            ContentKind::Geo
        } else {
            ContentKind::Text
        }
    }

    /// Lowercase label used in exports
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Url => "url",
            ContentKind::Wifi => "wifi",
            ContentKind::VCard => "vcard",
            ContentKind::Email => "email",
            ContentKind::Sms => "sms",
            ContentKind::Phone => "phone",
            ContentKind::Geo => "geo",
            ContentKind::Text => "text",
            ContentKind::Binary => "binary",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
