//! Customer SMS composition and the CSV outbox
//!
//! Messages are composed from a [`Notification`] and handed to a
//! [`Notifier`]. `CsvOutbox` is the notifier used by the command line: it
//! appends every message to a CSV file for a gateway to pick up.
//!
//! With a [`LinkShortener`] attached, document links are shortened before
//! they go into the message. A link that cannot be shortened is sent in
//! full.

use super::short_links::LinkShortener;
use crate::core::Notifier;
use crate::types::{DocumentKind, Notification, RentalError};
use csv::Writer;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Country prefix replacing a leading trunk `0`
pub const COUNTRY_PREFIX: &str = "94";

/// Normalise a local phone number to international form
///
/// A leading `0` is replaced by the country prefix; any other number is
/// returned trimmed but otherwise unchanged.
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    match phone.strip_prefix('0') {
        Some(local) => format!("{}{}", COUNTRY_PREFIX, local),
        None => phone.to_string(),
    }
}

/// A composed SMS ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub recipient: String,
    pub sender: String,
    pub kind: DocumentKind,
    pub message: String,
}

impl SmsMessage {
    /// Compose the SMS for `notification`
    ///
    /// # Errors
    ///
    /// `RentalError::NotificationFailed` when the phone, name or link is missing.
    pub fn compose(notification: &Notification, sender: &str) -> Result<Self, RentalError> {
        Self::compose_with(notification, sender, None)
    }

    /// Compose the SMS, shortening the document link with `shortener`
    pub fn compose_with(
        notification: &Notification,
        sender: &str,
        shortener: Option<&dyn LinkShortener>,
    ) -> Result<Self, RentalError> {
        let name = notification.customer_name.trim();
        let phone = notification.customer_phone.trim();
        let link = notification.link.trim();

        if phone.is_empty() {
            return Err(RentalError::notification_failed("missing customer phone"));
        }
        if name.is_empty() {
            return Err(RentalError::notification_failed("missing customer name"));
        }
        if link.is_empty() {
            return Err(RentalError::notification_failed("missing document link"));
        }

        let link = match shortener.map(|shortener| shortener.shorten(link)) {
            Some(Ok(short)) => short,
            Some(Err(e)) => {
                warn!(link = link, error = %e, "Link shortening failed, sending full link");
                link.to_string()
            }
            None => link.to_string(),
        };

        let message = match notification.kind {
            DocumentKind::Agreement => {
                format!("Hi {}, your rental is confirmed! Agreement: {}", name, link)
            }
            DocumentKind::Invoice => format!(
                "Hi {}, thanks for riding with {}! Here is your invoice: {}",
                name, sender, link
            ),
        };

        Ok(Self {
            recipient: normalize_phone(phone),
            sender: sender.to_string(),
            kind: notification.kind,
            message,
        })
    }
}

/// Notifier that appends composed messages to a CSV outbox
///
/// Columns: recipient, sender, kind, message
pub struct CsvOutbox<W: Write> {
    sender_id: String,
    shortener: Option<Arc<dyn LinkShortener>>,
    writer: Mutex<Writer<W>>,
}

impl<W: Write> CsvOutbox<W> {
    /// Create an outbox writing to `output` and write the header row
    pub fn new(output: W, sender_id: impl Into<String>) -> Result<Self, RentalError> {
        let mut writer = Writer::from_writer(output);
        writer.write_record(["recipient", "sender", "kind", "message"])?;
        writer.flush()?;

        Ok(Self {
            sender_id: sender_id.into(),
            shortener: None,
            writer: Mutex::new(writer),
        })
    }

    /// Shorten document links before they are sent
    pub fn with_shortener(mut self, shortener: Arc<dyn LinkShortener>) -> Self {
        self.shortener = Some(shortener);
        self
    }

    /// Flush and return the underlying output
    pub fn into_inner(self) -> Result<W, RentalError> {
        let writer = self
            .writer
            .into_inner()
            .map_err(|_| RentalError::notification_failed("outbox lock poisoned"))?;
        writer
            .into_inner()
            .map_err(|e| RentalError::notification_failed(e.to_string()))
    }
}

impl<W: Write + Send> Notifier for CsvOutbox<W> {
    fn notify(&self, notification: &Notification) -> Result<(), RentalError> {
        let sms =
            SmsMessage::compose_with(notification, &self.sender_id, self.shortener.as_deref())?;
        let kind = sms.kind.to_string();

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| RentalError::notification_failed("outbox lock poisoned"))?;
        writer
            .write_record([
                sms.recipient.as_str(),
                sms.sender.as_str(),
                kind.as_str(),
                sms.message.as_str(),
            ])
            .map_err(|e| RentalError::notification_failed(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| RentalError::notification_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::short_links::InMemoryLinkShortener;
    use rstest::{fixture, rstest};

    struct UnavailableShortener;

    impl LinkShortener for UnavailableShortener {
        fn shorten(&self, _long_url: &str) -> Result<String, RentalError> {
            Err(RentalError::notification_failed("link table unavailable"))
        }

        fn resolve(&self, _id: &str) -> Option<String> {
            None
        }
    }

    #[fixture]
    fn notification() -> Notification {
        Notification {
            kind: DocumentKind::Invoice,
            customer_name: "Nimal Perera".to_string(),
            customer_phone: "0771234567".to_string(),
            link: "docs/invoice-1.txt".to_string(),
        }
    }

    #[rstest]
    #[case::local("0771234567", "94771234567")]
    #[case::international("94771234567", "94771234567")]
    #[case::padded(" 0771234567 ", "94771234567")]
    #[case::only_first_zero("0077123", "94077123")]
    fn test_normalize_phone(#[case] phone: &str, #[case] expected: &str) {
        assert_eq!(normalize_phone(phone), expected);
    }

    #[rstest]
    fn test_compose_invoice(notification: Notification) {
        let sms = SmsMessage::compose(&notification, "RIDEON").unwrap();

        assert_eq!(sms.recipient, "94771234567");
        assert_eq!(sms.sender, "RIDEON");
        assert_eq!(
            sms.message,
            "Hi Nimal Perera, thanks for riding with RIDEON! Here is your invoice: docs/invoice-1.txt"
        );
    }

    #[rstest]
    fn test_compose_agreement(mut notification: Notification) {
        notification.kind = DocumentKind::Agreement;
        notification.link = "docs/agreement-1.txt".to_string();

        let sms = SmsMessage::compose(&notification, "RIDEON").unwrap();

        assert_eq!(
            sms.message,
            "Hi Nimal Perera, your rental is confirmed! Agreement: docs/agreement-1.txt"
        );
    }

    #[rstest]
    #[case::phone("phone", "missing customer phone")]
    #[case::name("name", "missing customer name")]
    #[case::link("link", "missing document link")]
    fn test_compose_requires_fields(
        mut notification: Notification,
        #[case] field: &str,
        #[case] expected: &str,
    ) {
        match field {
            "phone" => notification.customer_phone = " ".to_string(),
            "name" => notification.customer_name.clear(),
            _ => notification.link.clear(),
        }

        let result = SmsMessage::compose(&notification, "RIDEON");

        assert_eq!(result, Err(RentalError::notification_failed(expected)));
    }

    #[rstest]
    fn test_csv_outbox_appends_messages(notification: Notification) {
        let outbox = CsvOutbox::new(Vec::new(), "RIDEON").unwrap();

        outbox.notify(&notification).unwrap();
        let mut incomplete = notification.clone();
        incomplete.customer_phone.clear();
        assert!(outbox.notify(&incomplete).is_err());

        let output = String::from_utf8(outbox.into_inner().unwrap()).unwrap();
        assert_eq!(
            output,
            "recipient,sender,kind,message\n\
             94771234567,RIDEON,invoice,\"Hi Nimal Perera, thanks for riding with RIDEON! Here is your invoice: docs/invoice-1.txt\"\n"
        );
    }

    #[rstest]
    fn test_compose_with_shortened_link(notification: Notification) {
        let shortener = InMemoryLinkShortener::new("https://rideon.lk");

        let sms = SmsMessage::compose_with(&notification, "RIDEON", Some(&shortener)).unwrap();

        let (id, long_url) = shortener.links().pop().unwrap();
        assert_eq!(long_url, "docs/invoice-1.txt");
        assert_eq!(
            sms.message,
            format!(
                "Hi Nimal Perera, thanks for riding with RIDEON! Here is your invoice: https://rideon.lk/r/{}",
                id
            )
        );
        assert_eq!(shortener.resolve(&id), Some(notification.link));
    }

    #[rstest]
    fn test_compose_falls_back_to_full_link(notification: Notification) {
        let sms =
            SmsMessage::compose_with(&notification, "RIDEON", Some(&UnavailableShortener)).unwrap();

        assert!(sms.message.ends_with("Here is your invoice: docs/invoice-1.txt"));
    }

    #[rstest]
    fn test_csv_outbox_with_shortener(notification: Notification) {
        let shortener = Arc::new(InMemoryLinkShortener::new("https://rideon.lk"));
        let outbox = CsvOutbox::new(Vec::new(), "RIDEON")
            .unwrap()
            .with_shortener(shortener.clone());

        outbox.notify(&notification).unwrap();

        let output = String::from_utf8(outbox.into_inner().unwrap()).unwrap();
        let (id, _) = shortener.links().pop().unwrap();
        assert!(output.contains(&format!("invoice: https://rideon.lk/r/{}\"", id)));
        assert!(!output.contains("docs/invoice-1.txt"));
    }

    #[rstest]
    fn test_csv_outbox_sends_full_link_when_shortening_fails(notification: Notification) {
        let outbox = CsvOutbox::new(Vec::new(), "RIDEON")
            .unwrap()
            .with_shortener(Arc::new(UnavailableShortener));

        outbox.notify(&notification).unwrap();

        let output = String::from_utf8(outbox.into_inner().unwrap()).unwrap();
        assert!(output.contains("Here is your invoice: docs/invoice-1.txt\""));
    }
}
