//! Credential validation flows shared by the NFC and PIN endpoints.
//!
//! Both flows follow the same shape: look up an enabled credential, check
//! the owning user, check the global kill switch on the primary device, and
//! on acceptance append an audit entry before any best-effort notification.
//! Rejections return `valid: false` with a reason and leave no trace in the
//! audit trail.

use tracing::info;

use crate::dtos::credentials::{NfcValidationResponse, PinValidationResponse};
use crate::error::AppError;
use crate::models::{AccessType, NewLog, User};
use crate::services::database::Database;
use crate::services::messages::OutboundMessage;
use crate::services::registry::ConnectionRegistry;
use crate::services::whatsapp::WhatsAppNotifier;
use crate::PRIMARY_DEVICE_ID;

/// Candidate normalizations of a presented card UID, in match order:
/// the exact input (uppercased), the separator-stripped form, and the
/// canonical pairs-of-two grouping. Grouping applies only to 8-character
/// stripped UIDs. Duplicates are dropped while preserving order.
pub fn uid_candidates(raw: &str) -> Vec<String> {
    let exact = raw.trim().to_uppercase();
    let stripped: String = exact
        .chars()
        .filter(|c| !matches!(c, ' ' | ':' | '-'))
        .collect();

    let mut candidates = vec![exact, stripped.clone()];

    if stripped.len() == 8 {
        let grouped = stripped
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");
        candidates.push(grouped);
    }

    let mut seen = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && !seen.contains(&candidate) {
            seen.push(candidate);
        }
    }
    seen
}

/// The primary device's `nfc_reader_active` flag gates all credential
/// validation system-wide. A missing device row does not block access.
async fn reader_disabled(db: &Database) -> Result<bool, AppError> {
    let device = db.find_device_by_id(PRIMARY_DEVICE_ID).await?;
    Ok(matches!(device, Some(d) if !d.nfc_reader_active))
}

async fn find_enabled_owner(db: &Database, id_user: i64) -> Result<Option<User>, AppError> {
    let user = db.find_user_by_id(id_user).await?;
    Ok(user.filter(|u| u.status))
}

pub async fn validate_nfc(
    db: &Database,
    registry: &ConnectionRegistry,
    whatsapp: &WhatsAppNotifier,
    card_uid: &str,
) -> Result<NfcValidationResponse, AppError> {
    let mut card = None;
    for candidate in uid_candidates(card_uid) {
        if let Some(found) = db.find_enabled_card_by_uid(&candidate).await? {
            card = Some(found);
            break;
        }
    }

    let Some(card) = card else {
        return Ok(NfcValidationResponse::rejected("Card not recognized or disabled"));
    };

    let Some(user) = find_enabled_owner(db, card.id_user).await? else {
        return Ok(NfcValidationResponse::rejected("User disabled"));
    };

    if reader_disabled(db).await? {
        return Ok(NfcValidationResponse::rejected(
            "NFC reader disabled - system out of service",
        ));
    }

    db.append_log(
        NewLog::new(
            PRIMARY_DEVICE_ID,
            AccessType::Nfc,
            format!("Access granted via NFC - card: {}", card.card_name),
        )
        .with_user(user.id),
    )
    .await?;

    info!(user_id = user.id, card_id = card.id, "NFC access granted");

    registry.send_to_device(
        PRIMARY_DEVICE_ID,
        &OutboundMessage::NfcAccess {
            valid: true,
            user_name: user.name.clone(),
            message: format!("Welcome {}", user.name),
        },
    );
    whatsapp.notify_access(&user.name, "NFC", Some(&card.card_name));

    Ok(NfcValidationResponse {
        valid: true,
        card: Some(card),
        message: format!("Welcome {}", user.name),
        user: Some(user.into()),
    })
}

pub async fn validate_pin(
    db: &Database,
    registry: &ConnectionRegistry,
    whatsapp: &WhatsAppNotifier,
    pin_code: &str,
) -> Result<PinValidationResponse, AppError> {
    let Some(pin) = db.find_enabled_pin_by_code(pin_code).await? else {
        return Ok(PinValidationResponse::rejected("PIN not recognized or disabled"));
    };

    let Some(user) = find_enabled_owner(db, pin.id_user).await? else {
        return Ok(PinValidationResponse::rejected("User disabled"));
    };

    if reader_disabled(db).await? {
        return Ok(PinValidationResponse::rejected(
            "System disabled - emergency mode",
        ));
    }

    db.append_log(
        NewLog::new(
            PRIMARY_DEVICE_ID,
            AccessType::Pin,
            format!("Access granted via PIN - user: {}", user.name),
        )
        .with_user(user.id),
    )
    .await?;

    info!(user_id = user.id, pin_id = pin.id, "PIN access granted");

    registry.send_to_device(
        PRIMARY_DEVICE_ID,
        &OutboundMessage::PinAccess {
            valid: true,
            user_name: user.name.clone(),
            message: format!("Welcome {}", user.name),
        },
    );
    whatsapp.notify_access(&user.name, "PIN", None);

    Ok(PinValidationResponse {
        valid: true,
        pin: Some(pin),
        message: format!("Welcome {}", user.name),
        user: Some(user.into()),
    })
}

/// Re-authenticate the caller against their own active PIN. Exact string
/// comparison, no normalization.
pub async fn verify_pin(db: &Database, user_id: i64, pin_code: &str) -> Result<(), AppError> {
    let pin = db
        .find_active_pin_for_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No active PIN found for user")))?;

    if pin.pin_code != pin_code {
        return Err(AppError::BadRequest(anyhow::anyhow!("Incorrect PIN")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_uid_is_first_candidate() {
        // The grouped form equals the exact input here and is deduplicated.
        let candidates = uid_candidates("AA 11 BB 22");
        assert_eq!(candidates, vec!["AA 11 BB 22", "AA11BB22"]);
    }

    #[test]
    fn stripped_and_grouped_forms_generated_for_compact_input() {
        let candidates = uid_candidates("AA11BB22");
        assert_eq!(candidates, vec!["AA11BB22", "AA 11 BB 22"]);
    }

    #[test]
    fn lowercase_input_is_canonicalized() {
        let candidates = uid_candidates("aa11bb22");
        assert_eq!(candidates, vec!["AA11BB22", "AA 11 BB 22"]);
    }

    #[test]
    fn colon_and_hyphen_separators_are_stripped() {
        let candidates = uid_candidates("aa:11:bb:22");
        assert!(candidates.contains(&"AA11BB22".to_string()));
        assert!(candidates.contains(&"AA 11 BB 22".to_string()));

        let candidates = uid_candidates("AA-11-BB-22");
        assert!(candidates.contains(&"AA11BB22".to_string()));
    }

    #[test]
    fn long_uid_is_not_regrouped() {
        let candidates = uid_candidates("04A224E2C63E80");
        assert_eq!(candidates, vec!["04A224E2C63E80"]);
    }

    #[test]
    fn separator_free_short_uid_yields_single_candidate() {
        // Stripping changes nothing and 4 characters is too short to group.
        assert_eq!(uid_candidates("04A2"), vec!["04A2"]);
    }

    #[test]
    fn empty_input_yields_no_candidates() {
        assert!(uid_candidates("   ").is_empty());
    }
}
