//! Intent business actions
//!
//! Run only after every slot has passed format validation and the
//! cross-checks against the stored record.

use bank_dialog_core::{
    AccountField, AccountRecord, AccountStore, CasOutcome, DialogRequest, DialogResponse,
    StoreError,
};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::response;
use crate::DialogError;

const CARD_NUMBER_MIN: u64 = 100_000_000_000;
const CARD_NUMBER_MAX: u64 = 999_999_999_999;

pub const CARD_CONFLICT_MESSAGE: &str =
    "Sorry, your debit card could not be replaced right now. Please try again later.";

/// Format an amount as US currency: `$1,234.00`, `-$10.50`
pub fn format_currency(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded = rounded.abs();
    rounded.rescale(2);

    let text = rounded.to_string();
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

pub fn balance_message(record: &AccountRecord, bank_name: &str) -> String {
    format!(
        "The balance on your {} account is {} dollars. Thank you for banking with {}. \
         We appreciate your business. Please stay on the line if you would like to take \
         our customer experience survey.",
        record.account_type,
        format_currency(record.balance),
        bank_name
    )
}

pub fn check_balance(request: &DialogRequest, record: &AccountRecord, bank_name: &str) -> DialogResponse {
    response::fulfilled(request, balance_message(record, bank_name))
}

/// Produces replacement debit card numbers
pub trait CardNumberSource: Send + Sync {
    /// A new 12-digit card number different from `current`
    fn next_card_number(&self, current: &str) -> String;
}

/// Uniformly random 12-digit numbers
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCardNumbers;

impl CardNumberSource for RandomCardNumbers {
    fn next_card_number(&self, current: &str) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = rng.gen_range(CARD_NUMBER_MIN..=CARD_NUMBER_MAX).to_string();
            if candidate != current {
                return candidate;
            }
        }
    }
}

fn last_four(number: &str) -> &str {
    let start = number.len().saturating_sub(4);
    number.get(start..).unwrap_or(number)
}

pub fn replacement_message(record: &AccountRecord, new_card_number: &str) -> String {
    let mut message = String::new();
    if let Some(email) = &record.email {
        message.push_str(&format!(
            "An email has been sent to {} containing your new debit card information. ",
            email
        ));
    }
    message.push_str(&format!(
        "Your new debit card ending in {} has been mailed out to {}. \
         Please expect it to arrive within five to seven business days.",
        last_four(new_card_number),
        record.mailing_address()
    ));
    message
}

/// Rotate the debit card number with a compare-and-set against the number
/// read earlier in this turn.
pub async fn replace_card(
    store: &dyn AccountStore,
    cards: &dyn CardNumberSource,
    request: &DialogRequest,
    record: &AccountRecord,
) -> Result<DialogResponse, DialogError> {
    let new_card = cards.next_card_number(&record.card_number);

    let outcome = store
        .compare_and_set(
            &record.account_number,
            AccountField::CardNumber,
            &record.card_number,
            &new_card,
        )
        .await;

    match outcome {
        Ok(CasOutcome::Applied(stored)) => {
            if !stored.matches(&new_card) {
                return Err(DialogError::WriteVerification {
                    field: AccountField::CardNumber,
                    expected: last_four(&new_card).to_string(),
                    found: last_four(&stored.to_string()).to_string(),
                });
            }
        },
        // A retried write that already landed
        Ok(CasOutcome::Conflict(Some(current))) if current.matches(&new_card) => {},
        Ok(CasOutcome::Conflict(_)) => {
            tracing::warn!(
                intent = %request.intent,
                "Debit card changed concurrently, replacement abandoned"
            );
            return Ok(response::failed(request, CARD_CONFLICT_MESSAGE));
        },
        Err(StoreError::MissingRecord(account)) => {
            return Ok(response::failed(
                request,
                format!(
                    "Sorry! The {} {} does not exist in our database.",
                    AccountField::AccountNumber.display_name(),
                    account
                ),
            ));
        },
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        intent = %request.intent,
        card_last_four = %last_four(&new_card),
        "Debit card replaced"
    );

    Ok(response::fulfilled(
        request,
        replacement_message(record, &new_card),
    ))
}

pub fn followup_message(bank_name: &str) -> String {
    format!("Thank you for banking with {}.", bank_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bank_dialog_core::{AccountType, FieldValue, IntentName, InvocationStage};
    use bank_dialog_persistence::InMemoryAccountStore;

    fn record() -> AccountRecord {
        AccountRecord {
            account_number: "462604245119".into(),
            card_number: "100200300400".into(),
            pin: "1234".into(),
            account_type: AccountType::Checking,
            balance: Decimal::new(123400, 2),
            first_name: "Maria".into(),
            last_name: "Doe".into(),
            email: Some("maria.doe@gmail.com".into()),
            street_address: "90 Fickleberry Street Apt. 1A".into(),
            city: "New York".into(),
            state: "NY".into(),
            zipcode: "10043".into(),
            updated_at: chrono::Utc::now(),
        }
    }

    struct FixedCard(&'static str);

    impl CardNumberSource for FixedCard {
        fn next_card_number(&self, _: &str) -> String {
            self.0.to_string()
        }
    }

    /// Applies every write but reports a different stored value
    struct LyingStore;

    #[async_trait]
    impl AccountStore for LyingStore {
        async fn get_item(&self, _: &str) -> Result<Option<AccountRecord>, StoreError> {
            Ok(Some(record()))
        }

        async fn put_item(&self, _: &AccountRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn update_field(
            &self,
            _: &str,
            _: AccountField,
            _: &str,
        ) -> Result<FieldValue, StoreError> {
            Ok(FieldValue::Digits("000000000000".into()))
        }

        async fn compare_and_set(
            &self,
            _: &str,
            _: AccountField,
            _: &str,
            _: &str,
        ) -> Result<CasOutcome, StoreError> {
            Ok(CasOutcome::Applied(FieldValue::Digits("000000000000".into())))
        }

        fn backend_name(&self) -> &'static str {
            "lying"
        }
    }

    fn request() -> DialogRequest {
        DialogRequest::new(IntentName::ReplaceCard, InvocationStage::Fulfillment)
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::new(123400, 2)), "$1,234.00");
        assert_eq!(format_currency(Decimal::new(0, 0)), "$0.00");
        assert_eq!(format_currency(Decimal::new(999, 0)), "$999.00");
        assert_eq!(format_currency(Decimal::new(1234567891, 1)), "$123,456,789.10");
        assert_eq!(format_currency(Decimal::new(-1050, 2)), "-$10.50");
        assert_eq!(format_currency(Decimal::new(10005, 3)), "$10.01");
    }

    #[test]
    fn test_balance_message() {
        let message = balance_message(&record(), "Example Bank");
        assert!(message.starts_with("The balance on your checking account is $1,234.00 dollars. "));
        assert!(message.contains("Thank you for banking with Example Bank."));
    }

    #[test]
    fn test_random_card_numbers() {
        let source = RandomCardNumbers;
        for _ in 0..100 {
            let card = source.next_card_number("100200300400");
            assert_eq!(card.len(), 12);
            assert!(card.bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(card, "100200300400");
        }
    }

    #[test]
    fn test_replacement_message() {
        let mut rec = record();
        let message = replacement_message(&rec, "555566667777");
        assert!(message.starts_with("An email has been sent to maria.doe@gmail.com"));
        assert!(message.contains("ending in 7777"));
        assert!(message.contains("90 Fickleberry Street Apt. 1A, New York, NY 10043"));

        rec.email = None;
        assert!(replacement_message(&rec, "555566667777").starts_with("Your new debit card"));
    }

    #[tokio::test]
    async fn test_replace_card_persists_new_number() {
        let store = InMemoryAccountStore::with_records([record()]);
        let response = replace_card(&store, &FixedCard("555566667777"), &request(), &record())
            .await
            .unwrap();

        assert_eq!(response.outcome(), "Fulfilled");
        assert!(response.message().unwrap().content.contains("ending in 7777"));
        let stored = store.get_item("462604245119").await.unwrap().unwrap();
        assert_eq!(stored.card_number, "555566667777");
    }

    #[tokio::test]
    async fn test_replace_card_readback_mismatch_is_fatal() {
        let err = replace_card(&LyingStore, &FixedCard("555566667777"), &request(), &record())
            .await
            .unwrap_err();
        assert!(matches!(err, DialogError::WriteVerification { .. }));
    }

    #[tokio::test]
    async fn test_replace_card_lost_race() {
        let mut moved = record();
        moved.card_number = "999988887777".into();
        let store = InMemoryAccountStore::with_records([moved]);

        let response = replace_card(&store, &FixedCard("555566667777"), &request(), &record())
            .await
            .unwrap();
        assert_eq!(response.outcome(), "Failed");
        assert_eq!(response.message().unwrap().content, CARD_CONFLICT_MESSAGE);

        let stored = store.get_item("462604245119").await.unwrap().unwrap();
        assert_eq!(stored.card_number, "999988887777");
    }
}
