//! Who is being verified, and in what context.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// The identity a verification session is opened for.
///
/// At least one of email or transaction id is always present; the enum
/// makes the "neither" case unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Email(String),
    Transaction(String),
    EmailAndTransaction {
        email: String,
        transaction_id: String,
    },
}

impl Identity {
    pub fn email(email: impl Into<String>) -> Result<Self, TypesError> {
        let email = email.into();
        validate_email(&email)?;
        Ok(Self::Email(email))
    }

    pub fn transaction(transaction_id: impl Into<String>) -> Result<Self, TypesError> {
        let transaction_id = transaction_id.into();
        validate_transaction_id(&transaction_id)?;
        Ok(Self::Transaction(transaction_id))
    }

    pub fn email_and_transaction(
        email: impl Into<String>,
        transaction_id: impl Into<String>,
    ) -> Result<Self, TypesError> {
        let email = email.into();
        let transaction_id = transaction_id.into();
        validate_email(&email)?;
        validate_transaction_id(&transaction_id)?;
        Ok(Self::EmailAndTransaction {
            email,
            transaction_id,
        })
    }

    /// Build from optional parts, as they arrive from a form or CLI.
    pub fn from_parts(
        email: Option<String>,
        transaction_id: Option<String>,
    ) -> Result<Self, TypesError> {
        match (email, transaction_id) {
            (Some(email), Some(tx)) => Self::email_and_transaction(email, tx),
            (Some(email), None) => Self::email(email),
            (None, Some(tx)) => Self::transaction(tx),
            (None, None) => Err(TypesError::MissingIdentity),
        }
    }

    /// Re-check the invariants; used when an `Identity` was built directly.
    pub fn validate(&self) -> Result<(), TypesError> {
        match self {
            Self::Email(email) => validate_email(email),
            Self::Transaction(tx) => validate_transaction_id(tx),
            Self::EmailAndTransaction {
                email,
                transaction_id,
            } => {
                validate_email(email)?;
                validate_transaction_id(transaction_id)
            }
        }
    }

    pub fn email_address(&self) -> Option<&str> {
        match self {
            Self::Email(email) | Self::EmailAndTransaction { email, .. } => Some(email),
            Self::Transaction(_) => None,
        }
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Self::Transaction(tx) => Some(tx),
            Self::EmailAndTransaction { transaction_id, .. } => Some(transaction_id),
            Self::Email(_) => None,
        }
    }

    /// Short label for logs; never contains the identity itself.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Transaction(_) => "transaction",
            Self::EmailAndTransaction { .. } => "email+transaction",
        }
    }
}

fn validate_email(email: &str) -> Result<(), TypesError> {
    let invalid = || TypesError::InvalidEmail(email.to_string());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}

fn validate_transaction_id(tx: &str) -> Result<(), TypesError> {
    if tx.trim().is_empty() {
        return Err(TypesError::EmptyTransactionId);
    }
    Ok(())
}

/// Risk tier assigned to the transaction by the checkout flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Context about the customer forwarded to the voice agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl CustomerData {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.order_total.is_none()
            && self.currency.is_none()
    }
}
