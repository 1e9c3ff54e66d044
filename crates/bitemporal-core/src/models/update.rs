use serde::{Deserialize, Serialize};

use super::{AttributeValue, Snapshot, Timestamp};
use crate::errors::TemporalError;

/// One field-level change, as recorded in the transactional log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AttributeUpdate {
    Set {
        attribute: String,
        value: AttributeValue,
    },
    Increment {
        attribute: String,
        delta: AttributeValue,
    },
    BusinessFrom {
        value: Timestamp,
    },
    BusinessTo {
        value: Timestamp,
    },
    ProcessingFrom {
        value: Timestamp,
    },
    ProcessingTo {
        value: Timestamp,
    },
}

impl AttributeUpdate {
    pub fn set(attribute: &str, value: impl Into<AttributeValue>) -> Self {
        Self::Set {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    pub fn increment(attribute: &str, delta: impl Into<AttributeValue>) -> Self {
        Self::Increment {
            attribute: attribute.to_string(),
            delta: delta.into(),
        }
    }

    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Self::Set { attribute, .. } | Self::Increment { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    pub fn is_increment(&self) -> bool {
        matches!(self, Self::Increment { .. })
    }

    pub fn apply(&self, data: &mut Snapshot) -> Result<(), TemporalError> {
        match self {
            Self::Set { attribute, value } => data.set_attribute(attribute, value.clone()),
            Self::Increment { attribute, delta } => {
                let current = data
                    .attribute(attribute)
                    .cloned()
                    .unwrap_or(AttributeValue::Null);
                let sum = current.checked_add(delta).ok_or_else(|| {
                    TemporalError::NonNumericIncrement {
                        attribute: attribute.clone(),
                    }
                })?;
                data.set_attribute(attribute, sum);
            }
            Self::BusinessFrom { value } => data.business_from = Some(*value),
            Self::BusinessTo { value } => data.business_to = Some(*value),
            Self::ProcessingFrom { value } => data.processing_from = Some(*value),
            Self::ProcessingTo { value } => data.processing_to = Some(*value),
        }
        Ok(())
    }
}
